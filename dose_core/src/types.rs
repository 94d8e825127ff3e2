//! Core domain types for the Dosette dose calculation engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Dose and concentration units
//! - Syringe descriptions
//! - Engine input and output records

use crate::numeric::parse_leading_number;
use serde::{Deserialize, Serialize};

// ============================================================================
// Unit Types
// ============================================================================

/// Unit of the dose value the user declared
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DoseUnit {
    Mg,
    Mcg,
    Ml,
    Units,
}

impl DoseUnit {
    /// Parse a user-entered unit string (`"mg"`, `"mcg"`, `"ml"`, `"units"`)
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "mg" => Some(DoseUnit::Mg),
            "mcg" | "ug" | "µg" => Some(DoseUnit::Mcg),
            "ml" => Some(DoseUnit::Ml),
            "units" | "unit" | "iu" => Some(DoseUnit::Units),
            _ => None,
        }
    }

    /// Label for display
    pub fn label(&self) -> &'static str {
        match self {
            DoseUnit::Mg => "mg",
            DoseUnit::Mcg => "mcg",
            DoseUnit::Ml => "ml",
            DoseUnit::Units => "units",
        }
    }
}

/// Unit the concentration was declared in.
///
/// The engine works on a mg/ml convention; callers normalize the numeric
/// value before invocation. The unit is carried for display purposes only.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConcentrationUnit {
    #[serde(rename = "mg/ml")]
    MgPerMl,
    #[serde(rename = "mcg/ml")]
    McgPerMl,
    #[serde(rename = "units/ml")]
    UnitsPerMl,
}

impl ConcentrationUnit {
    /// Parse a user-entered concentration unit string
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "mg/ml" => Some(ConcentrationUnit::MgPerMl),
            "mcg/ml" => Some(ConcentrationUnit::McgPerMl),
            "units/ml" | "u/ml" => Some(ConcentrationUnit::UnitsPerMl),
            _ => None,
        }
    }

    /// Label for display
    pub fn label(&self) -> &'static str {
        match self {
            ConcentrationUnit::MgPerMl => "mg/ml",
            ConcentrationUnit::McgPerMl => "mcg/ml",
            ConcentrationUnit::UnitsPerMl => "units/ml",
        }
    }
}

impl Default for ConcentrationUnit {
    fn default() -> Self {
        ConcentrationUnit::MgPerMl
    }
}

// ============================================================================
// Syringe Types
// ============================================================================

/// Family of syringe the user intends to draw with.
///
/// Standard syringes mark in ml; insulin syringes mark in units
/// (1 unit = 0.01 ml, U-100 convention).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SyringeType {
    Insulin,
    Standard,
}

impl SyringeType {
    /// Parse a user-entered syringe type string
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "insulin" => Some(SyringeType::Insulin),
            "standard" => Some(SyringeType::Standard),
            _ => None,
        }
    }

    /// Label for display
    pub fn label(&self) -> &'static str {
        match self {
            SyringeType::Insulin => "Insulin",
            SyringeType::Standard => "Standard",
        }
    }
}

/// A specific syringe: family plus the volume printed on the packaging
/// (e.g. `"1 ml"`, `"0.3 ml"`)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Syringe {
    pub syringe_type: SyringeType,
    pub volume: String,
}

impl Syringe {
    pub fn new(syringe_type: SyringeType, volume: impl Into<String>) -> Self {
        Self {
            syringe_type,
            volume: volume.into(),
        }
    }

    /// Barrel capacity in ml, parsed from the printed volume string.
    ///
    /// Returns `None` when the printed volume is not numeric; callers treat
    /// that as "capacity unknown" and skip the capacity check.
    pub fn capacity_ml(&self) -> Option<f64> {
        parse_leading_number(&self.volume).filter(|v| *v > 0.0)
    }
}

// ============================================================================
// Engine Input and Output
// ============================================================================

/// Input to one dose calculation, as collected by a form or scan flow.
///
/// Exactly one concentration source must resolve: either `concentration`
/// directly, or `total_amount` together with `solution_volume` from a
/// reconstitution step. `solution_volume` stays a string because it arrives
/// from a free-text field.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DoseInput {
    pub dose_value: f64,
    pub unit: DoseUnit,
    pub concentration: Option<f64>,
    #[serde(default)]
    pub concentration_unit: ConcentrationUnit,
    pub total_amount: Option<f64>,
    pub solution_volume: Option<String>,
    pub syringe: Syringe,
}

/// Output of one dose calculation.
///
/// Constructed fresh on every call and never mutated after return.
/// `calculation_error` carries both blocking safety messages and
/// informational precision guidance; it is user-facing text, not a
/// program error.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CalculationResult {
    pub calculated_volume: Option<f64>,
    pub calculated_concentration: Option<f64>,
    pub recommended_marking: Option<String>,
    pub calculation_error: Option<String>,
}

impl CalculationResult {
    /// True when a blocking safety check suppressed the marking
    /// recommendation. Informational messages (capacity, precision
    /// guidance) leave the marking in place.
    pub fn has_blocking_error(&self) -> bool {
        self.calculation_error.is_some() && self.recommended_marking.is_none()
    }
}
