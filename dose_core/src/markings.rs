//! Printed syringe marking tables.
//!
//! Each supported syringe carries an ordered list of the numeric markings
//! printed on its barrel: ml for standard syringes, units for insulin
//! syringes (1 unit = 0.01 ml, U-100 convention). The engine uses these
//! lists for precision guidance only; the recommended marking itself is
//! always the exact calculated value.

use crate::numeric::parse_leading_number;
use crate::types::SyringeType;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached builtin table - built once and reused across all calculations
static BUILTIN_TABLE: Lazy<MarkingTable> = Lazy::new(build_builtin_table_internal);

/// Get a reference to the cached builtin marking table
pub fn get_builtin_table() -> &'static MarkingTable {
    &BUILTIN_TABLE
}

/// Builds the builtin marking table
///
/// **Note**: For production use, prefer `get_builtin_table()` which returns
/// a cached reference. This function is retained for testing and for
/// layering custom marking sets on top (see `Config::marking_table`).
pub fn build_builtin_table() -> MarkingTable {
    build_builtin_table_internal()
}

/// Marking lists keyed by syringe family and printed volume.
///
/// Never mutated after construction; lookups for unrecognized syringes
/// return an empty list, which callers treat as "no precision guidance
/// available".
#[derive(Clone, Debug, Default)]
pub struct MarkingTable {
    sets: HashMap<(SyringeType, String), Vec<f64>>,
}

impl MarkingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the mark list for one syringe, replacing any existing entry
    pub fn insert(&mut self, syringe_type: SyringeType, volume: &str, marks: Vec<f64>) {
        self.sets.insert((syringe_type, normalize_volume(volume)), marks);
    }

    /// Ordered marks printed on the given syringe's barrel.
    ///
    /// Returns an empty slice when the syringe is unrecognized.
    pub fn get_marks(&self, syringe_type: SyringeType, volume: &str) -> &[f64] {
        self.sets
            .get(&(syringe_type, normalize_volume(volume)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All entries sorted by family and capacity, for listing output
    pub fn entries(&self) -> Vec<(SyringeType, &str, &[f64])> {
        let mut rows: Vec<_> = self
            .sets
            .iter()
            .map(|((syringe_type, volume), marks)| (*syringe_type, volume.as_str(), marks.as_slice()))
            .collect();

        rows.sort_by(|a, b| {
            let capacity_a = parse_leading_number(a.1).unwrap_or(0.0);
            let capacity_b = parse_leading_number(b.1).unwrap_or(0.0);
            a.0.cmp(&b.0)
                .then(capacity_a.partial_cmp(&capacity_b).unwrap_or(std::cmp::Ordering::Equal))
        });

        rows
    }

    /// Validate the table for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for ((syringe_type, volume), marks) in &self.sets {
            let label = format!("{} {}", syringe_type.label(), volume);

            let capacity = match parse_leading_number(volume) {
                Some(capacity) if capacity > 0.0 => capacity,
                _ => {
                    errors.push(format!("Syringe '{}' has a non-numeric printed volume", label));
                    continue;
                }
            };

            if marks.is_empty() {
                errors.push(format!("Syringe '{}' has no markings", label));
                continue;
            }

            for pair in marks.windows(2) {
                if pair[1] <= pair[0] {
                    errors.push(format!(
                        "Syringe '{}': markings not strictly increasing ({} then {})",
                        label, pair[0], pair[1]
                    ));
                }
            }

            // Marks cannot extend past the printed capacity. Insulin barrels
            // mark in units, so compare on that basis.
            let capacity_in_marks = match syringe_type {
                SyringeType::Insulin => capacity * 100.0,
                SyringeType::Standard => capacity,
            };
            if let Some(last) = marks.last() {
                if *last > capacity_in_marks + 1e-6 {
                    errors.push(format!(
                        "Syringe '{}': last marking {} exceeds printed capacity",
                        label, last
                    ));
                }
            }
        }

        errors
    }
}

/// Printed volumes are free text; compare case- and whitespace-insensitively
fn normalize_volume(volume: &str) -> String {
    volume.trim().to_lowercase()
}

/// Evenly stepped marks: `step, 2*step, ..., count*step`
fn stepped_marks(step: f64, count: usize) -> Vec<f64> {
    (1..=count).map(|i| i as f64 * step).collect()
}

/// Internal function that actually builds the table
fn build_builtin_table_internal() -> MarkingTable {
    let mut table = MarkingTable::new();

    // ========================================================================
    // Standard syringes (marks in ml)
    // ========================================================================

    table.insert(SyringeType::Standard, "1 ml", stepped_marks(0.1, 10));
    table.insert(SyringeType::Standard, "3 ml", stepped_marks(0.1, 30));
    table.insert(SyringeType::Standard, "5 ml", stepped_marks(0.2, 25));

    // ========================================================================
    // Insulin syringes (marks in units, U-100)
    // ========================================================================

    table.insert(SyringeType::Insulin, "0.3 ml", stepped_marks(1.0, 30));
    table.insert(SyringeType::Insulin, "0.5 ml", stepped_marks(1.0, 50));
    table.insert(SyringeType::Insulin, "1 ml", stepped_marks(2.0, 50));

    table
}
