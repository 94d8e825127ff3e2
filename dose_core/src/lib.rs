#![forbid(unsafe_code)]

//! Core domain model and calculation engine for the Dosette medication
//! dosing assistant.
//!
//! This crate provides:
//! - Domain types (doses, units, syringes, calculation results)
//! - Syringe marking tables
//! - The dose calculation and safety-validation engine
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod numeric;
pub mod markings;
pub mod config;
pub mod logging;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use markings::{build_builtin_table, get_builtin_table, MarkingTable};
pub use config::{Config, LimitsConfig};
pub use engine::calculate;
