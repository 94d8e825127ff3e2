//! Dose calculation and safety-validation engine.
//!
//! This module implements the calculation pipeline:
//! - Resolve a concentration (direct, or total amount / solution volume)
//! - Derive the draw volume in ml
//! - Run the ordered safety checks
//! - Recommend a syringe marking with precision guidance
//!
//! The safety checks run as an explicit ordered list so precedence is
//! visible in one place: volume threshold, then insulin practical limit
//! (both blocking), then syringe capacity and total-amount sufficiency
//! (informational). A blocking check suppresses the marking and discards
//! any informational notes.

use crate::config::LimitsConfig;
use crate::markings::MarkingTable;
use crate::numeric::{approx_eq, format_minimal, parse_leading_number};
use crate::types::{CalculationResult, DoseInput, DoseUnit, SyringeType};

/// Outcome of one safety check
enum CheckOutcome {
    /// Nothing to report
    Pass,
    /// Informational message; the marking recommendation still proceeds
    Note(String),
    /// Safety problem; suppress the marking and stop the pipeline
    Block(String),
}

/// Everything the safety checks need to see
struct CheckContext<'a> {
    input: &'a DoseInput,
    limits: &'a LimitsConfig,
    volume_ml: f64,
    dose_mg: Option<f64>,
}

/// The pipeline, in precedence order
const SAFETY_CHECKS: &[(&str, fn(&CheckContext) -> CheckOutcome)] = &[
    ("volume_threshold", check_volume_threshold),
    ("insulin_practical_limit", check_insulin_practical_limit),
    ("syringe_capacity", check_syringe_capacity),
    ("total_amount", check_total_amount),
];

/// Calculate the draw volume and recommended syringe marking for a dose.
///
/// Deterministic and total: malformed but well-typed input never panics,
/// it surfaces as a message in `calculation_error`. Blocking safety
/// messages leave `recommended_marking` empty; informational messages
/// (capacity, precision guidance) do not.
pub fn calculate(
    table: &MarkingTable,
    limits: &LimitsConfig,
    input: &DoseInput,
) -> CalculationResult {
    if !(input.dose_value > 0.0) {
        return failure(None, "Dose must be greater than zero.".to_string());
    }

    // Step 1: resolve the concentration
    let concentration = match resolve_concentration(input) {
        Ok(concentration) => concentration,
        Err(message) => return failure(None, message),
    };

    if let Some(concentration) = concentration {
        if concentration < limits.min_concentration_mg_per_ml {
            tracing::info!(
                "Concentration {} mg/ml below minimum {}, rejecting",
                concentration,
                limits.min_concentration_mg_per_ml
            );
            return failure(
                Some(concentration),
                format!(
                    "Calculated concentration ({:.4} mg/ml) is extremely low. \
                     Please verify the medication amount and solution volume.",
                    concentration
                ),
            );
        }
    }

    // Step 2: derive the draw volume
    let dose_mg = dose_in_mg(input);
    let volume_ml = match input.unit {
        DoseUnit::Ml => input.dose_value,
        // resolve_concentration guarantees Some for non-ml units
        _ => match (dose_mg, concentration) {
            (Some(dose_mg), Some(concentration)) => dose_mg / concentration,
            _ => return failure(concentration, "Concentration could not be determined.".to_string()),
        },
    };

    tracing::debug!(
        "Derived draw volume {} ml (dose {} {}, concentration {:?})",
        volume_ml,
        input.dose_value,
        input.unit.label(),
        concentration
    );

    // Steps 3-6: ordered safety checks
    let ctx = CheckContext {
        input,
        limits,
        volume_ml,
        dose_mg,
    };

    let mut notes: Vec<String> = Vec::new();
    for (name, check) in SAFETY_CHECKS {
        match check(&ctx) {
            CheckOutcome::Pass => {}
            CheckOutcome::Note(message) => {
                tracing::debug!("Check '{}' noted: {}", name, message);
                notes.push(message);
            }
            CheckOutcome::Block(message) => {
                tracing::info!("Check '{}' blocked the calculation: {}", name, message);
                return CalculationResult {
                    calculated_volume: Some(volume_ml),
                    calculated_concentration: concentration,
                    recommended_marking: None,
                    calculation_error: Some(message),
                };
            }
        }
    }

    // Step 7: marking recommendation and precision guidance
    let (marking, guidance) = recommend_marking(table, input, volume_ml);
    if let Some(guidance) = guidance {
        notes.push(guidance);
    }

    let calculation_error = if notes.is_empty() {
        None
    } else {
        Some(notes.join(" "))
    };

    CalculationResult {
        calculated_volume: Some(volume_ml),
        calculated_concentration: concentration,
        recommended_marking: Some(marking),
        calculation_error,
    }
}

/// A calculation that never produced a usable volume
fn failure(concentration: Option<f64>, message: String) -> CalculationResult {
    CalculationResult {
        calculated_volume: None,
        calculated_concentration: concentration,
        recommended_marking: None,
        calculation_error: Some(message),
    }
}

/// Resolve the concentration in mg/ml, or explain why it cannot be.
///
/// Returns `Ok(None)` for ml doses, where concentration is irrelevant.
fn resolve_concentration(input: &DoseInput) -> Result<Option<f64>, String> {
    if input.unit == DoseUnit::Ml {
        return Ok(None);
    }

    if let Some(concentration) = input.concentration {
        tracing::debug!("Using supplied concentration {} mg/ml", concentration);
        return Ok(Some(concentration));
    }

    let solution_ml = input
        .solution_volume
        .as_deref()
        .and_then(parse_leading_number);

    match (input.total_amount, solution_ml) {
        (Some(total), Some(solution_ml)) if solution_ml > 0.0 => {
            let concentration = total / solution_ml;
            tracing::debug!(
                "Derived concentration {} mg/ml from {} mg in {} ml",
                concentration,
                total,
                solution_ml
            );
            Ok(Some(concentration))
        }
        _ => Err(
            "Concentration could not be determined. Provide a concentration, \
             or the total medication amount and solution volume."
                .to_string(),
        ),
    }
}

/// Dose expressed on the concentration's mass basis.
///
/// `units` doses already share the concentration's basis, so they pass
/// through unchanged; ml doses have no mass interpretation here.
fn dose_in_mg(input: &DoseInput) -> Option<f64> {
    match input.unit {
        DoseUnit::Mg | DoseUnit::Units => Some(input.dose_value),
        DoseUnit::Mcg => Some(input.dose_value / 1000.0),
        DoseUnit::Ml => None,
    }
}

/// Highest priority: the volume must land in the safe window, inclusive.
/// Fires before capacity or insulin checks regardless of syringe choice.
fn check_volume_threshold(ctx: &CheckContext) -> CheckOutcome {
    if ctx.volume_ml < ctx.limits.volume_min_ml || ctx.volume_ml > ctx.limits.volume_max_ml {
        CheckOutcome::Block(
            "VOLUME_THRESHOLD_ERROR:Calculated volume is outside safe thresholds.".to_string(),
        )
    } else {
        CheckOutcome::Pass
    }
}

/// Insulin syringes have a hard practical draw ceiling independent of the
/// printed barrel capacity.
fn check_insulin_practical_limit(ctx: &CheckContext) -> CheckOutcome {
    if ctx.input.syringe.syringe_type == SyringeType::Insulin
        && ctx.volume_ml > ctx.limits.insulin_max_draw_ml
    {
        CheckOutcome::Block(format!(
            "Calculated volume ({:.2} ml) is too large for practical use with an \
             insulin syringe. Use a standard syringe instead.",
            ctx.volume_ml
        ))
    } else {
        CheckOutcome::Pass
    }
}

/// Printed capacity overflow is informational: the volume is still within
/// the safe window, the user just needs a bigger syringe or a split draw.
fn check_syringe_capacity(ctx: &CheckContext) -> CheckOutcome {
    match ctx.input.syringe.capacity_ml() {
        Some(capacity) if ctx.volume_ml > capacity => CheckOutcome::Note(format!(
            "Required volume ({:.2} ml) exceeds syringe capacity ({} ml).",
            ctx.volume_ml,
            format_minimal(capacity)
        )),
        _ => CheckOutcome::Pass,
    }
}

/// The vial must actually contain the dose being drawn
fn check_total_amount(ctx: &CheckContext) -> CheckOutcome {
    match (ctx.input.total_amount, ctx.dose_mg) {
        (Some(total), Some(dose_mg)) if dose_mg > total + 1e-9 => CheckOutcome::Note(format!(
            "The dose requires {} mg but only {} mg is available in the vial.",
            format_minimal(dose_mg),
            format_minimal(total)
        )),
        _ => CheckOutcome::Pass,
    }
}

/// Recommend the marking to draw to, with precision guidance when the
/// exact value does not sit on a printed mark.
///
/// The recommendation is always the exact converted value, never snapped
/// to the nearest mark: showing the true value lets the user interpolate
/// between marks instead of silently receiving a less accurate dose.
fn recommend_marking(
    table: &MarkingTable,
    input: &DoseInput,
    volume_ml: f64,
) -> (String, Option<String>) {
    let (value, unit_word) = match input.syringe.syringe_type {
        // U-100: 1 unit = 0.01 ml
        SyringeType::Insulin => (volume_ml * 100.0, "units"),
        SyringeType::Standard => (volume_ml, "ml"),
    };

    let display_str = format_minimal(value);
    let marks = table.get_marks(input.syringe.syringe_type, &input.syringe.volume);

    if marks.is_empty() {
        tracing::debug!(
            "No marking data for {} {} syringe, skipping precision guidance",
            input.syringe.syringe_type.label(),
            input.syringe.volume
        );
        return (display_str, None);
    }

    if marks.iter().any(|mark| approx_eq(*mark, value)) {
        tracing::debug!("Value {} sits exactly on a printed mark", display_str);
        return (display_str, None);
    }

    if value < marks[0] {
        let guidance = format!(
            "Draw to {} {}. This is below the first marking ({} {}) on the syringe.",
            display_str,
            unit_word,
            format_minimal(marks[0]),
            unit_word
        );
        return (display_str, Some(guidance));
    }

    for pair in marks.windows(2) {
        if value > pair[0] && value < pair[1] {
            let guidance = format!(
                "Draw to {} {}. The exact dose lies between the {} {} and {} {} marks.",
                display_str,
                unit_word,
                format_minimal(pair[0]),
                unit_word,
                format_minimal(pair[1]),
                unit_word
            );
            return (display_str, Some(guidance));
        }
    }

    // Beyond the last mark; the capacity check already covers this
    (display_str, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markings::build_builtin_table;
    use crate::types::{ConcentrationUnit, Syringe};

    fn standard_syringe(volume: &str) -> Syringe {
        Syringe::new(SyringeType::Standard, volume)
    }

    fn insulin_syringe(volume: &str) -> Syringe {
        Syringe::new(SyringeType::Insulin, volume)
    }

    fn input_with_concentration(dose: f64, unit: DoseUnit, concentration: f64) -> DoseInput {
        DoseInput {
            dose_value: dose,
            unit,
            concentration: Some(concentration),
            concentration_unit: ConcentrationUnit::MgPerMl,
            total_amount: None,
            solution_volume: None,
            syringe: standard_syringe("1 ml"),
        }
    }

    fn calc(input: &DoseInput) -> CalculationResult {
        let table = build_builtin_table();
        calculate(&table, &LimitsConfig::default(), input)
    }

    #[test]
    fn test_volume_below_threshold_blocks() {
        // 0.1 mg at 100 mg/ml -> 0.001 ml
        let input = input_with_concentration(0.1, DoseUnit::Mg, 100.0);
        let result = calc(&input);

        assert_eq!(result.calculated_volume, Some(0.001));
        assert_eq!(
            result.calculation_error.as_deref(),
            Some("VOLUME_THRESHOLD_ERROR:Calculated volume is outside safe thresholds.")
        );
        assert_eq!(result.recommended_marking, None);
    }

    #[test]
    fn test_volume_above_threshold_blocks_even_with_room() {
        // 30 mg at 10 mg/ml -> 3 ml; a 5 ml syringe has room, but the
        // safety window still wins
        let mut input = input_with_concentration(30.0, DoseUnit::Mg, 10.0);
        input.syringe = standard_syringe("5 ml");
        let result = calc(&input);

        assert_eq!(result.calculated_volume, Some(3.0));
        assert!(result
            .calculation_error
            .as_deref()
            .unwrap()
            .starts_with("VOLUME_THRESHOLD_ERROR:"));
        assert_eq!(result.recommended_marking, None);
    }

    #[test]
    fn test_threshold_dominates_capacity_message() {
        let mut input = input_with_concentration(30.0, DoseUnit::Mg, 10.0);
        input.syringe = standard_syringe("1 ml");
        let result = calc(&input);

        let error = result.calculation_error.unwrap();
        assert!(error.starts_with("VOLUME_THRESHOLD_ERROR:"));
        assert!(!error.contains("exceeds syringe capacity"));
    }

    #[test]
    fn test_safe_range_boundaries_are_inclusive() {
        // Exactly 0.005 ml
        let input = input_with_concentration(0.5, DoseUnit::Mg, 100.0);
        let result = calc(&input);
        assert!(!result
            .calculation_error
            .as_deref()
            .unwrap_or("")
            .contains("VOLUME_THRESHOLD_ERROR"));
        assert!(result.recommended_marking.is_some());

        // Exactly 2.0 ml
        let mut input = input_with_concentration(20.0, DoseUnit::Mg, 10.0);
        input.syringe = standard_syringe("3 ml");
        let result = calc(&input);
        assert_eq!(result.calculation_error, None);
        assert_eq!(result.recommended_marking.as_deref(), Some("2"));
    }

    #[test]
    fn test_capacity_exceeded_is_informational() {
        // 1.5 mg at 1 mg/ml -> 1.5 ml, safe but over a 1 ml barrel
        let mut input = input_with_concentration(1.5, DoseUnit::Mg, 1.0);
        input.syringe = standard_syringe("1 ml");
        let result = calc(&input);

        assert_eq!(
            result.calculation_error.as_deref(),
            Some("Required volume (1.50 ml) exceeds syringe capacity (1 ml).")
        );
        assert_eq!(result.recommended_marking.as_deref(), Some("1.5"));
    }

    #[test]
    fn test_between_marks_guidance() {
        // 10 mg at 40 mg/ml -> 0.25 ml, between the 0.2 and 0.3 marks
        let input = input_with_concentration(10.0, DoseUnit::Mg, 40.0);
        let result = calc(&input);

        assert_eq!(result.recommended_marking.as_deref(), Some("0.25"));
        let error = result.calculation_error.unwrap();
        assert!(error.contains("Draw to 0.25 ml"));
        assert!(error.contains("between the 0.2 ml and 0.3 ml marks"));
    }

    #[test]
    fn test_exact_mark_match_has_no_error() {
        // 8 mg at 40 mg/ml -> 0.2 ml, exactly on a mark
        let input = input_with_concentration(8.0, DoseUnit::Mg, 40.0);
        let result = calc(&input);

        assert_eq!(result.recommended_marking.as_deref(), Some("0.2"));
        assert_eq!(result.calculation_error, None);
    }

    #[test]
    fn test_below_first_mark_guidance() {
        // 0.5 mg at 100 mg/ml -> 0.005 ml, below the 0.1 ml first mark
        let input = input_with_concentration(0.5, DoseUnit::Mg, 100.0);
        let result = calc(&input);

        assert_eq!(result.recommended_marking.as_deref(), Some("0.005"));
        let error = result.calculation_error.unwrap();
        assert!(error.contains("Draw to 0.005 ml"));
        assert!(error.contains("below the first marking"));
    }

    #[test]
    fn test_derived_concentration_insulin_marking() {
        // 500 mcg from 5 mg dissolved in 3 ml -> ~1.667 mg/ml -> 0.3 ml
        // -> 30 units on a U-100 barrel
        let input = DoseInput {
            dose_value: 500.0,
            unit: DoseUnit::Mcg,
            concentration: None,
            concentration_unit: ConcentrationUnit::MgPerMl,
            total_amount: Some(5.0),
            solution_volume: Some("3".into()),
            syringe: insulin_syringe("1 ml"),
        };
        let result = calc(&input);

        assert!(result.calculated_concentration.unwrap() > 1.66);
        assert!(result.calculated_concentration.unwrap() < 1.67);
        assert_eq!(result.recommended_marking.as_deref(), Some("30"));
        assert_eq!(result.calculation_error, None);
    }

    #[test]
    fn test_huge_volume_from_low_concentration_blocks() {
        // 500 mcg at 0.01 mg/ml -> 50 ml
        let input = input_with_concentration(500.0, DoseUnit::Mcg, 0.01);
        let result = calc(&input);

        assert_eq!(result.calculated_volume, Some(50.0));
        assert!(result
            .calculation_error
            .as_deref()
            .unwrap()
            .starts_with("VOLUME_THRESHOLD_ERROR:"));
        assert_eq!(result.recommended_marking, None);
    }

    #[test]
    fn test_extremely_low_derived_concentration_rejected() {
        // 0.01 mg dissolved in 3 ml -> ~0.0033 mg/ml
        let input = DoseInput {
            dose_value: 500.0,
            unit: DoseUnit::Mcg,
            concentration: None,
            concentration_unit: ConcentrationUnit::MgPerMl,
            total_amount: Some(0.01),
            solution_volume: Some("3".into()),
            syringe: standard_syringe("1 ml"),
        };
        let result = calc(&input);

        let error = result.calculation_error.unwrap();
        assert!(error.contains("Calculated concentration"));
        assert!(error.contains("extremely low"));
        assert!(error.contains("Please verify"));
        assert_eq!(result.calculated_volume, None);
        assert_eq!(result.recommended_marking, None);
    }

    #[test]
    fn test_insulin_practical_limit_blocks() {
        // 500 mcg at 0.33 mg/ml -> ~1.5 ml: inside the safe window but
        // past what an insulin syringe can practically draw
        let mut input = input_with_concentration(500.0, DoseUnit::Mcg, 0.33);
        input.syringe = insulin_syringe("1 ml");
        let result = calc(&input);

        let error = result.calculation_error.unwrap();
        assert!(error.contains("too large for practical use with an insulin syringe"));
        assert_eq!(result.recommended_marking, None);
    }

    #[test]
    fn test_insufficient_total_amount_is_informational() {
        // 4 mg dose from a vial holding only 2 mg in 1 ml: the 2 ml draw
        // is safe, so the shortfall surfaces without blocking the marking
        let input = DoseInput {
            dose_value: 4.0,
            unit: DoseUnit::Mg,
            concentration: None,
            concentration_unit: ConcentrationUnit::MgPerMl,
            total_amount: Some(2.0),
            solution_volume: Some("1".into()),
            syringe: standard_syringe("3 ml"),
        };
        let result = calc(&input);

        let error = result.calculation_error.unwrap();
        assert!(error.contains("only"));
        assert!(error.contains("available"));
        assert_eq!(result.recommended_marking.as_deref(), Some("2"));
    }

    #[test]
    fn test_threshold_dominates_insufficient_total_amount() {
        // 30 mg from a 5 mg vial in 1 ml -> 6 ml, out of range; the
        // threshold message wins outright
        let input = DoseInput {
            dose_value: 30.0,
            unit: DoseUnit::Mg,
            concentration: None,
            concentration_unit: ConcentrationUnit::MgPerMl,
            total_amount: Some(5.0),
            solution_volume: Some("1".into()),
            syringe: standard_syringe("5 ml"),
        };
        let result = calc(&input);

        let error = result.calculation_error.unwrap();
        assert!(error.starts_with("VOLUME_THRESHOLD_ERROR:"));
        assert!(!error.contains("available"));
    }

    #[test]
    fn test_ml_dose_passes_through() {
        let input = DoseInput {
            dose_value: 0.5,
            unit: DoseUnit::Ml,
            concentration: None,
            concentration_unit: ConcentrationUnit::MgPerMl,
            total_amount: None,
            solution_volume: None,
            syringe: standard_syringe("1 ml"),
        };
        let result = calc(&input);

        assert_eq!(result.calculated_volume, Some(0.5));
        assert_eq!(result.calculated_concentration, None);
        assert_eq!(result.recommended_marking.as_deref(), Some("0.5"));
        assert_eq!(result.calculation_error, None);
    }

    #[test]
    fn test_units_dose_uses_concentration_basis() {
        // 10 units at 100 units/ml (normalized by the caller) -> 0.1 ml
        // -> 10 units on a U-100 barrel
        let mut input = input_with_concentration(10.0, DoseUnit::Units, 100.0);
        input.concentration_unit = ConcentrationUnit::UnitsPerMl;
        input.syringe = insulin_syringe("1 ml");
        let result = calc(&input);

        assert_eq!(result.recommended_marking.as_deref(), Some("10"));
        assert_eq!(result.calculation_error, None);
    }

    #[test]
    fn test_unknown_syringe_skips_guidance() {
        // No marking data for a 2 ml standard syringe: the exact value is
        // still recommended, just without between-marks guidance
        let mut input = input_with_concentration(1.8, DoseUnit::Mg, 1.0);
        input.syringe = standard_syringe("2 ml");
        let result = calc(&input);

        assert_eq!(result.recommended_marking.as_deref(), Some("1.8"));
        assert_eq!(result.calculation_error, None);
    }

    #[test]
    fn test_missing_concentration_is_precondition_failure() {
        let input = DoseInput {
            dose_value: 10.0,
            unit: DoseUnit::Mg,
            concentration: None,
            concentration_unit: ConcentrationUnit::MgPerMl,
            total_amount: None,
            solution_volume: None,
            syringe: standard_syringe("1 ml"),
        };
        let result = calc(&input);

        assert!(result
            .calculation_error
            .unwrap()
            .contains("Concentration could not be determined"));
        assert_eq!(result.calculated_volume, None);
        assert_eq!(result.recommended_marking, None);
    }

    #[test]
    fn test_non_numeric_solution_volume_is_precondition_failure() {
        let input = DoseInput {
            dose_value: 10.0,
            unit: DoseUnit::Mg,
            concentration: None,
            concentration_unit: ConcentrationUnit::MgPerMl,
            total_amount: Some(5.0),
            solution_volume: Some("a splash".into()),
            syringe: standard_syringe("1 ml"),
        };
        let result = calc(&input);

        assert!(result
            .calculation_error
            .unwrap()
            .contains("Concentration could not be determined"));
    }

    #[test]
    fn test_zero_dose_rejected() {
        let input = input_with_concentration(0.0, DoseUnit::Mg, 10.0);
        let result = calc(&input);

        assert_eq!(
            result.calculation_error.as_deref(),
            Some("Dose must be greater than zero.")
        );
        assert_eq!(result.calculated_volume, None);
    }

    #[test]
    fn test_calculate_is_idempotent() {
        let input = input_with_concentration(10.0, DoseUnit::Mg, 40.0);
        let table = crate::markings::get_builtin_table();
        let limits = LimitsConfig::default();

        let first = calculate(table, &limits, &input);
        let second = calculate(table, &limits, &input);

        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_limits_are_respected() {
        let limits = LimitsConfig {
            volume_max_ml: 1.0,
            ..LimitsConfig::default()
        };
        let table = build_builtin_table();

        // 1.5 ml is fine under default limits but out of range here
        let input = input_with_concentration(1.5, DoseUnit::Mg, 1.0);
        let result = calculate(&table, &limits, &input);

        assert!(result
            .calculation_error
            .as_deref()
            .unwrap()
            .starts_with("VOLUME_THRESHOLD_ERROR:"));
    }
}
