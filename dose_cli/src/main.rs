use clap::{Parser, Subcommand};
use dose_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dosette")]
#[command(about = "Medication dose calculation assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a draw volume and syringe marking
    Calc {
        /// Dose amount as prescribed
        #[arg(long)]
        dose: f64,

        /// Dose unit (mg, mcg, ml, units)
        #[arg(long, default_value = "mg")]
        unit: String,

        /// Concentration, normalized to mg/ml
        #[arg(long, conflicts_with_all = ["total_amount", "solution_volume"])]
        concentration: Option<f64>,

        /// Unit the concentration was declared in (mg/ml, mcg/ml, units/ml)
        #[arg(long, default_value = "mg/ml")]
        concentration_unit: String,

        /// Total medication amount dissolved in the vial (mg)
        #[arg(long, requires = "solution_volume")]
        total_amount: Option<f64>,

        /// Solution volume in the vial (ml), as entered on the label
        #[arg(long, requires = "total_amount")]
        solution_volume: Option<String>,

        /// Syringe family (insulin, standard)
        #[arg(long, default_value = "standard")]
        syringe_type: String,

        /// Printed syringe volume (e.g. "1 ml", "0.3 ml")
        #[arg(long, default_value = "1 ml")]
        syringe_volume: String,

        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported syringes and their printed markings
    Syringes,
}

fn main() -> Result<()> {
    // Initialize logging
    dose_core::logging::init();

    let cli = Cli::parse();

    // Load configuration and build the marking table
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let table = config.marking_table();
    let errors = table.validate();
    if !errors.is_empty() {
        eprintln!("Marking table validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::MarkingValidation("Invalid marking table".into()));
    }

    tracing::debug!("Marking table ready with {} syringes", table.entries().len());

    match cli.command {
        Some(Commands::Calc {
            dose,
            unit,
            concentration,
            concentration_unit,
            total_amount,
            solution_volume,
            syringe_type,
            syringe_volume,
            json,
        }) => cmd_calc(
            &table,
            &config,
            CalcArgs {
                dose,
                unit,
                concentration,
                concentration_unit,
                total_amount,
                solution_volume,
                syringe_type,
                syringe_volume,
                json,
            },
        ),
        Some(Commands::Syringes) => cmd_syringes(&table),
        None => {
            // No default calculation makes sense without a dose
            eprintln!("No command given. Try 'dosette calc --help'.");
            Ok(())
        }
    }
}

struct CalcArgs {
    dose: f64,
    unit: String,
    concentration: Option<f64>,
    concentration_unit: String,
    total_amount: Option<f64>,
    solution_volume: Option<String>,
    syringe_type: String,
    syringe_volume: String,
    json: bool,
}

fn cmd_calc(table: &MarkingTable, config: &Config, args: CalcArgs) -> Result<()> {
    let unit = DoseUnit::parse(&args.unit)
        .ok_or_else(|| Error::Input(format!("Unknown dose unit: {}", args.unit)))?;

    let concentration_unit = ConcentrationUnit::parse(&args.concentration_unit)
        .ok_or_else(|| {
            Error::Input(format!(
                "Unknown concentration unit: {}",
                args.concentration_unit
            ))
        })?;

    let syringe_type = SyringeType::parse(&args.syringe_type)
        .ok_or_else(|| Error::Input(format!("Unknown syringe type: {}", args.syringe_type)))?;

    let input = DoseInput {
        dose_value: args.dose,
        unit,
        concentration: args.concentration,
        concentration_unit,
        total_amount: args.total_amount,
        solution_volume: args.solution_volume,
        syringe: Syringe::new(syringe_type, args.syringe_volume),
    };

    let result = calculate(table, &config.limits, &input);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result)
                .map_err(|e| Error::Input(format!("Failed to serialize result: {}", e)))?
        );
        return Ok(());
    }

    display_result(&input, &result);
    Ok(())
}

fn cmd_syringes(table: &MarkingTable) -> Result<()> {
    println!("\nSupported syringes:\n");

    for (syringe_type, volume, marks) in table.entries() {
        let unit_word = match syringe_type {
            SyringeType::Insulin => "units",
            SyringeType::Standard => "ml",
        };

        let first = marks.first().copied().unwrap_or(0.0);
        let last = marks.last().copied().unwrap_or(0.0);

        println!(
            "  {} {} - {} markings from {} to {} {}",
            syringe_type.label(),
            volume,
            marks.len(),
            first,
            last,
            unit_word
        );
    }

    println!();
    Ok(())
}

fn display_result(input: &DoseInput, result: &CalculationResult) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  DOSE CALCULATION");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Dose: {} {}", input.dose_value, input.unit.label());

    if let Some(concentration) = result.calculated_concentration {
        println!(
            "  Concentration: {} {}",
            concentration,
            input.concentration_unit.label()
        );
    }

    println!(
        "  Syringe: {} {}",
        input.syringe.syringe_type.label(),
        input.syringe.volume
    );
    println!();

    if let Some(volume) = result.calculated_volume {
        println!("  → Draw volume: {:.3} ml", volume);
    }

    if let Some(ref marking) = result.recommended_marking {
        let unit_word = match input.syringe.syringe_type {
            SyringeType::Insulin => "units",
            SyringeType::Standard => "ml",
        };
        println!("  → Draw to marking: {} {}", marking, unit_word);
    }

    if let Some(ref error) = result.calculation_error {
        println!();
        if result.has_blocking_error() {
            println!("  ✗ {}", error);
        } else {
            println!("  ⚠ {}", error);
        }
    }

    println!();
}
