use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::error;

use nutrirs::analysis::{AnalysisReport, BatchEntry, GlucoseAnalyzer};
use nutrirs::assistant::respond;
use nutrirs::config::AppConfig;
use nutrirs::explainer::ExplanationStyle;
use nutrirs::export::{self, text::render_report, ExportFormat};
use nutrirs::import::{parse_inline_readings, ImportManager, ReadingSet};
use nutrirs::logging::init_logging;
use nutrirs::meals::{sample_day, Allergen};
use nutrirs::models::{Goal, MacroPlan};
use nutrirs::nutrition::{plausibility_warnings, GoalPolicy};
use nutrirs::profile::{ActivityLevel, DietType, EnergyProfile, Sex};

/// NutriRS - Glucose-aware nutrition CLI
///
/// Detects glucose spikes and lows in a day of CGM readings, scores time in
/// range, and turns the result into a daily macronutrient prescription.
#[derive(Parser)]
#[command(name = "nutrirs")]
#[command(author = "NutriRS Contributors")]
#[command(version)]
#[command(about = "Glucose event detection and macro planning", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one day of glucose readings
    Analyze {
        /// Readings file (CSV or JSON)
        #[arg(short, long, conflicts_with = "readings", required_unless_present = "readings")]
        file: Option<PathBuf>,

        /// Inline readings, e.g. "08:00,95 09:00,142"
        #[arg(short, long)]
        readings: Option<String>,

        /// Bodyweight in kilograms
        #[arg(short, long)]
        weight: Option<Decimal>,

        /// Goal: cut, maintain or gain
        #[arg(short, long)]
        goal: Option<String>,

        /// Minimum rise in mg/dL that counts as a spike
        #[arg(long)]
        spike_threshold: Option<i32>,

        /// Glucose below this is a low
        #[arg(long)]
        low_threshold: Option<i32>,

        /// Longest gap in minutes a spike may span
        #[arg(long)]
        max_minutes: Option<u32>,

        /// Explanation style (detailed, brief)
        #[arg(long)]
        style: Option<ExplanationStyle>,

        /// Treat unknown goals as maintain instead of failing
        #[arg(long)]
        legacy_goals: bool,

        /// Console output format
        #[arg(short = 'F', long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write the report to a file (format from extension: json, txt, csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze every readings file in a directory in parallel
    Batch {
        /// Directory containing CSV/JSON readings files
        #[arg(short, long)]
        dir: PathBuf,

        /// Bodyweight for files that do not carry one
        #[arg(short, long)]
        weight: Option<Decimal>,

        /// Goal for files that do not carry one
        #[arg(short, long)]
        goal: Option<Goal>,

        /// Emit one JSON document instead of a table
        #[arg(long)]
        json: bool,

        /// Hide the import progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Ask a question about an analyzed day
    Ask {
        /// Saved JSON report, as written by `analyze --output report.json`
        #[arg(long, conflicts_with = "readings", required_unless_present = "readings")]
        report: Option<PathBuf>,

        /// Inline readings, analyzed with the configured defaults
        #[arg(short, long)]
        readings: Option<String>,

        /// Question about spikes, lows, macros or the recommendation
        question: String,
    },

    /// Estimate energy needs from a personal profile
    Plan {
        #[arg(long)]
        sex: Sex,

        #[arg(long)]
        age: u32,

        /// Height in centimeters
        #[arg(long)]
        height: Decimal,

        /// Weight in kilograms
        #[arg(long)]
        weight: Decimal,

        /// sedentary, lightly-active, moderately-active, very-active, extra-active
        #[arg(long, default_value = "moderately-active")]
        activity: ActivityLevel,

        #[arg(long, default_value = "maintain")]
        goal: Goal,

        #[arg(long, default_value = "balanced")]
        diet: DietType,

        /// Also print a sample day of meals
        #[arg(long)]
        meals: bool,

        /// Allergens to avoid in the sample day (comma separated)
        #[arg(long, value_delimiter = ',')]
        allergies: Vec<Allergen>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Manage the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,

        /// Print the configuration file path
        #[arg(long)]
        path: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        error!("{:#}", err);
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default()?,
    };

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Analyze {
            file,
            readings,
            weight,
            goal,
            spike_threshold,
            low_threshold,
            max_minutes,
            style,
            legacy_goals,
            format,
            output,
        } => {
            let mut set = match (file, readings) {
                (Some(path), _) => ImportManager::new().import_file(&path)?,
                (None, Some(inline)) => ReadingSet::from_readings(parse_inline_readings(&inline)?),
                (None, None) => bail!("Either --file or --readings is required"),
            };
            if weight.is_some() {
                set.bodyweight_kg = weight;
            }
            if goal.is_some() {
                set.goal = goal;
            }

            let mut engine = config.engine.clone();
            if let Some(threshold) = spike_threshold {
                engine.thresholds.spike_threshold = threshold;
            }
            if let Some(threshold) = low_threshold {
                engine.thresholds.low_threshold = threshold;
            }
            if let Some(minutes) = max_minutes {
                engine.thresholds.max_minutes = minutes;
            }
            if let Some(style) = style {
                engine.explanation_style = style;
            }
            if legacy_goals {
                engine.goal_policy = GoalPolicy::Legacy;
            }
            engine.validate()?;

            let request = set.into_request(config.defaults.bodyweight_kg, config.defaults.goal);
            let report = GlucoseAnalyzer::new(engine).analyze(&request)?;

            match output {
                Some(path) => write_report(&report, &path)?,
                None => match format {
                    OutputFormat::Table => print_report(&report),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                    OutputFormat::Text => print!("{}", render_report(&report)),
                },
            }
        }

        Commands::Batch {
            dir,
            weight,
            goal,
            json,
            no_progress,
        } => {
            let bodyweight = weight.unwrap_or(config.defaults.bodyweight_kg);
            let goal = goal.unwrap_or(config.defaults.goal);

            let imported = ImportManager::new()
                .with_progress(!no_progress && !json)
                .import_directory(&dir)?;

            let labelled = imported
                .into_iter()
                .map(|(path, result)| (file_label(&path), result))
                .collect();
            let entries =
                GlucoseAnalyzer::new(config.engine.clone()).analyze_imported(labelled, bodyweight, goal);

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            let rows: Vec<BatchRow> = entries.into_iter().map(BatchRow::from).collect();

            println!("{}", "Batch analysis".cyan().bold());
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Ask {
            report,
            readings,
            question,
        } => {
            let report = match (report, readings) {
                (Some(path), _) => load_report(&path)?,
                (None, Some(inline)) => {
                    let request = ReadingSet::from_readings(parse_inline_readings(&inline)?)
                        .into_request(config.defaults.bodyweight_kg, config.defaults.goal);
                    GlucoseAnalyzer::new(config.engine.clone()).analyze(&request)?
                }
                (None, None) => bail!("Either --report or --readings is required"),
            };

            println!("{} {}", "Q:".cyan().bold(), question);
            println!("{} {}", "A:".green().bold(), respond(&report, &question));
        }

        Commands::Plan {
            sex,
            age,
            height,
            weight,
            activity,
            goal,
            diet,
            meals,
            allergies,
            json,
        } => {
            let profile = EnergyProfile {
                sex,
                age,
                height_cm: height,
                weight_kg: weight,
                activity,
                goal,
                diet,
            };
            let plan = profile.plan()?;
            let day = if meals {
                Some(sample_day(diet, &allergies, &plan.macros)?)
            } else {
                None
            };

            if json {
                let document = serde_json::json!({ "plan": plan, "meals": day });
                println!("{}", serde_json::to_string_pretty(&document)?);
                return Ok(());
            }

            println!("{}", "Energy plan".green().bold());
            println!("  BMR:  {} kcal", plan.bmr.round_dp(0));
            println!("  TDEE: {} kcal", plan.tdee.round_dp(0));
            println!("{}", Table::new([MacroRow::from(&plan.macros)]).with(Style::rounded()));
            for warning in plausibility_warnings(&plan.macros) {
                println!("{} {}", "!".yellow().bold(), warning.yellow());
            }

            if let Some(day) = day {
                let rows: Vec<MealRow> = day
                    .iter()
                    .map(|meal| MealRow {
                        meal: meal.slot.label().to_string(),
                        description: meal.description.clone(),
                        protein_g: meal.protein_g,
                        carbs_g: meal.carbs_g,
                        fat_g: meal.fat_g,
                    })
                    .collect();
                println!("{}", "Sample day".green().bold());
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }

        Commands::Config { init, show, path } => {
            let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);

            if path {
                println!("{}", config_path.display());
            }
            if init {
                if config_path.exists() {
                    bail!("Configuration already exists: {}", config_path.display());
                }
                AppConfig::default().save_to_file(&config_path)?;
                println!("{} {}", "Wrote".green(), config_path.display());
            }
            if show || !(init || path) {
                let content =
                    toml::to_string_pretty(&config).context("Failed to serialize configuration to TOML")?;
                println!("{}", content);
            }
        }
    }

    Ok(())
}

fn write_report(report: &AnalysisReport, path: &Path) -> Result<()> {
    let format = ExportFormat::from_path(path)
        .with_context(|| format!("Cannot infer export format from {}", path.display()))?;
    export::export_report(report, format, path)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    println!("{} {}", "Report written to".green(), path.display());
    Ok(())
}

fn load_report(path: &Path) -> Result<AnalysisReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse report JSON: {}", path.display()))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Event")]
    kind: &'static str,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Glucose")]
    glucose: String,
    #[tabled(rename = "Change")]
    change: String,
}

#[derive(Tabled)]
struct MacroRow {
    #[tabled(rename = "Calories")]
    calories: i64,
    #[tabled(rename = "Protein (g)")]
    protein_g: i64,
    #[tabled(rename = "Carbs (g)")]
    carbs_g: i64,
    #[tabled(rename = "Fat (g)")]
    fat_g: i64,
}

impl From<&MacroPlan> for MacroRow {
    fn from(plan: &MacroPlan) -> Self {
        MacroRow {
            calories: plan.calories,
            protein_g: plan.protein_g,
            carbs_g: plan.carbs_g,
            fat_g: plan.fat_g,
        }
    }
}

#[derive(Tabled)]
struct MealRow {
    #[tabled(rename = "Meal")]
    meal: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Protein (g)")]
    protein_g: i64,
    #[tabled(rename = "Carbs (g)")]
    carbs_g: i64,
    #[tabled(rename = "Fat (g)")]
    fat_g: i64,
}

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "TIR %")]
    tir: String,
    #[tabled(rename = "Spikes")]
    spikes: String,
    #[tabled(rename = "Lows")]
    lows: String,
    #[tabled(rename = "Calories")]
    calories: String,
    #[tabled(rename = "P/C/F (g)")]
    split: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<BatchEntry> for BatchRow {
    fn from(entry: BatchEntry) -> Self {
        match (entry.report, entry.error) {
            (Some(report), _) => BatchRow::from_report(entry.file, &report),
            (None, error) => BatchRow::failed(entry.file, error.unwrap_or_default()),
        }
    }
}

impl BatchRow {
    fn from_report(file: String, report: &AnalysisReport) -> Self {
        let macros = &report.macros;
        BatchRow {
            file,
            tir: format!("{:.1}", report.tir),
            spikes: report.spikes.len().to_string(),
            lows: report.lows.len().to_string(),
            calories: macros.calories.to_string(),
            split: format!("{}/{}/{}", macros.protein_g, macros.carbs_g, macros.fat_g),
            status: if report.warnings.is_empty() {
                "ok".to_string()
            } else {
                format!("{} warning(s)", report.warnings.len())
            },
        }
    }

    fn failed(file: String, reason: String) -> Self {
        BatchRow {
            file,
            tir: "-".to_string(),
            spikes: "-".to_string(),
            lows: "-".to_string(),
            calories: "-".to_string(),
            split: "-".to_string(),
            status: reason,
        }
    }
}

fn print_report(report: &AnalysisReport) {
    let tir = format!("{:.1}%", report.tir);
    let tir = if report.tir >= Decimal::from(80) {
        tir.green()
    } else if report.tir >= Decimal::from(60) {
        tir.yellow()
    } else {
        tir.red()
    };

    println!("{}", "Glucose analysis".cyan().bold());
    println!("  Goal: {}   Bodyweight: {} kg", report.goal, report.bodyweight_kg.normalize());
    println!(
        "  Time in range: {}  ({} below, {} within, {} above)",
        tir.bold(),
        report.range.below,
        report.range.within,
        report.range.above
    );

    let events: Vec<EventRow> = report
        .spikes
        .iter()
        .map(|spike| EventRow {
            kind: "spike",
            time: format!("{} -> {}", spike.start_time, spike.end_time),
            glucose: format!("{} -> {}", spike.glucose_start, spike.glucose_peak),
            change: format!("+{} in {} min", spike.delta, spike.duration_minutes),
        })
        .chain(report.lows.iter().map(|low| EventRow {
            kind: "low",
            time: low.time.to_string(),
            glucose: low.glucose.to_string(),
            change: String::new(),
        }))
        .collect();

    if events.is_empty() {
        println!("  {}", "No spikes or lows detected".green());
    } else {
        println!("{}", Table::new(events).with(Style::rounded()));
    }

    println!("{}", "Macro plan".cyan().bold());
    println!("{}", Table::new([MacroRow::from(&report.macros)]).with(Style::rounded()));

    println!("{}", report.guidance.headline.bold());
    println!("{}", report.guidance.advice);
    println!();
    println!("{}", report.recommendation);

    for warning in &report.warnings {
        println!("{} {}", "!".yellow().bold(), warning.yellow());
    }
}
