//! CLI entry point for the delivery insights tool.
//!
//! Provides subcommands for previewing the shipment dataset, rendering the
//! delay reports, listing the prediction form's choices, and predicting
//! whether a single shipment will be late.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use delivery_insights::analyzers::reports::{
    DEFAULT_WEIGHT_BIN, DISCOUNT_BIN, Report, ReportKind, ReportOptions, run_report,
};
use delivery_insights::analyzers::status::MissingStatus;
use delivery_insights::config::Settings;
use delivery_insights::dataset::Dataset;
use delivery_insights::output::{NumberStyle, append_report, render_json, render_text};
use delivery_insights::predictor::{CATEGORICAL_FIELDS, FormOptions, PredictionInput, Predictor};
use delivery_insights::schema::SchemaMapping;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "delivery_insights")]
#[command(about = "Delivery-delay reports and predictions for shipment data", long_about = None)]
struct Cli {
    /// Dataset path or URL (defaults to DATASET_PATH)
    #[arg(long, global = true, value_name = "FILE_OR_URL")]
    dataset: Option<String>,

    /// JSON file with column alias overrides (defaults to SCHEMA_PATH)
    #[arg(long, global = true)]
    schema: Option<String>,

    /// Field delimiter of the dataset
    #[arg(long, global = true, default_value_t = ',')]
    delimiter: char,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the first records of the dataset
    Preview {
        #[arg(short, long, default_value_t = 10)]
        rows: usize,
    },
    /// Render one or more named reports ("all" for every report)
    Report {
        #[arg(value_name = "NAME", default_value = "all")]
        names: Vec<String>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// File to write to; CSV output is appended
        #[arg(short, long)]
        output: Option<String>,

        /// Weight bucket width in grams
        #[arg(long, default_value_t = DEFAULT_WEIGHT_BIN)]
        weight_bin: f64,

        /// How records without a delivery status are treated
        #[arg(long, value_enum, default_value_t = MissingStatus::AssumeOnTime)]
        missing_status: MissingStatus,

        /// Render numbers as 41,4% and 4.436
        #[arg(long, default_value_t = false)]
        decimal_comma: bool,
    },
    /// List the choices offered for the categorical form fields
    Options,
    /// Predict whether one shipment will arrive late
    Predict {
        /// Model artifact path or URL (defaults to MODEL_PATH)
        #[arg(long, value_name = "FILE_OR_URL")]
        model: Option<String>,

        #[arg(long)]
        warehouse_block: String,
        #[arg(long)]
        mode_of_shipment: String,
        #[arg(long)]
        customer_care_calls: u32,
        #[arg(long)]
        customer_rating: u8,
        #[arg(long)]
        cost: f64,
        #[arg(long)]
        prior_purchases: u32,
        #[arg(long)]
        product_importance: String,
        #[arg(long)]
        gender: String,
        #[arg(long)]
        discount: u8,
        #[arg(long)]
        weight: f64,
    },
}

fn main() -> Result<()> {
    let settings = Settings::from_env();

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = Path::new(&settings.log_file)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&settings.log_file)
        .file_name()
        .unwrap_or(OsStr::new("delivery_insights.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let delimiter = u8::try_from(cli.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("delimiter '{}' is not a single ASCII character", cli.delimiter))?;
    let dataset_source = cli.dataset.unwrap_or(settings.dataset);
    let mapping = match cli.schema.or(settings.schema) {
        Some(path) => SchemaMapping::load(&path)?,
        None => SchemaMapping::default(),
    };

    match cli.command {
        Commands::Preview { rows } => {
            let dataset = Dataset::load(&dataset_source, delimiter, &mapping)?;
            preview(&dataset, rows);
        }
        Commands::Report {
            names,
            format,
            output,
            weight_bin,
            missing_status,
            decimal_comma,
        } => {
            let kinds = resolve_report_names(&names)?;
            let options = ReportOptions {
                weight_bin,
                discount_bin: DISCOUNT_BIN,
                missing_status,
            };
            let style = NumberStyle { decimal_comma };
            let dataset = Dataset::load(&dataset_source, delimiter, &mapping)?;
            render_reports(&dataset, &kinds, &options, format, output.as_deref(), &style)?;
        }
        Commands::Options => {
            let dataset = Dataset::load(&dataset_source, delimiter, &mapping)?;
            let options = FormOptions::from_dataset(&dataset);
            for field in CATEGORICAL_FIELDS {
                let choices = options.choices(field);
                if choices.is_empty() {
                    println!("{field}: (any value)");
                } else {
                    println!("{field}: {}", choices.join(", "));
                }
            }
        }
        Commands::Predict {
            model,
            warehouse_block,
            mode_of_shipment,
            customer_care_calls,
            customer_rating,
            cost,
            prior_purchases,
            product_importance,
            gender,
            discount,
            weight,
        } => {
            let predictor = Predictor::load(&model.unwrap_or(settings.model));
            if let Some(notice) = predictor.notice() {
                println!("Prediction is unavailable: {notice}");
                return Ok(());
            }

            let input = PredictionInput {
                warehouse_block,
                mode_of_shipment,
                customer_care_calls,
                customer_rating,
                cost_of_the_product: cost,
                prior_purchases,
                product_importance,
                gender,
                discount_offered: discount,
                weight_in_gms: weight,
            };

            match Dataset::load(&dataset_source, delimiter, &mapping) {
                Ok(dataset) => FormOptions::from_dataset(&dataset).check(&input)?,
                Err(e) => warn!(error = %format!("{e:#}"), "Dataset unavailable, form choices not checked"),
            }

            let prediction = predictor.predict(&input)?;
            info!(label = %prediction.label, probability = ?prediction.probability, "Prediction made");
            match prediction.probability {
                Some(p) => println!("Prediction: {} (p = {p:.3})", prediction.label),
                None => println!("Prediction: {}", prediction.label),
            }
        }
    }

    Ok(())
}

/// Maps report names to kinds; "all" expands to every report.
fn resolve_report_names(names: &[String]) -> Result<Vec<ReportKind>> {
    let mut kinds = Vec::new();
    for name in names {
        if name.eq_ignore_ascii_case("all") {
            return Ok(ReportKind::ALL.to_vec());
        }
        match ReportKind::ALL.iter().find(|k| k.name() == name.as_str()) {
            Some(kind) => kinds.push(*kind),
            None => {
                let known: Vec<&str> = ReportKind::ALL.iter().map(|k| k.name()).collect();
                bail!("unknown report '{name}' (known: all, {})", known.join(", "));
            }
        }
    }
    Ok(kinds)
}

fn preview(dataset: &Dataset, rows: usize) {
    let headers: Vec<&str> = dataset.headers().iter().collect();
    println!("{}", headers.join(" | "));
    for record in dataset.head(rows) {
        let cells: Vec<&str> = record.iter().collect();
        println!("{}", cells.join(" | "));
    }
    println!("({} of {} records)", rows.min(dataset.len()), dataset.len());
}

/// Runs each report in turn. A failed report is logged and skipped.
fn render_reports(
    dataset: &Dataset,
    kinds: &[ReportKind],
    options: &ReportOptions,
    format: Format,
    output: Option<&str>,
    style: &NumberStyle,
) -> Result<()> {
    let mut rendered = Vec::new();
    let mut failed = 0;

    for kind in kinds {
        let report: Report = match run_report(*kind, dataset, options) {
            Ok(report) => report,
            Err(e) => {
                failed += 1;
                if e.is_warning() {
                    warn!(report = kind.name(), error = %e, "Report skipped");
                } else {
                    error!(report = kind.name(), error = %e, "Report failed");
                }
                continue;
            }
        };

        match format {
            Format::Text => rendered.push(render_text(&report, style)),
            Format::Json => rendered.push(render_json(&report)?),
            Format::Csv => {
                let path = output.unwrap_or("reports.csv");
                append_report(path, &report)?;
                info!(report = kind.name(), path, "Report appended");
            }
        }
    }

    if !rendered.is_empty() {
        let body = rendered.join("\n");
        match output {
            Some(path) if format != Format::Csv => {
                std::fs::write(path, body).with_context(|| format!("failed to write '{path}'"))?;
                info!(path, "Reports written");
            }
            _ => println!("{body}"),
        }
    }

    info!(requested = kinds.len(), failed, "Reports finished");
    Ok(())
}
