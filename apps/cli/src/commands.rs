//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use fieldscope_core::pipeline::{ClassifyResult, PipelineConfig, ProgressReporter};
use fieldscope_llm::GeminiClient;
use fieldscope_shared::{
    ClassificationRequest, Level, init_config, load_config, config_file_path,
};
use fieldscope_taxonomy::{
    TaxonomyPaths, TaxonomyStore, check_discrepancies, split_masters,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// FieldScope — classify research descriptions into an academic taxonomy.
#[derive(Parser)]
#[command(
    name = "fieldscope",
    version,
    about = "Classify free-text research descriptions into unit, field, and subfield labels.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Classify a research description within one college.
    Classify {
        /// Research description text (or use --file).
        description: Option<String>,

        /// Read the research description from a file.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// College whose hierarchy to classify into.
        #[arg(short, long)]
        college: String,

        /// Department hint to steer unit selection.
        #[arg(short, long)]
        unit: Option<String>,

        /// Taxonomy data directory (defaults to the configured one).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Skip the field-enhancement pass.
        #[arg(long)]
        no_enhance: bool,

        /// Print the full run state as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Explode the master mappings into per-college and per-field files.
    Split {
        /// Taxonomy data directory (defaults to the configured one).
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Check the two master mappings for coverage gaps.
    Check {
        /// Taxonomy data directory (defaults to the configured one).
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "fieldscope=info",
        1 => "fieldscope=debug",
        _ => "fieldscope=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Classify {
            description,
            file,
            college,
            unit,
            data_dir,
            no_enhance,
            json,
        } => {
            cmd_classify(
                description,
                file,
                &college,
                unit,
                data_dir,
                no_enhance,
                json,
            )
            .await
        }
        Command::Split { data_dir } => cmd_split(data_dir).await,
        Command::Check { data_dir } => cmd_check(data_dir).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn load_store(data_dir: Option<PathBuf>) -> Result<TaxonomyStore> {
    let config = load_config()?;
    let dir = data_dir.unwrap_or_else(|| PathBuf::from(&config.defaults.data_dir));
    let paths = TaxonomyPaths::new(dir);
    Ok(TaxonomyStore::load(&paths)?)
}

async fn cmd_classify(
    description: Option<String>,
    file: Option<PathBuf>,
    college: &str,
    unit: Option<String>,
    data_dir: Option<PathBuf>,
    no_enhance: bool,
    json: bool,
) -> Result<()> {
    let config = load_config()?;

    let description = match (description, file) {
        (Some(text), None) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| eyre!("cannot read '{}': {e}", path.display()))?
            .trim()
            .to_string(),
        (Some(_), Some(_)) => {
            return Err(eyre!("pass the description as an argument or via --file, not both"));
        }
        (None, None) => {
            return Err(eyre!("a research description is required (argument or --file)"));
        }
    };
    if description.is_empty() {
        return Err(eyre!("the research description is empty"));
    }

    let dir = data_dir.unwrap_or_else(|| PathBuf::from(&config.defaults.data_dir));
    let paths = TaxonomyPaths::new(dir);
    let store = TaxonomyStore::load(&paths)?;

    let llm = GeminiClient::from_config(&config)?;

    let mut request = ClassificationRequest::new(description, college);
    if let Some(hint) = unit {
        request = request.with_unit_hint(hint);
    }

    let pipeline_config = PipelineConfig {
        max_iterations: config.defaults.max_iterations,
        enhancement: config.defaults.enhancement && !no_enhance,
    };

    info!(request_id = %request.id, college, "classifying research description");

    let reporter = CliProgress::new();
    let result =
        fieldscope_core::pipeline::classify(&store, &llm, request, &pipeline_config, &reporter)
            .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.state)?);
        return Ok(());
    }

    print_summary(&result);
    Ok(())
}

fn print_summary(result: &ClassifyResult) {
    let state = &result.state;

    println!();
    println!("  Classification complete");
    println!("  Units:     {}", join_or_dash(&state.unit_names()));
    println!("  Fields:    {}", join_or_dash(&state.field_names()));
    if !state.new_fields.is_empty() {
        let names: Vec<String> = state.new_fields.iter().map(|c| c.name.clone()).collect();
        println!("  Suggested: {} (not in the taxonomy yet)", names.join(", "));
    }
    println!("  Subfields: {}", join_or_dash(&state.subfield_names()));

    for (label, outcome) in [
        ("unit", &state.units),
        ("field", &state.fields),
        ("subfield", &state.subfields),
    ] {
        if let Some(outcome) = outcome {
            if outcome.exhausted {
                println!(
                    "  Note: {label} level hit the iteration ceiling; labels kept unvalidated"
                );
            }
        }
    }

    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

fn join_or_dash(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

async fn cmd_split(data_dir: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let dir = data_dir.unwrap_or_else(|| PathBuf::from(&config.defaults.data_dir));
    let paths = TaxonomyPaths::new(dir);
    let store = TaxonomyStore::load(&paths)?;

    let summary = split_masters(&store, &paths)?;

    println!(
        "wrote {} college files to {}",
        summary.colleges_written,
        paths.college_mappings_dir().display()
    );
    println!(
        "wrote {} field files to {}",
        summary.fields_written,
        paths.field_mappings_dir().display()
    );
    Ok(())
}

async fn cmd_check(data_dir: Option<PathBuf>) -> Result<()> {
    let store = load_store(data_dir)?;
    let report = check_discrepancies(&store);

    if report.is_clean() {
        println!("masters are consistent");
        return Ok(());
    }

    if !report.missing_subfield_entries.is_empty() {
        println!("fields with no subfield mapping:");
        for field in &report.missing_subfield_entries {
            println!("  - {field}");
        }
    }
    if !report.orphan_fields.is_empty() {
        println!("subfield-master fields absent from any college:");
        for field in &report.orphan_fields {
            println!("  - {field}");
        }
    }
    Err(eyre!("master mappings are inconsistent"))
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("wrote default config to {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    println!("# {}", config_file_path()?.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn iteration(&self, level: Level, iteration: usize, max: usize) {
        self.spinner
            .set_message(format!("{level} classification [{iteration}/{max}]"));
    }

    fn done(&self, _result: &ClassifyResult) {
        self.spinner.finish_and_clear();
    }
}
