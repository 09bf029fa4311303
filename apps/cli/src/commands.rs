//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use biddoc_client::SubmissionClient;
use biddoc_core::{
    ExportOptions, ExportResult, FileDelivery, ProgressReporter, export_document_with_progress,
};
use biddoc_shared::{
    AppConfig, BiddingFormData, ExportConfig, drafts_dir, init_config, load_config,
    load_config_from, step_name, validate_form,
};
use biddoc_storage::DraftStore;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// biddoc: generate bidding documents from structured form data.
#[derive(Parser)]
#[command(
    name = "biddoc",
    version,
    about = "Fill a .docx bidding template from a bidding form and manage drafts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.biddoc/biddoc.toml.
    #[arg(long, global = true, env = "BIDDOC_CONFIG")]
    pub config: Option<PathBuf>,

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
    /// Write a blank bidding form.
    New {
        /// Destination JSON file.
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Check a form for missing or malformed fields.
    Validate {
        /// Form JSON file.
        form: PathBuf,
    },

    /// Print the template data a form produces.
    Preview {
        /// Form JSON file.
        form: PathBuf,
    },

    /// Render a form into a .docx document.
    Export {
        /// Form JSON file.
        form: PathBuf,

        #[command(flatten)]
        args: ExportArgs,
    },

    /// Manage the locally saved draft.
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },

    /// Submit a form to the bidding backend.
    Submit {
        /// Form JSON file.
        form: PathBuf,
    },

    /// Upload a file to the bidding backend.
    Upload {
        /// File to upload.
        file: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Overrides shared by `export` and `draft export`.
#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// Template path or http(s) URL (overrides config).
    #[arg(short, long)]
    pub template: Option<String>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Output file name; `.docx` is appended.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Export even when the form has validation issues.
    #[arg(long)]
    pub no_validate: bool,
}

/// Draft subcommands.
#[derive(Subcommand)]
pub(crate) enum DraftAction {
    /// Save a form as the current draft.
    Save {
        /// Form JSON file.
        form: PathBuf,

        /// Zero-based wizard step to resume at.
        #[arg(long, default_value = "0")]
        step: u32,
    },
    /// Show the saved draft.
    Show {
        /// Print the full draft JSON.
        #[arg(long)]
        json: bool,
    },
    /// Export the saved draft.
    Export {
        #[command(flatten)]
        args: ExportArgs,
    },
    /// Delete the saved draft.
    Remove,
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
        0 => "biddoc=info",
        1 => "biddoc=debug",
        _ => "biddoc=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::New { path, force } => cmd_new(&path, force),
        Command::Validate { form } => cmd_validate(&form),
        Command::Preview { form } => cmd_preview(config_path, &form),
        Command::Export { form, args } => cmd_export(config_path, &form, &args).await,
        Command::Draft { action } => match action {
            DraftAction::Save { form, step } => cmd_draft_save(config_path, &form, step),
            DraftAction::Show { json } => cmd_draft_show(config_path, json),
            DraftAction::Export { args } => cmd_draft_export(config_path, &args).await,
            DraftAction::Remove => cmd_draft_remove(config_path),
        },
        Command::Submit { form } => cmd_submit(config_path, &form).await,
        Command::Upload { file } => cmd_upload(config_path, &file).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

fn read_form(path: &Path) -> Result<BiddingFormData> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("cannot read form {}", path.display()))?;
    serde_json::from_str(&content).wrap_err_with(|| format!("invalid form {}", path.display()))
}

fn draft_store(config: &AppConfig) -> Result<DraftStore> {
    Ok(DraftStore::new(drafts_dir(config)?).with_utc_offset_hours(config.export.utc_offset_hours))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_new(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(eyre!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    let json = serde_json::to_string_pretty(&BiddingFormData::default())?;
    std::fs::write(path, json).wrap_err_with(|| format!("cannot write {}", path.display()))?;
    println!("Blank form written to: {}", path.display());
    Ok(())
}

fn cmd_validate(form_path: &Path) -> Result<()> {
    let form = read_form(form_path)?;
    let issues = validate_form(&form);
    if issues.is_empty() {
        println!("{}: ok", form_path.display());
        return Ok(());
    }
    for issue in &issues {
        println!("  {issue}");
    }
    Err(eyre!("{} validation issue(s) found", issues.len()))
}

fn cmd_preview(config_path: Option<&Path>, form_path: &Path) -> Result<()> {
    let config = resolve_config(config_path)?;
    let form = read_form(form_path)?;
    let options = biddoc_transform::TransformOptions::from(&ExportConfig::from(&config));
    let data = biddoc_transform::transform_with(&form, &options);
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

async fn cmd_export(config_path: Option<&Path>, form_path: &Path, args: &ExportArgs) -> Result<()> {
    let config = resolve_config(config_path)?;
    let form = read_form(form_path)?;
    export_form(&config, &form, args).await
}

async fn export_form(config: &AppConfig, form: &BiddingFormData, args: &ExportArgs) -> Result<()> {
    let issues = validate_form(form);
    if !issues.is_empty() {
        if !args.no_validate {
            for issue in &issues {
                println!("  {issue}");
            }
            return Err(eyre!(
                "form has {} validation issue(s); fix them or pass --no-validate",
                issues.len()
            ));
        }
        warn!(issues = issues.len(), "exporting a form with validation issues");
    }

    let mut export_config = ExportConfig::from(config);
    if let Some(template) = &args.template {
        export_config.template = template.clone();
    }
    if let Some(dir) = &args.output_dir {
        export_config.output_dir = dir.clone();
    }

    let mut options = ExportOptions::from_config(&export_config)?;
    options.output_file_name = args.name.clone();
    let delivery = FileDelivery::new(&export_config.output_dir);

    info!(template = %options.template, output_dir = %export_config.output_dir.display(), "exporting");

    let reporter = CliProgress::new();
    let result = export_document_with_progress(form, &options, &delivery, &reporter).await;

    let file = match (result.success, result.file) {
        (true, Some(file)) => file,
        _ => {
            return Err(eyre!(
                "导出失败: {}",
                result.error.unwrap_or_else(|| "unknown error".into())
            ));
        }
    };

    println!();
    println!("  Document exported!");
    println!("  File:   {}", file.file_name);
    println!("  Path:   {}", file.path.display());
    println!("  Size:   {} bytes", file.size_bytes);
    println!("  SHA256: {}", file.sha256);
    println!();
    Ok(())
}

fn cmd_draft_save(config_path: Option<&Path>, form_path: &Path, step: u32) -> Result<()> {
    let config = resolve_config(config_path)?;
    let form = read_form(form_path)?;
    let store = draft_store(&config)?;
    if !store.save(&form, step) {
        return Err(eyre!("failed to save draft to {}", store.path().display()));
    }
    println!("Draft saved at {}", store.saved_time());
    Ok(())
}

fn cmd_draft_show(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = resolve_config(config_path)?;
    let store = draft_store(&config)?;
    let Some(draft) = store.load() else {
        println!("No draft saved.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&draft)?);
        return Ok(());
    }

    let basic = &draft.form_data.basic_info;
    println!();
    println!("  Saved:   {}", store.saved_time());
    println!(
        "  Step:    {} {}",
        draft.current_step + 1,
        step_name(draft.current_step + 1)
    );
    println!("  Project: {}", basic.project_name);
    println!("  Number:  {}", basic.bid_number);
    println!("  Path:    {}", store.path().display());
    println!();
    Ok(())
}

async fn cmd_draft_export(config_path: Option<&Path>, args: &ExportArgs) -> Result<()> {
    let config = resolve_config(config_path)?;
    let store = draft_store(&config)?;
    let draft = store
        .load()
        .ok_or_else(|| eyre!("no draft saved in {}", store.dir().display()))?;
    export_form(&config, &draft.form_data, args).await
}

fn cmd_draft_remove(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let store = draft_store(&config)?;
    if !store.remove() {
        return Err(eyre!("failed to remove {}", store.path().display()));
    }
    println!("Draft removed.");
    Ok(())
}

fn client(config: &AppConfig) -> Result<SubmissionClient> {
    Ok(SubmissionClient::new(
        &config.api.base_url,
        Duration::from_secs(config.api.timeout_secs),
    )?)
}

async fn cmd_submit(config_path: Option<&Path>, form_path: &Path) -> Result<()> {
    let config = resolve_config(config_path)?;
    let form = read_form(form_path)?;
    let response = client(&config)?.submit(&form).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn cmd_upload(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let config = resolve_config(config_path)?;
    let response = client(&config)?.upload_file(file).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
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
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, message: &str) {
        self.spinner.set_message(message.to_string());
    }

    fn done(&self, _result: &ExportResult) {
        self.spinner.finish_and_clear();
    }
}
