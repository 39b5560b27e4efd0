use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::HomeAssistantClient;
use crate::config::ControllerConfig;
use crate::diagnostics::print_diagnostics;
use crate::generator::{
    format_module, generate_module, GenerationOptions, GenerationStats, DEFAULT_RUNTIME_PATH,
};
use crate::schema::read_dump;

/// File names written by `generate --dump-dir`
pub const STATES_DUMP: &str = "entities.json";
pub const SERVICES_DUMP: &str = "services.json";

/// Command-line interface for the schema compiler
#[derive(Parser, Debug)]
#[command(name = "hatyper-gen", version)]
#[command(about = "Compile a Home Assistant schema into a typed Rust module", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the live schema from a controller and generate the module
    Generate {
        /// Path of the generated `.rs` file
        output: PathBuf,

        /// Controller base URL, e.g. http://homeassistant.local:8123
        #[arg(long, env = "HOMEASSISTANT_URL")]
        url: Option<String>,

        /// Long-lived access token
        #[arg(long, env = "HOMEASSISTANT_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Also write the fetched documents to this directory
        #[arg(short = 'd', long)]
        dump_dir: Option<PathBuf>,

        /// Path the generated module imports the runtime from
        #[arg(long, default_value = DEFAULT_RUNTIME_PATH)]
        runtime_path: String,

        /// Run rustfmt on the written file
        #[arg(long, default_value_t = false)]
        format: bool,
    },
    /// Generate the module from saved dumps, without network access
    Compile {
        /// Entity state list (JSON array)
        #[arg(long)]
        states: PathBuf,

        /// Service registry (JSON array)
        #[arg(long)]
        services: PathBuf,

        /// Path of the generated `.rs` file
        output: PathBuf,

        /// Path the generated module imports the runtime from
        #[arg(long, default_value = DEFAULT_RUNTIME_PATH)]
        runtime_path: String,

        /// Run rustfmt on the written file
        #[arg(long, default_value_t = false)]
        format: bool,
    },
}

/// Parse arguments from the process and run
///
/// # Errors
///
/// Returns an error if:
/// - The controller URL or token is missing (checked before any request)
/// - Fetching the schema fails
/// - A dump file cannot be read
/// - The output cannot be written
pub fn run_cli() -> Result<()> {
    run(Cli::parse())
}

/// Run an already-parsed command line
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate {
            output,
            url,
            token,
            dump_dir,
            runtime_path,
            format,
        } => {
            let config = ControllerConfig::new(url.as_deref(), token.as_deref())?;
            let client = HomeAssistantClient::new(&config)?;
            tracing::info!(url = %config.api_url(), "Fetching schema");
            let states = client
                .fetch_states()
                .context("Failed to fetch entity states")?;
            let services = client
                .fetch_services()
                .context("Failed to fetch service registry")?;
            if let Some(dir) = dump_dir {
                write_dumps(&dir, &states, &services)?;
            }
            emit(&states, &services, &output, runtime_path, format)?;
            Ok(())
        }
        Commands::Compile {
            states,
            services,
            output,
            runtime_path,
            format,
        } => {
            let states = read_dump(&states)?;
            let services = read_dump(&services)?;
            emit(&states, &services, &output, runtime_path, format)?;
            Ok(())
        }
    }
}

/// Compile, write, report diagnostics and optionally format.
fn emit(
    states: &Value,
    services: &Value,
    output: &Path,
    runtime_path: String,
    format: bool,
) -> Result<GenerationStats> {
    let options = GenerationOptions { runtime_path };
    let module = generate_module(states, services, &options)?;
    write_output(output, &module.source)?;
    print_diagnostics(&module.diagnostics);
    if format {
        if let Err(e) = format_module(output) {
            tracing::warn!(
                path = %output.display(),
                error = %e,
                "Formatting failed; output left as generated"
            );
        }
    }
    println!(
        "✅ Wrote {} ({} entities, {} domains, {} traits, {} enums)",
        output.display(),
        module.stats.entities,
        module.stats.domains,
        module.stats.traits,
        module.stats.enums
    );
    Ok(module.stats)
}

/// Write to a sibling temporary file, then rename into place.
pub fn write_output(output: &Path, source: &str) -> Result<()> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .with_context(|| format!("Failed to create output directory {parent:?}"))?;
    let file_name = output
        .file_name()
        .with_context(|| format!("Output path {output:?} has no file name"))?;
    let tmp = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));
    fs::write(&tmp, source).with_context(|| format!("Failed to write {tmp:?}"))?;
    if let Err(e) = fs::rename(&tmp, output) {
        fs::remove_file(&tmp).ok();
        return Err(e).with_context(|| format!("Failed to move output into place at {output:?}"));
    }
    Ok(())
}

fn write_dumps(dir: &Path, states: &Value, services: &Value) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create dump directory {dir:?}"))?;
    for (name, value) in [(STATES_DUMP, states), (SERVICES_DUMP, services)] {
        let path = dir.join(name);
        let text = serde_json::to_string_pretty(value)?;
        fs::write(&path, text).with_context(|| format!("Failed to write dump {path:?}"))?;
        tracing::debug!(path = %path.display(), "Wrote schema dump");
    }
    Ok(())
}
