//! Tincture command-line client
//!
//! Prints theme stylesheets, manages the theme library and renders email
//! bodies against the active theme.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tincture_core::theme::is_builtin;
use tincture_core::{EngineConfig, Storage};
use tincture_ui::css_sink::TRANSITION_JAM;
use tincture_ui::{render_email, CssVariableSink, EmailMode, ThemeService};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "tincture")]
#[command(about = "Perceptual theming and email contrast remediation")]
#[command(version)]
struct Cli {
    /// Directory holding the theme database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON file with engine settings (default and safe theme ids)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the `:root` custom properties of a theme
    Css {
        /// Theme id; defaults to the active theme
        #[arg(long)]
        theme: Option<String>,
    },
    /// List built-in and saved themes
    Themes,
    /// Make a theme the active one
    Apply { id: String },
    /// Print an email body remediated for a theme
    Remediate {
        file: PathBuf,
        #[arg(long)]
        theme: Option<String>,
    },
    /// Import a theme JSON file or share code
    Import {
        file: PathBuf,
        /// Also make the imported theme active
        #[arg(long)]
        apply: bool,
    },
    /// Print a theme as JSON or as a share code
    Export {
        id: String,
        #[arg(long)]
        share: bool,
    },
    /// Delete a saved theme
    Delete { id: String },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!("Tincture v{}", env!("CARGO_PKG_VERSION"));

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .context("No platform data directory; pass --data-dir")?
            .join("tincture"),
    };
    let config = match cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&raw).context("Invalid engine config")?
        }
        None => EngineConfig::default(),
    };

    let storage = Arc::new(Storage::new_with_path(&data_dir)?);
    let mut service = ThemeService::open(storage, config)?;

    match cli.command {
        Command::Css { theme } => {
            let sink = CssVariableSink::default();
            service.engine_mut().add_sink(Box::new(sink.clone()));
            if let Some(id) = theme {
                service.engine_mut().apply_theme(&id);
            }
            sink.tick(Instant::now() + TRANSITION_JAM);
            println!("{}", sink.stylesheet());
        }
        Command::Themes => {
            let current = service.engine().state().current_theme_id.clone();
            for theme in service.engine().themes() {
                let marker = if current.as_deref() == Some(theme.id.as_str()) {
                    '*'
                } else {
                    ' '
                };
                let origin = if is_builtin(&theme.id) { "built-in" } else { "saved" };
                println!("{} {:<40} {} ({})", marker, theme.id, theme.name, origin);
            }
        }
        Command::Apply { id } => {
            let applied = service.apply_theme(&id)?;
            println!("{}", applied);
        }
        Command::Remediate { file, theme } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            if let Some(id) = theme {
                service.engine_mut().apply_theme(&id);
            }
            let rendered = render_email(&html, &service.palette());
            match rendered.mode {
                EmailMode::Remediated(report) => info!(
                    "Rewrote {} of {} text nodes, recolored {} links",
                    report.rewritten, report.visited, report.anchors_recolored
                ),
                EmailMode::TableFallback => info!("Table layout shown on a white page"),
            }
            println!("{}", rendered.html);
        }
        Command::Import { file, apply } => {
            let payload = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let theme = service.import_theme(&payload, apply)?;
            println!("{}", theme.id);
        }
        Command::Export { id, share } => {
            println!("{}", service.export_theme(&id, share)?);
        }
        Command::Delete { id } => {
            let removed = service.delete_theme(&id)?;
            println!("Deleted {}", removed.name);
        }
    }

    Ok(())
}
