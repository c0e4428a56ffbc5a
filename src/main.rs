//! # qr-studio CLI
//!
//! Command-line front end for the QR code studio.
//!
//! ## Usage
//!
//! ```bash
//! # Render a URL with the default style into ./qr-code-studio.png
//! qr-studio render --url https://example.com
//!
//! # Embed a small file, use dots and a circular logo
//! qr-studio render --file card.vcf --dot-style dots --logo logo.png --out build/
//!
//! # Start from a saved profile and override the size
//! qr-studio render --profile studio.json --size 320
//!
//! # Show and reuse past payloads
//! qr-studio history list
//! qr-studio history restore 3f2a9c1e
//!
//! # Print the effective settings as JSON
//! qr-studio profile --profile studio.json --eye-radius 12
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use qr_studio::{
    Configurable, DotStyle, FileRepository, LogoShape, LogoSource, Studio, StudioError, StudioProfile,
    TracingNotifier,
};

/// qr-studio - Styled QR codes with logos
#[derive(Parser, Debug)]
#[command(name = "qr-studio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the history slot
    #[arg(long, global = true, default_value = ".qr-studio", value_name = "DIR")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a QR code and save it as PNG
    Render {
        #[command(flatten)]
        content: ContentArgs,

        #[command(flatten)]
        style: StyleArgs,

        /// Output directory
        #[arg(long, default_value = ".", value_name = "DIR")]
        out: PathBuf,
    },

    /// Inspect or reuse past payloads
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Print the effective settings as a JSON profile
    Profile {
        /// Payload to include
        #[arg(long)]
        url: Option<String>,

        #[command(flatten)]
        style: StyleArgs,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List entries, newest first
    List,

    /// Render a past payload again
    Restore {
        /// Entry id as shown by `history list`
        id: String,

        #[command(flatten)]
        style: StyleArgs,

        /// Output directory
        #[arg(long, default_value = ".", value_name = "DIR")]
        out: PathBuf,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ContentArgs {
    /// Text or URL to encode
    #[arg(long)]
    url: Option<String>,

    /// File to encode (embedded up to 500 KiB)
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// JSON profile to start from
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Edge length in pixels (120-400)
    #[arg(long)]
    size: Option<i64>,

    /// Background color, e.g. #FFFFFF
    #[arg(long)]
    background: Option<String>,

    /// Foreground color, e.g. #000000
    #[arg(long)]
    foreground: Option<String>,

    #[arg(long, value_enum)]
    dot_style: Option<DotStyle>,

    /// Finder pattern corner radius (0-20)
    #[arg(long)]
    eye_radius: Option<i64>,

    /// Logo image file
    #[arg(long, value_name = "FILE", conflicts_with = "logo_url")]
    logo: Option<PathBuf>,

    /// Logo URL (kept in the profile, not fetched)
    #[arg(long)]
    logo_url: Option<String>,

    #[arg(long, value_enum)]
    logo_shape: Option<LogoShape>,

    /// Logo edge in pixels (20 up to half the size, at most 120)
    #[arg(long)]
    logo_size: Option<i64>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Studio(#[from] StudioError),

    #[error("failed to read profile {path}: {source}")]
    ReadProfile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile: {0}")]
    Profile(#[from] serde_json::Error),

    #[error("no history entry with id {0:?}")]
    UnknownEntry(String),
}

type CliStudio = Studio<FileRepository, TracingNotifier>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qr_studio=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut studio: CliStudio = Studio::new(FileRepository::new(&cli.data_dir), TracingNotifier);

    match cli.command {
        Commands::Render { content, style, out } => {
            style.apply(&mut studio).await?;
            if let Some(path) = &content.file {
                studio.load_file(path).await?;
            } else if let Some(url) = content.url {
                studio.set_url(url);
            }

            let entry = studio.generate().await?;
            let path = studio.save_download(&out)?;
            println!("{} -> {}", entry.label(), path.display());
        }

        Commands::History { command } => match command {
            HistoryCommand::List => {
                for entry in studio.history().list() {
                    println!(
                        "{}  {}  {}",
                        entry.id(),
                        entry.created_at().format("%Y-%m-%d %H:%M:%S"),
                        entry.label()
                    );
                }
            }
            HistoryCommand::Restore { id, style, out } => {
                style.apply(&mut studio).await?;
                let payload = studio.restore(&id).ok_or_else(|| CliError::UnknownEntry(id.clone()))?;
                let path = studio.save_download(&out)?;
                println!("{payload} -> {}", path.display());
            }
        },

        Commands::Profile { url, style } => {
            style.apply(&mut studio).await?;
            if let Some(url) = url {
                studio.set_url(url);
            }
            println!("{}", studio.export_profile().to_json_pretty()?);
        }
    }

    Ok(())
}

impl StyleArgs {
    /// Applies the profile file first, then every flag given on top of it.
    async fn apply(&self, studio: &mut CliStudio) -> Result<(), CliError> {
        if let Some(path) = &self.profile {
            studio.apply_profile(&read_profile(path).await?);
        }

        if let Some(size) = self.size {
            studio.set_size(size);
        }
        if let Some(color) = &self.background {
            studio.set_background(color.as_str());
        }
        if let Some(color) = &self.foreground {
            studio.set_foreground(color.as_str());
        }
        if let Some(dot_style) = self.dot_style {
            studio.set_dot_style(dot_style);
        }
        if let Some(radius) = self.eye_radius {
            studio.set_eye_radius(radius);
        }

        if let Some(path) = &self.logo {
            studio.load_logo(path).await?;
        } else if let Some(url) = &self.logo_url {
            studio.set_logo(LogoSource::parse(url.clone()));
        }
        if let Some(shape) = self.logo_shape {
            studio.set_logo_shape(shape);
        }
        if let Some(size) = self.logo_size {
            studio.set_logo_size(size);
        }
        Ok(())
    }
}

async fn read_profile(path: &Path) -> Result<StudioProfile, CliError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::ReadProfile {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(StudioProfile::from_json(&json)?)
}
