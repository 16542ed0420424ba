// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::{Emoji, Term};
use indicatif::{ProgressBar, ProgressStyle};

use plsync::{
    Ffmpeg, NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter, SyncConfig,
    ToolPaths, YtDlp, sync_playlist,
};

// Emoji with fallback for terminals without Unicode support
static NOTES: Emoji<'_, '_> = Emoji("🎶 ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static CONVERT: Emoji<'_, '_> = Emoji("🔄 ", "[>] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[?] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Materialize a remote playlist as a tagged local bundle
#[derive(Parser, Debug)]
#[command(name = "plsync")]
#[command(about = "Materialize a remote playlist as a tagged, re-syncable local bundle")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to the yt-dlp executable
    #[arg(long, env = "PLSYNC_YT_DLP", global = true)]
    yt_dlp: Option<PathBuf>,

    /// Path to the ffmpeg executable
    #[arg(long, env = "PLSYNC_FFMPEG", global = true)]
    ffmpeg: Option<PathBuf>,

    /// Show the output of the fetch tool
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new bundle from a playlist
    Create {
        /// Directory the bundle is created in (prompted when omitted)
        root: Option<PathBuf>,

        /// Playlist URL (prompted when omitted)
        reference: Option<String>,
    },

    /// Add missing playlist items to an existing bundle
    Append {
        /// Bundle directory holding `tracks/` (prompted when omitted)
        bundle: Option<PathBuf>,

        /// Playlist URL (prompted when omitted)
        reference: Option<String>,
    },
}

/// Ask on the terminal until a non-blank answer is given
fn prompt(term: &Term, question: &str) -> Result<String> {
    loop {
        term.write_line(question)?;
        let answer = term.read_line().context("Failed to read from terminal")?;
        let answer = answer.trim();

        if !answer.is_empty() {
            return Ok(answer.to_string());
        }

        term.write_line(&format!("{}", "Please enter a value.".yellow()))?;
    }
}

fn resolve_config(command: Command) -> Result<SyncConfig> {
    let term = Term::stdout();

    let config = match command {
        Command::Create { root, reference } => {
            let root = match root {
                Some(root) => root,
                None => PathBuf::from(prompt(&term, "Provide the root directory for the bundle:")?),
            };
            let reference = match reference {
                Some(reference) => reference,
                None => prompt(&term, "Provide a playlist URL:")?,
            };
            SyncConfig::create(root, reference)
        }
        Command::Append { bundle, reference } => {
            let bundle = match bundle {
                Some(bundle) => bundle,
                None => PathBuf::from(prompt(
                    &term,
                    "Provide the bundle directory (it holds the playlist and a 'tracks' folder):",
                )?),
            };
            let reference = match reference {
                Some(reference) => reference,
                None => prompt(&term, "Provide a playlist URL:")?,
            };
            SyncConfig::append(bundle, reference)
        }
    };

    Ok(config)
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .unwrap();

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self { bar }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::ScanningBundle { tracks_dir } => {
                self.bar.set_message(format!(
                    "{SEARCH}Scanning {}",
                    tracks_dir.display().to_string().cyan()
                ));
            }

            ProgressEvent::ExistingTracksFound { count } => {
                self.bar.println(format!(
                    "{SEARCH}{} tracks already in the bundle",
                    count.to_string().cyan()
                ));
            }

            ProgressEvent::Fetching {
                reference,
                excluded,
            } => {
                self.bar.set_message(format!(
                    "{DOWNLOAD}Fetching {} ({} excluded)",
                    reference.cyan(),
                    excluded.to_string().yellow()
                ));
            }

            ProgressEvent::Fetched {
                audio_items,
                sidecar_items,
            } => {
                self.bar.println(format!(
                    "{DOWNLOAD}Fetched {} audio items, {} descriptions",
                    audio_items.to_string().cyan(),
                    sidecar_items.to_string().cyan()
                ));
            }

            ProgressEvent::CollectionResolved { name, token } => {
                self.bar.println(format!(
                    "{NOTES}{} {}",
                    name.bold().green(),
                    format!("[{token}]").dimmed()
                ));
            }

            ProgressEvent::CollectionSidecarMissing { token } => {
                self.bar.println(format!(
                    "{WARNING}{}",
                    format!("No playlist description for {token}, using default name").yellow()
                ));
            }

            ProgressEvent::ItemSidecarMissing { title, token } => {
                self.bar.println(format!(
                    "{WARNING}{} {}",
                    format!("No description for \"{title}\"").yellow(),
                    format!("[{token}]").dimmed()
                ));
            }

            ProgressEvent::ItemSkipped { filename, reason } => {
                self.bar.println(format!(
                    "{FAILURE}{} - {}",
                    filename.red(),
                    reason.dimmed()
                ));
            }

            ProgressEvent::ConversionStarting { title, index, total } => {
                self.bar.set_message(format!(
                    "{CONVERT}[{}/{}] {}",
                    (index + 1).to_string().cyan(),
                    total.to_string().cyan(),
                    truncate_title(&title, 50)
                ));
            }

            ProgressEvent::ConversionCompleted { title, bytes } => {
                self.bar.println(format!(
                    "  {SUCCESS}{} {}",
                    truncate_title(&title, 50).green(),
                    format!("({} KB)", bytes / 1000).dimmed()
                ));
            }

            ProgressEvent::ConversionFailed { title, error }
            | ProgressEvent::TaggingFailed { title, error } => {
                self.bar.println(format!(
                    "  {FAILURE}{} - {}",
                    truncate_title(&title, 40).red(),
                    error.red()
                ));
            }

            ProgressEvent::SourceCleanupFailed { title, error } => {
                self.bar.println(format!(
                    "  {WARNING}{} - {}",
                    truncate_title(&title, 40).yellow(),
                    error.dimmed()
                ));
            }

            ProgressEvent::BundleWritten {
                bundle_dir,
                track_count,
            } => {
                self.bar.set_message(format!(
                    "{FOLDER}Wrote {} with {} tracks",
                    bundle_dir.display().to_string().cyan(),
                    track_count
                ));
            }

            ProgressEvent::SyncCompleted {
                added_count,
                existing_count,
                failed_count,
            } => {
                self.bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} added, {} already present, {} failed",
                    "Sync complete:".bold().green(),
                    added_count.to_string().green().bold(),
                    existing_count.to_string().yellow(),
                    if failed_count > 0 {
                        failed_count.to_string().red().bold()
                    } else {
                        failed_count.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let defaults = ToolPaths::default();
    let tools = ToolPaths {
        yt_dlp: args.yt_dlp.unwrap_or(defaults.yt_dlp),
        ffmpeg: args.ffmpeg.unwrap_or(defaults.ffmpeg),
    };

    let config = resolve_config(args.command)?;

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            NOTES,
            "plsync".bold().magenta(),
            "- Playlist Bundler".dimmed()
        );
    }

    let fetcher = YtDlp::new(tools.yt_dlp).with_output(args.verbose);
    let transcoder = Ffmpeg::new(tools.ffmpeg);

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    };

    let result = sync_playlist(&fetcher, &transcoder, &config, reporter)
        .await
        .context("Failed to sync playlist")?;

    if !args.quiet && !result.failed_items.is_empty() {
        println!("\n{}", "Failed items:".red().bold());
        for (title, error) in &result.failed_items {
            println!("  {}{} - {}", CROSS, title.yellow(), error.dimmed());
        }
    }

    if !args.quiet {
        println!(
            "\n{FOLDER}Bundle: {}\n",
            result.bundle_dir.display().to_string().cyan()
        );
    }

    if result.failed > 0 && result.added == 0 {
        std::process::exit(1);
    }

    Ok(())
}
