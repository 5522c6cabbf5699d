//! Command-line front end.
//!
//! `qsrunner` fills a configuration from `.qsrunner/config.toml` and flags,
//! then previews, runs, or serves it.

use crate::serve;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use colored::Colorize;
use qs_core::config::loader::load_settings;
use qs_core::invocation::tool::ToolLocator;
use qs_core::invocation::{InvocationController, InvocationError};
use qs_protocol::config_models::{Configuration, PaperSize, Toggle, ToolKind, Track};
use qs_protocol::ipc::Event;
use qs_protocol::process_models::{LogStream, RunOutcome};
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(
    name = "qsrunner",
    version,
    about = "Configure and run the agent-orange cuesheet generator"
)]
pub struct Cli {
    /// Directory holding the `.qsrunner/` settings folder
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Path to the cuesheet tool (overrides settings and $QSRUNNER_TOOL)
    #[arg(long, global = true, value_name = "PATH")]
    pub tool: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the tool once and wait for it to finish
    Run(FormArgs),

    /// Print the command line a run would use
    Preview {
        #[command(flatten)]
        form: FormArgs,

        /// Print the command as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Drive runs over JSON lines: operations on stdin, events on stdout
    Serve,
}

/// Form fields. Anything left out keeps the value from settings.
#[derive(Debug, Args, Clone, Default)]
pub struct FormArgs {
    /// Session text export to read
    pub input: Option<PathBuf>,

    /// Output file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Title printed on top
    #[arg(short, long)]
    pub title: Option<String>,

    /// Paper size (LETTER, LEGAL, TABLOID)
    #[arg(short, long)]
    pub paper: Option<PaperSize>,

    /// Produce plain text instead of PDF
    #[arg(long)]
    pub text: bool,

    /// Track to include; repeat for more
    #[arg(long = "track", value_name = "ID=LABEL")]
    pub tracks: Vec<Track>,

    /// Shading strategy index (0 all regions, 1 regions named `*...`, 2 none)
    #[arg(long, value_name = "INDEX")]
    pub shade: Option<usize>,

    /// Renumber channels starting from this label
    #[arg(long, value_name = "LABEL")]
    pub renumber_from: Option<String>,

    /// Strips per page
    #[arg(short, long)]
    pub strips: Option<f64>,

    /// Blend duration in seconds
    #[arg(short, long)]
    pub blend: Option<f64>,

    /// Interpret region-name tagging (blends, cues)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub interpret_tags: Option<bool>,

    /// Print times with frames
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub frames: Option<bool>,

    /// Open the output file when the run succeeds
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub open: Option<bool>,

    /// Print channel numbers next to track names
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub channel_numbers: Option<bool>,

    /// Add spaces to camelized region names
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub decamelize: Option<bool>,

    /// Print muted regions
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub muted_regions: Option<bool>,
}

impl FormArgs {
    /// Overlay the given flags onto `config`.
    pub fn apply(&self, mut config: Configuration) -> Configuration {
        if let Some(input) = &self.input {
            config.set_input_path(input);
        }
        if let Some(output) = &self.output {
            config.set_output_path(output);
        }
        if let Some(title) = &self.title {
            config.set_title(title);
        }
        if let Some(paper) = self.paper {
            config.set_paper_size(paper);
        }
        if self.text {
            config.set_tool_kind(ToolKind::Text);
        }
        if !self.tracks.is_empty() {
            config.clear_tracks();
            for track in &self.tracks {
                config.push_track(track.clone());
            }
        }
        if let Some(index) = self.shade {
            config.set_shade_option_index(index);
        }
        if let Some(label) = &self.renumber_from {
            config.set_first_channel_number(label);
        }
        if let Some(strips) = self.strips {
            config.set_strips_per_page(strips);
        }
        if let Some(blend) = self.blend {
            config.set_blend_duration(blend);
        }

        let toggles = [
            (Toggle::InterpretTags, self.interpret_tags),
            (Toggle::PrintFrames, self.frames),
            (Toggle::OpenWhenFinished, self.open),
            (Toggle::PrintChannelNumbers, self.channel_numbers),
            (Toggle::DecamelizeRegionNames, self.decamelize),
            (Toggle::PrintMutedRegions, self.muted_regions),
        ];
        for (toggle, value) in toggles {
            if let Some(on) = value {
                config.set_toggle(toggle, on);
            }
        }

        config
    }
}

pub async fn run(cli: Cli) -> color_eyre::Result<()> {
    let settings = load_settings(&cli.root)
        .await
        .wrap_err("Failed to load settings")?;

    let mut locator = ToolLocator::from_settings(&settings.tool);
    if let Some(tool) = &cli.tool {
        locator = locator.with_path(tool);
    }

    match cli.command {
        Command::Run(form) => {
            let config = form.apply(settings.defaults);
            run_once(locator, config).await
        }
        Command::Preview { form, json } => {
            let config = form.apply(settings.defaults);
            preview(locator, &config, json)
        }
        Command::Serve => serve::serve(locator, settings.defaults)
            .await
            .map_err(|e| eyre!(e)),
    }
}

fn preview(locator: ToolLocator, config: &Configuration, json: bool) -> color_eyre::Result<()> {
    let (tx, _rx) = mpsc::unbounded_channel();
    let controller = InvocationController::new(locator, tx);
    let command = controller.preview(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&command)?);
    } else {
        let line: Vec<String> = command.iter().map(|arg| shell_quote(arg)).collect();
        println!("{}", line.join(" "));
    }
    Ok(())
}

async fn run_once(locator: ToolLocator, config: Configuration) -> color_eyre::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let controller = InvocationController::new(locator, tx);

    controller.start(&config).await?;

    let canceller = controller.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = canceller.cancel().await;
        }
    });

    while let Some(event) = rx.recv().await {
        match event {
            Event::RunStarted { command, .. } => {
                eprintln!("{} {}", "Running".cyan().bold(), command.join(" "));
            }
            Event::RunLog { stream, line, .. } => match stream {
                LogStream::Stdout => eprintln!("  {}", line.dimmed()),
                LogStream::Stderr => eprintln!("  {}", line.yellow()),
            },
            Event::StatusChanged { message, .. } => {
                tracing::debug!("Status: {message}");
            }
            Event::OpenFile { path } => {
                if let Err(e) = open::that_detached(&path) {
                    tracing::warn!("Failed to open {}: {e}", path.display());
                }
            }
            Event::RunFinished { outcome, .. } => {
                return match outcome {
                    RunOutcome::Succeeded => {
                        eprintln!("{}", "Finished successfully".green().bold());
                        Ok(())
                    }
                    RunOutcome::Cancelled => {
                        eprintln!("{}", "Cancelled".yellow().bold());
                        Err(eyre!("run cancelled"))
                    }
                    RunOutcome::Failed { exit_code } => {
                        Err(InvocationError::NonZeroExit { exit_code }.into())
                    }
                };
            }
            _ => {}
        }
    }

    Err(eyre!("event channel closed before the run finished"))
}

/// Quote `arg` for display in a POSIX shell.
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
