use std::path::PathBuf;

use clap::{Parser, Subcommand};

use pgmmr_cli::commands::{config_ops, decode_ops, gate_ops};
use pgmmr_cli::trace_init::init_tracing;

#[derive(Parser)]
#[command(name = "beamtool", about = "Beam-search decoding diagnostics")]
struct Cli {
    /// Write JSON-lines traces to this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a JSON fixture with its bigram table
    Decode {
        /// Path to the fixture file
        fixture: String,
        /// Settings TOML (defaults to the built-in settings)
        #[arg(long)]
        config: Option<String>,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
        /// Include the per-sentence MMR trace of the best summary
        #[arg(long)]
        trace: bool,
    },
    /// Apply top-k muting to a list of sentence scores
    Gate {
        /// Per-sentence scores
        #[arg(required = true, allow_negative_numbers = true)]
        scores: Vec<f32>,
        /// Sentences to keep; -1 keeps all
        #[arg(short, long, allow_negative_numbers = true)]
        k: i64,
        /// Keep score magnitudes instead of a 0/1 mask
        #[arg(long)]
        retain: bool,
    },
    /// Print the default settings TOML
    SettingsExport,
    /// Validate a settings TOML file
    SettingsValidate {
        /// Path to the settings file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref());

    match cli.command {
        Command::Decode {
            fixture,
            config,
            json,
            trace,
        } => decode_ops::decode_cmd(&fixture, config.as_deref(), json, trace),
        Command::Gate { scores, k, retain } => gate_ops::gate_cmd(&scores, k, retain),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
