//! CLI entrypoint for guardstack demonstrations.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use guardstack_core::{HardenedStack, IntegrityPolicy};
use guardstack_diag::{Diagnostics, LogConfig};
use guardstack_harness::{Corruption, DemoOptions, growth_trace, run_demo};

/// Hardened stack demonstrations.
#[derive(Debug, Parser)]
#[command(name = "guardstack")]
#[command(about = "Exercise the hardened stack and its diagnostic log")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Push integers, corrupt the stack, pop them back while logging.
    Demo {
        /// Number of integers to push.
        #[arg(long, default_value_t = 10)]
        count: i32,
        /// Damage to apply: `checksum`, `control-guard`, `buffer-guard`, `padding`, `none`.
        #[arg(long, default_value = "checksum")]
        corrupt: String,
        /// Integrity policy: `report` or `reject`.
        #[arg(long, default_value = "report")]
        integrity: String,
        /// Append-mode log file (overrides GUARDSTACK_LOG_FILE).
        #[arg(long)]
        log_file: Option<PathBuf>,
        /// JSONL mirror of the log (overrides GUARDSTACK_LOG_JSONL).
        #[arg(long)]
        jsonl: Option<PathBuf>,
        /// Do not mirror the log to stdout.
        #[arg(long)]
        no_stdout: bool,
        /// Print the scenario outcome as JSON after the run.
        #[arg(long)]
        json: bool,
    },
    /// Print capacity transitions while filling and draining a stack.
    Growth {
        /// Number of elements pushed and then popped.
        #[arg(long, default_value_t = 1100)]
        pushes: usize,
        /// Element size in bytes.
        #[arg(long, default_value_t = 4)]
        element_size: usize,
        /// Emit JSON lines instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Build a stack, apply one corruption and print the inspection report.
    Inspect {
        /// Elements to push before corrupting.
        #[arg(long, default_value_t = 5)]
        count: u32,
        /// Damage to apply (see `demo`).
        #[arg(long, default_value = "padding")]
        corrupt: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Demo {
            count,
            corrupt,
            integrity,
            log_file,
            jsonl,
            no_stdout,
            json,
        } => {
            let mut config = LogConfig::from_env().with_stdout(!no_stdout);
            if let Some(path) = log_file {
                config = config.with_file(path);
            }
            if let Some(path) = jsonl {
                config = config.with_jsonl(path);
            }
            let diagnostics = Diagnostics::from_config(&config)?;
            let options = DemoOptions {
                count,
                corruption: Corruption::from_str_loose(&corrupt)?,
                integrity: IntegrityPolicy::from_str_loose(&integrity),
            };

            diagnostics.start();
            let outcome = run_demo(&options, &diagnostics, &mut out);
            diagnostics.stop();
            let outcome = outcome?;

            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&outcome)?)?;
            }
        }
        Command::Growth {
            pushes,
            element_size,
            json,
        } => {
            let steps = growth_trace(element_size, pushes)?;
            if json {
                for step in &steps {
                    writeln!(out, "{}", serde_json::to_string(step)?)?;
                }
            } else {
                writeln!(out, "{:<6} {:>8} {:>10}", "phase", "size", "capacity")?;
                for step in &steps {
                    let phase = match step.phase {
                        guardstack_harness::Phase::Fill => "fill",
                        guardstack_harness::Phase::Drain => "drain",
                    };
                    writeln!(out, "{phase:<6} {:>8} {:>10}", step.size, step.capacity)?;
                }
            }
        }
        Command::Inspect { count, corrupt } => {
            let corruption = Corruption::from_str_loose(&corrupt)?;
            let mut stack = HardenedStack::construct("inspected", 4)?;
            for i in 0..count {
                stack.push(&i.to_le_bytes())?;
            }
            if !corruption.apply(&mut stack) {
                eprintln!("{corrupt}: nothing to corrupt at size {count}");
            }
            let report = stack.inspect()?;
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
    }
    Ok(())
}
