//! Filestream workspace tasks
//!
//! Run with: cargo xtask <command>

use clap::{Parser, Subcommand, ValueEnum};
use std::process::Command;

const CLIPPY: &[&str] = &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"];
const TESTS: &[&str] = &["test", "--workspace"];

#[derive(Parser)]
#[command(name = "xtask", about = "Filestream workspace tasks")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Run unit and end-to-end tests
    Test {
        /// Only run the end-to-end suite in `tests/`
        #[arg(long)]
        e2e: bool,
    },

    /// Run clippy with warnings denied
    Lint,

    /// Check formatting, or rewrite files with `--fix`
    Fmt {
        #[arg(long)]
        fix: bool,
    },

    /// Formatting, lints and tests, stopping at the first failure
    Ci,

    /// Run the criterion benches
    Bench,

    /// Run one fuzz target under cargo-fuzz (nightly)
    Fuzz {
        #[arg(value_enum)]
        target: FuzzTarget,

        /// Time limit in seconds
        #[arg(long, default_value_t = 60)]
        seconds: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FuzzTarget {
    FrameParser,
    MessageDecode,
    ConfigParse,
    RequestArgs,
}

impl FuzzTarget {
    fn bin_name(self) -> &'static str {
        match self {
            FuzzTarget::FrameParser => "fuzz_frame_parser",
            FuzzTarget::MessageDecode => "fuzz_message_decode",
            FuzzTarget::ConfigParse => "fuzz_config_parse",
            FuzzTarget::RequestArgs => "fuzz_request_args",
        }
    }
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Task::Test { e2e: false } => cargo(TESTS),
        Task::Test { e2e: true } => cargo(&["test", "-p", "filestream-integration-tests"]),
        Task::Lint => cargo(CLIPPY),
        Task::Fmt { fix } => {
            if fix {
                cargo(&["fmt", "--all"])
            } else {
                cargo(&["fmt", "--all", "--check"])
            }
        }
        Task::Ci => {
            for step in [&["fmt", "--all", "--check"][..], CLIPPY, TESTS] {
                cargo(step)?;
            }
            println!("ci: all checks passed");
            Ok(())
        }
        Task::Bench => cargo(&["bench", "--workspace"]),
        Task::Fuzz { target, seconds } => {
            let limit = format!("-max_total_time={seconds}");
            cargo(&["+nightly", "fuzz", "run", target.bin_name(), "--", &limit])
        }
    }
}

fn cargo(args: &[&str]) -> anyhow::Result<()> {
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {} failed ({status})", args.join(" "));
    }
    Ok(())
}
