//! hpcsub command-line interface
//!
//! Renders Torque/PBS or LSF submission scripts for Python code, Python
//! scripts or plain shell commands and submits them with `qsub`/`bsub`.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::{JobArgs, RenderArgs};
use commands::submit::JobPayload;
use commands::{render, submit, version};

/// hpcsub - batch submission scripts for Torque/PBS and LSF
#[derive(Parser)]
#[command(name = "hpcsub")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Batch scheduler platform (torque, lsf)
    #[arg(long, global = true, env = "HPCSUB_PLATFORM", default_value = "torque")]
    platform: String,

    /// Program the submission script is piped into (default: qsub or bsub)
    #[arg(long, global = true, env = "HPCSUB_SUBMIT_PROGRAM")]
    submit_program: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit inline Python code
    Code {
        /// Python source to run
        code: String,

        /// Arguments passed to the script
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        args: String,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Submit an existing Python script
    Script {
        /// Path of the script to copy into the job directory
        path: PathBuf,

        /// Arguments passed to the script
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        args: String,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Submit a raw shell command
    Command {
        /// Shell command line the job runs
        command: String,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Print the submission script without writing or submitting anything
    Render {
        /// Shell command line the job would run
        #[arg(long, default_value = "true")]
        command: String,

        #[command(flatten)]
        args: RenderArgs,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let platform = cli.platform.as_str();
    let submit_program = cli.submit_program.as_deref();

    // Execute command
    let result = match cli.command {
        Commands::Code { code, args, job } => {
            submit::execute(
                JobPayload::Code {
                    code: &code,
                    args: &args,
                },
                &job,
                platform,
                submit_program,
            )
            .await
        }

        Commands::Script { path, args, job } => {
            submit::execute(
                JobPayload::Script {
                    path: &path,
                    args: &args,
                },
                &job,
                platform,
                submit_program,
            )
            .await
        }

        Commands::Command { command, job } => {
            submit::execute(
                JobPayload::Command(&command),
                &job,
                platform,
                submit_program,
            )
            .await
        }

        Commands::Render { command, args } => render::execute(&command, &args, platform),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
