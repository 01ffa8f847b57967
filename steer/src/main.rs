use crate::cli::SubCommand;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Debug, Parser)]
#[command(name = "steer", about = "Declarative proxy policy for a proxy settings stack")]
struct ProgramArgs {
    /// Path of the policy directory. Default to $HOME/.config/steer
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Path of application data. Default to $HOME/.local/share/steer
    #[arg(short = 'd', long = "data")]
    pub app_data: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: SubCommand,
}

fn main() -> ExitCode {
    let args: ProgramArgs = ProgramArgs::parse();
    if let Err(e) = steer::external::init_tracing(args.verbose) {
        eprintln!("{}", e);
    }
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match rt.block_on(cli::controller_main(args)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error occurred: {}", err);
            ExitCode::FAILURE
        }
    }
}
