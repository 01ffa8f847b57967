mod command;

use crate::ProgramArgs;
use clap::{Args, Subcommand, ValueHint};
use steer::config::SteerPaths;

#[derive(Debug, Args)]
pub(crate) struct DecideOptions {
    #[clap(value_hint = ValueHint::Url)]
    pub url: String,
    /// Host to match against; derived from the URL when omitted
    #[arg(long)]
    pub host: Option<String>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum SubCommand {
    /// Create the policy file and the data directory
    Init,
    /// Show how a URL is routed under the saved policy
    Decide(DecideOptions),
    /// Print the PAC script generated from the saved policy
    Pac,
    /// Apply the saved policy to the proxy stack
    Apply,
    /// Remove our settings from the proxy stack
    Clear,
    /// Show declared and observed state
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Change the declared mode, save and apply
    Mode {
        #[clap(value_hint = ValueHint::Other)]
        mode: String,
        /// Proxy name for fixed_servers
        #[clap(value_hint = ValueHint::Other)]
        fixed: Option<String>,
    },
    /// Check the saved policy for errors
    Validate,
}

pub(crate) async fn controller_main(args: ProgramArgs) -> anyhow::Result<()> {
    let paths = SteerPaths::resolve(args.config, args.app_data)?;
    if let SubCommand::Init = args.cmd {
        return init(&paths).await;
    }
    if !paths.policy_file().try_exists().is_ok_and(|x| x) {
        tracing::info!(
            "No policy file under {}; using defaults",
            paths.config_dir.display()
        );
    }
    let commander = command::Commander::new(&paths);
    match args.cmd {
        SubCommand::Init => unreachable!(),
        SubCommand::Decide(opt) => commander.decide(opt.url, opt.host).await,
        SubCommand::Pac => commander.pac().await,
        SubCommand::Apply => commander.apply().await,
        SubCommand::Clear => commander.clear().await,
        SubCommand::Status { json } => commander.status(json).await,
        SubCommand::Mode { mode, fixed } => commander.set_mode(mode, fixed).await,
        SubCommand::Validate => commander.validate().await,
    }
}

async fn init(paths: &SteerPaths) -> anyhow::Result<()> {
    let created = paths.init().await?;
    if created.is_empty() {
        println!("Nothing to create under {}", paths.config_dir.display());
    }
    for path in created {
        println!("Successfully created {}", path.display());
    }
    Ok(())
}
