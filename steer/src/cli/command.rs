use anyhow::{anyhow, Result};
use colored::Colorize;
use std::sync::Arc;
use steer::config::{load_policy, FileStore, Policy, ProxyMode, SteerPaths};
use steer::context::Context;
use steer::dispatch::{Dispatching, RequestInfo};
use steer::drift::{BadgeColor, StatusSummary};
use steer::external::{ApplyOutcome, FileStack};
use steer::script::{decision_directive, generate};

pub struct Commander {
    store: Arc<FileStore>,
    stack: Arc<FileStack>,
}

impl Commander {
    pub fn new(paths: &SteerPaths) -> Self {
        Self {
            store: Arc::new(FileStore::new(paths.policy_file())),
            stack: Arc::new(FileStack::new(paths.settings_file())),
        }
    }

    async fn policy(&self) -> Result<Policy> {
        Ok(load_policy(self.store.as_ref()).await?)
    }

    async fn context(&self) -> Result<Context> {
        Ok(Context::load(self.store.clone(), self.stack.clone()).await?)
    }

    pub async fn decide(&self, url: String, host: Option<String>) -> Result<()> {
        let policy = self.policy().await?;
        let info = match host {
            Some(host) => RequestInfo::new(url, host),
            None => RequestInfo::from_url(&url),
        };
        let decision = Dispatching::new(&policy).matches(&info, true);
        println!(
            "{} => {}",
            info.url,
            decision_directive(&policy, &decision).bold().green()
        );
        Ok(())
    }

    pub async fn pac(&self) -> Result<()> {
        print!("{}", generate(&self.policy().await?)?);
        Ok(())
    }

    pub async fn apply(&self) -> Result<()> {
        let ctx = self.context().await?;
        print_outcome(&ctx.apply().await?)?;
        print_status(&ctx.status());
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        let ctx = self.context().await?;
        ctx.clear().await?;
        println!("{}", "Cleared".green());
        Ok(())
    }

    pub async fn status(&self, json: bool) -> Result<()> {
        let status = self.context().await?.status();
        if json {
            println!("{}", serde_json::to_string_pretty(&status.to_schema())?);
        } else {
            print_status(&status);
        }
        Ok(())
    }

    pub async fn set_mode(&self, mode: String, fixed: Option<String>) -> Result<()> {
        let mode: ProxyMode = mode.parse().map_err(|_| {
            let known: Vec<_> = ProxyMode::ALL.iter().map(|m| m.as_str()).collect();
            anyhow!("Unknown mode {}; expected one of {}", mode, known.join(", "))
        })?;
        let ctx = self.context().await?;
        let mut staging = ctx.staging();
        staging.set_mode(mode, fixed.as_deref());
        print_outcome(&ctx.save(staging).await?)?;
        print_status(&ctx.status());
        Ok(())
    }

    pub async fn validate(&self) -> Result<()> {
        let policy = self.policy().await?;
        match policy.validate() {
            Ok(()) => {
                println!("{}", "Policy is valid".green());
                Ok(())
            }
            Err(errors) => {
                for issue in errors.issues() {
                    println!("{} {}", "-".red(), issue);
                }
                Err(anyhow!("{} issue(s) found", errors.issues().len()))
            }
        }
    }
}

fn print_outcome(outcome: &ApplyOutcome) -> Result<()> {
    match outcome {
        ApplyOutcome::Set(settings) => {
            println!("{} {}", "Applied".green(), settings.mode.bold());
            Ok(())
        }
        ApplyOutcome::Cleared => {
            println!("{}", "Cleared".green());
            Ok(())
        }
        ApplyOutcome::Skipped(reason) => {
            println!("{}", "Skipped".yellow());
            Err(anyhow!("Not applied: {}", reason))
        }
    }
}

fn print_status(status: &StatusSummary) {
    let badge = match status.badge_color {
        Some(BadgeColor::Navy) => status.badge_text.blue(),
        Some(BadgeColor::Green) => status.badge_text.green(),
        Some(BadgeColor::Gray) => status.badge_text.dimmed(),
        Some(BadgeColor::Maroon) => status.badge_text.red(),
        None => status.badge_text.normal(),
    };
    println!("{}: {}", "declared".bold(), status.declared_mode);
    println!("{}: {}", "observed".bold(), status.observed_mode);
    if let Some(proxy) = &status.fixed_proxy {
        println!("{}: {}", "proxy".bold(), proxy);
    }
    println!("{}: [{}]", "badge".bold(), badge);
    if status.management_drift {
        println!("{}", "Observed mode differs from the declared mode".yellow());
    }
    if status.fixed_foreign {
        println!("{}", "Fixed server is not one of the configured proxies".red());
    }
    if status.pac_foreign {
        println!("{}", "PAC script was not generated by steer".red());
    }
}
