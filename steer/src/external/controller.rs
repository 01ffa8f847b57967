use crate::config::{Policy, ProxyMode};
use crate::external::{ObservedState, ProxyStack, StackError};
use crate::script::{generate, ScriptError};
use arc_swap::ArcSwap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use steerapi::{PacScriptSchema, ProxyRulesSchema, ProxyServerSchema, ProxySettingsSchema};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
    #[error("Stack error: {0}")]
    Stack(#[from] StackError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Fixed-server mode names a proxy that does not exist.
    UnresolvedFixedProxy(Option<String>),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnresolvedFixedProxy(Some(name)) => {
                write!(f, "fixed proxy \"{}\" does not exist", name)
            }
            SkipReason::UnresolvedFixedProxy(None) => f.write_str("no fixed proxy selected"),
        }
    }
}

/// What applying a policy does to the external stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Set(ProxySettingsSchema),
    Cleared,
    Skipped(SkipReason),
}

/// The request `policy` translates to, without sending it.
pub fn plan(policy: &Policy) -> Result<ApplyOutcome, ScriptError> {
    let mode = policy.mode.as_str();
    Ok(match policy.mode {
        ProxyMode::Direct | ProxyMode::AutoDetect | ProxyMode::System => {
            ApplyOutcome::Set(ProxySettingsSchema::mode_only(mode))
        }
        ProxyMode::PacScript => ApplyOutcome::Set(ProxySettingsSchema {
            mode: mode.to_string(),
            pac_script: Some(PacScriptSchema {
                data: generate(policy)?,
            }),
            rules: None,
        }),
        ProxyMode::FixedServers => match policy.fixed_proxy() {
            Some(proxy) => {
                let mut server = ProxyServerSchema::from(&proxy.server);
                server.port = proxy.server.effective_port();
                ApplyOutcome::Set(ProxySettingsSchema {
                    mode: mode.to_string(),
                    pac_script: None,
                    rules: Some(ProxyRulesSchema {
                        single_proxy: Some(server),
                    }),
                })
            }
            None => ApplyOutcome::Skipped(SkipReason::UnresolvedFixedProxy(
                policy.fixed_proxy_name.clone(),
            )),
        },
        ProxyMode::Unmanaged => ApplyOutcome::Cleared,
    })
}

/// Pushes policies to the external stack and caches what it reports back.
pub struct ProxyController {
    stack: Arc<dyn ProxyStack>,
    observed: ArcSwap<ObservedState>,
}

impl ProxyController {
    pub fn new(stack: Arc<dyn ProxyStack>) -> Self {
        Self {
            stack,
            observed: ArcSwap::new(Arc::new(ObservedState::default())),
        }
    }

    pub fn observed(&self) -> Arc<ObservedState> {
        self.observed.load_full()
    }

    /// Re-read the stack and replace the cached observation.
    pub async fn observe(&self) -> Result<Arc<ObservedState>, StackError> {
        let settings = self.stack.get().await?;
        let observed = Arc::new(ObservedState::from_schema(&settings));
        tracing::debug!("Observed proxy mode {}", observed.mode);
        self.observed.store(observed.clone());
        Ok(observed)
    }

    pub async fn apply(&self, policy: &Policy) -> Result<ApplyOutcome, ControllerError> {
        let outcome = plan(policy)?;
        match &outcome {
            ApplyOutcome::Set(settings) => {
                self.stack.set(settings.clone()).await?;
                tracing::info!("Applied proxy mode {}", policy.mode);
            }
            ApplyOutcome::Cleared => {
                self.stack.clear().await?;
                tracing::info!("Cleared proxy settings");
            }
            ApplyOutcome::Skipped(reason) => {
                tracing::warn!("Not applying {}: {}", policy.mode, reason);
                return Ok(outcome);
            }
        }
        self.observe().await?;
        Ok(outcome)
    }

    pub async fn clear(&self) -> Result<(), ControllerError> {
        self.stack.clear().await?;
        tracing::info!("Cleared proxy settings");
        self.observe().await?;
        Ok(())
    }
}
