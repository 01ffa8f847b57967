use crate::config::{Policy, ProxyConfig, ProxyMode};
use crate::external::ObservedState;
use crate::script::SCRIPT_SENTINEL;
use std::fmt::{Display, Formatter};
use steerapi::StatusSchema;

/// Whether `proxy` is the one the stack reports in fixed-server mode.
pub fn is_fixed_enabled(proxy: &ProxyConfig, observed: &ObservedState) -> bool {
    observed.mode == ProxyMode::FixedServers
        && observed
            .single_proxy
            .as_ref()
            .is_some_and(|server| proxy.server.is_equivalent(server))
}

/// First configured proxy equivalent to the observed single proxy.
pub fn enabled_fixed_proxy<'a>(
    policy: &'a Policy,
    observed: &ObservedState,
) -> Option<&'a ProxyConfig> {
    policy
        .proxies
        .iter()
        .find(|proxy| is_fixed_enabled(proxy, observed))
}

/// The stack runs a fixed server none of our proxies describe.
pub fn is_fixed_foreign(policy: &Policy, observed: &ObservedState) -> bool {
    observed.mode == ProxyMode::FixedServers && enabled_fixed_proxy(policy, observed).is_none()
}

/// The stack runs a PAC script we did not generate.
pub fn is_pac_foreign(observed: &ObservedState) -> bool {
    observed.mode == ProxyMode::PacScript
        && !observed
            .pac_script
            .as_deref()
            .is_some_and(|script| script.contains(SCRIPT_SENTINEL))
}

pub fn is_foreign(policy: &Policy, observed: &ObservedState) -> bool {
    is_fixed_foreign(policy, observed) || is_pac_foreign(observed)
}

/// Declared and observed modes differ.
pub fn is_management_drift(policy: &Policy, observed: &ObservedState) -> bool {
    policy.mode != observed.mode
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Navy,
    Green,
    Gray,
    Maroon,
}

impl BadgeColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeColor::Navy => "navy",
            BadgeColor::Green => "green",
            BadgeColor::Gray => "gray",
            BadgeColor::Maroon => "maroon",
        }
    }
}

impl Display for BadgeColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    pub declared_mode: ProxyMode,
    pub observed_mode: ProxyMode,
    pub fixed_foreign: bool,
    pub pac_foreign: bool,
    pub management_drift: bool,
    pub badge_text: String,
    pub badge_color: Option<BadgeColor>,
    pub fixed_proxy: Option<String>,
}

impl StatusSummary {
    pub fn compute(policy: &Policy, observed: &ObservedState) -> Self {
        let fixed_proxy = enabled_fixed_proxy(policy, observed);
        let fixed_foreign = is_fixed_foreign(policy, observed);
        let pac_foreign = is_pac_foreign(observed);
        let management_drift = is_management_drift(policy, observed);
        let (badge_text, badge_color) = match observed.mode {
            ProxyMode::AutoDetect => ("auto".to_string(), Some(BadgeColor::Navy)),
            ProxyMode::PacScript => ("auto".to_string(), Some(BadgeColor::Green)),
            ProxyMode::FixedServers => {
                let text = match fixed_proxy {
                    Some(proxy) if !proxy.badge_text.is_empty() => proxy.badge_text.clone(),
                    _ => "*".to_string(),
                };
                (text, Some(BadgeColor::Green))
            }
            ProxyMode::System => ("sys".to_string(), Some(BadgeColor::Gray)),
            ProxyMode::Direct | ProxyMode::Unmanaged => (String::new(), None),
        };
        let badge_color = if management_drift || fixed_foreign || pac_foreign {
            Some(BadgeColor::Maroon)
        } else {
            badge_color
        };
        Self {
            declared_mode: policy.mode,
            observed_mode: observed.mode,
            fixed_foreign,
            pac_foreign,
            management_drift,
            badge_text,
            badge_color,
            fixed_proxy: fixed_proxy.map(|p| p.name.clone()),
        }
    }

    pub fn is_foreign(&self) -> bool {
        self.fixed_foreign || self.pac_foreign
    }

    pub fn to_schema(&self) -> StatusSchema {
        StatusSchema {
            declared_mode: self.declared_mode.to_string(),
            observed_mode: self.observed_mode.to_string(),
            foreign: self.is_foreign(),
            fixed_foreign: self.fixed_foreign,
            pac_foreign: self.pac_foreign,
            management_drift: self.management_drift,
            badge_text: self.badge_text.clone(),
            badge_color: self.badge_color.map(|c| c.to_string()),
            fixed_proxy: self.fixed_proxy.clone(),
        }
    }
}
