use crate::config::{Policy, ProxyMode, ValidationErrors, ValidationIssue, DIRECT};
use std::collections::HashSet;

impl Policy {
    /// All issues that would make this policy unsafe to save, in policy order.
    pub fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues = vec![];

        let mut seen = HashSet::new();
        for (index, proxy) in self.proxies.iter().enumerate() {
            if proxy.name.is_empty() {
                issues.push(ValidationIssue::EmptyProxyName(index));
            } else if proxy.name == DIRECT {
                issues.push(ValidationIssue::ReservedProxyName(index));
            } else if !seen.insert(proxy.name.as_str()) {
                issues.push(ValidationIssue::DuplicateProxy {
                    index,
                    name: proxy.name.clone(),
                });
            }
            if proxy.server.host.is_empty() {
                issues.push(ValidationIssue::EmptyHost {
                    index,
                    name: proxy.name.clone(),
                });
            }
            if !(0..=u16::MAX as i64).contains(&proxy.server.port) {
                issues.push(ValidationIssue::PortOutOfRange {
                    index,
                    name: proxy.name.clone(),
                    port: proxy.server.port,
                });
            }
        }

        for (index, rule) in self.auto_rules.iter().enumerate() {
            if rule.pattern.is_empty() {
                issues.push(ValidationIssue::EmptyPattern(index));
            }
            if !self.resolves(&rule.proxy_name) {
                issues.push(ValidationIssue::DanglingRuleProxy {
                    index,
                    proxy: rule.proxy_name.clone(),
                });
            }
        }

        if !self.resolves(&self.auto_default) {
            issues.push(ValidationIssue::DanglingDefault(self.auto_default.clone()));
        }

        if self.mode == ProxyMode::FixedServers {
            let name = self.fixed_proxy_name.as_deref().unwrap_or_default();
            // "direct" is not a server
            if self.proxy_by_name(name).is_none() {
                issues.push(ValidationIssue::DanglingFixed(name.to_string()));
            }
        }

        issues
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(issues))
        }
    }
}
