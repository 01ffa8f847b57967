use crate::config::{Policy, ProxyConfig, ProxyMode, Rule, ValidationErrors};
use std::sync::Arc;

/// An editable copy of the active policy.
///
/// The active policy is never touched; `commit` validates the draft and hands
/// back a fresh `Policy` value.
#[derive(Debug, Clone)]
pub struct Staging {
    base: Arc<Policy>,
    draft: Policy,
}

impl Staging {
    pub fn new(base: Arc<Policy>) -> Self {
        let draft = base.as_ref().clone();
        Self { base, draft }
    }

    pub fn base(&self) -> &Policy {
        &self.base
    }

    pub fn draft(&self) -> &Policy {
        &self.draft
    }

    pub fn add_proxy(&mut self, proxy: ProxyConfig) {
        self.draft.proxies.push(proxy);
    }

    pub fn proxy_mut(&mut self, index: usize) -> Option<&mut ProxyConfig> {
        self.draft.proxies.get_mut(index)
    }

    pub fn delete_proxy(&mut self, index: usize) -> Option<ProxyConfig> {
        (index < self.draft.proxies.len()).then(|| self.draft.proxies.remove(index))
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.draft.auto_rules.push(rule);
    }

    pub fn rule_mut(&mut self, index: usize) -> Option<&mut Rule> {
        self.draft.auto_rules.get_mut(index)
    }

    pub fn delete_rule(&mut self, index: usize) -> Option<Rule> {
        (index < self.draft.auto_rules.len()).then(|| self.draft.auto_rules.remove(index))
    }

    /// Returns false when the rule is already first.
    pub fn move_rule_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.draft.auto_rules.len() {
            return false;
        }
        self.draft.auto_rules.swap(index - 1, index);
        true
    }

    /// Returns false when the rule is already last.
    pub fn move_rule_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.draft.auto_rules.len() {
            return false;
        }
        self.draft.auto_rules.swap(index, index + 1);
        true
    }

    pub fn set_auto_default<S: Into<String>>(&mut self, name: S) {
        self.draft.auto_default = name.into();
    }

    pub fn set_mode(&mut self, mode: ProxyMode, fixed_proxy_name: Option<&str>) {
        self.draft.set_mode(mode, fixed_proxy_name);
    }

    pub fn revert_proxies(&mut self) {
        self.draft.proxies = self.base.proxies.clone();
    }

    /// Reverts the rule list together with the default target.
    pub fn revert_rules(&mut self) {
        self.draft.auto_rules = self.base.auto_rules.clone();
        self.draft.auto_default = self.base.auto_default.clone();
    }

    pub fn proxies_modified(&self) -> bool {
        self.draft.proxies != self.base.proxies
    }

    pub fn rules_modified(&self) -> bool {
        self.draft.auto_rules != self.base.auto_rules
            || self.draft.auto_default != self.base.auto_default
    }

    pub fn is_modified(&self) -> bool {
        self.draft != *self.base
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.draft.validate()
    }

    pub fn commit(self) -> Result<Policy, ValidationErrors> {
        self.draft.validate()?;
        Ok(self.draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProxyScheme, ProxyServer, RuleSubject, RuleType, ValidationIssue};

    fn base() -> Arc<Policy> {
        let mut policy = Policy::default();
        policy.proxies.push(ProxyConfig::new(
            "work",
            ProxyServer::new(ProxyScheme::Http, "proxy.local", 0),
        ));
        for pattern in ["a", "b", "c"] {
            policy
                .auto_rules
                .push(Rule::new(RuleType::Exact, RuleSubject::Host, pattern, "work"));
        }
        Arc::new(policy)
    }

    fn patterns(staging: &Staging) -> Vec<&str> {
        staging
            .draft()
            .auto_rules
            .iter()
            .map(|r| r.pattern.as_str())
            .collect()
    }

    #[test]
    fn test_reorder() {
        let mut staging = Staging::new(base());
        assert!(!staging.move_rule_up(0));
        assert!(!staging.move_rule_down(2));
        assert!(!staging.move_rule_down(7));
        assert!(!staging.rules_modified());
        assert!(staging.move_rule_up(2));
        assert_eq!(patterns(&staging), vec!["a", "c", "b"]);
        assert!(staging.move_rule_down(0));
        assert_eq!(patterns(&staging), vec!["c", "a", "b"]);
        assert!(staging.rules_modified());
        assert!(!staging.proxies_modified());
        staging.revert_rules();
        assert_eq!(patterns(&staging), vec!["a", "b", "c"]);
        assert!(!staging.is_modified());
    }

    #[test]
    fn test_active_untouched() {
        let active = base();
        let mut staging = Staging::new(active.clone());
        staging.delete_rule(0);
        staging.proxy_mut(0).unwrap().badge_text = "W".into();
        staging.set_auto_default("work");
        assert_eq!(active.auto_rules.len(), 3);
        assert_eq!(active.proxies[0].badge_text, "");
        let committed = staging.commit().unwrap();
        assert_eq!(committed.auto_rules.len(), 2);
        assert_eq!(committed.auto_default, "work");
        assert_eq!(active.auto_default, "direct");
    }

    #[test]
    fn test_commit_refuses_invalid() {
        let mut staging = Staging::new(base());
        assert!(staging.delete_proxy(0).is_some());
        assert!(staging.delete_proxy(0).is_none());
        let errors = staging.clone().commit().unwrap_err();
        assert_eq!(errors.issues().len(), 3);
        assert!(matches!(
            errors.issues()[0],
            ValidationIssue::DanglingRuleProxy { index: 0, .. }
        ));
        staging.revert_proxies();
        assert!(staging.commit().is_ok());
    }
}
