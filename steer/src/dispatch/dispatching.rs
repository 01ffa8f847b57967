use crate::config::{Policy, RuleSubject, DIRECT};
use crate::dispatch::rule::{CompiledRule, PatternImpl};
use std::fmt::{Display, Formatter};

/// The URL and host a routing decision is made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub url: String,
    pub host: String,
}

impl RequestInfo {
    pub fn new<U: Into<String>, H: Into<String>>(url: U, host: H) -> Self {
        Self {
            url: url.into(),
            host: host.into(),
        }
    }

    /// Derive the host from the URL; falls back to an empty host for
    /// strings that do not parse as absolute URLs.
    pub fn from_url(url: &str) -> Self {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_default();
        Self::new(url, host)
    }

    pub(crate) fn subject(&self, subject: RuleSubject) -> &str {
        match subject {
            RuleSubject::Url => &self.url,
            RuleSubject::Host => &self.host,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Decision {
    Direct,
    Proxy(String),
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Direct => f.write_str("DIRECT"),
            Decision::Proxy(name) => write!(f, "PROXY({})", name),
        }
    }
}

/// Resolve a rule target: `"direct"` and unknown names both route directly.
pub fn resolve(policy: &Policy, name: &str) -> Decision {
    if name == DIRECT {
        return Decision::Direct;
    }
    match policy.proxy_by_name(name) {
        Some(proxy) => Decision::Proxy(proxy.name.clone()),
        None => {
            tracing::debug!("No proxy named {}; using DIRECT", name);
            Decision::Direct
        }
    }
}

/// A policy's rule list with every pattern compiled and every target resolved.
pub struct Dispatching {
    rules: Vec<CompiledRule<Decision>>,
    fallback: Decision,
}

impl Dispatching {
    pub fn new(policy: &Policy) -> Self {
        let rules = policy
            .auto_rules
            .iter()
            .map(|rule| {
                CompiledRule::new(
                    rule.subject,
                    PatternImpl::compile(rule.rule_type, &rule.pattern),
                    resolve(policy, &rule.proxy_name),
                )
            })
            .collect();
        Self {
            rules,
            fallback: resolve(policy, &policy.auto_default),
        }
    }

    pub fn matches(&self, info: &RequestInfo, verbose: bool) -> Decision {
        for (idx, rule) in self.rules.iter().enumerate() {
            if let Some(decision) = rule.matches(info) {
                if verbose {
                    tracing::info!("[#{} {}] {} => {}", idx, rule, info.url, decision);
                }
                return decision;
            }
        }
        if verbose {
            tracing::info!("[Fallback] {} => {}", info.url, self.fallback);
        }
        self.fallback.clone()
    }
}

/// Decide how a request is routed under `policy`. First matching rule wins.
pub fn decide(policy: &Policy, info: &RequestInfo) -> Decision {
    Dispatching::new(policy).matches(info, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProxyConfig, ProxyScheme, ProxyServer, Rule, RuleType};

    fn policy_with(rules: Vec<Rule>) -> Policy {
        let mut policy = Policy::default();
        policy.proxies.push(ProxyConfig::new(
            "work",
            ProxyServer::new(ProxyScheme::Http, "proxy.local", 0),
        ));
        policy.proxies.push(ProxyConfig::new(
            "tor",
            ProxyServer::new(ProxyScheme::Socks5, "127.0.0.1", 9050),
        ));
        policy.auto_rules = rules;
        policy
    }

    fn proxy(name: &str) -> Decision {
        Decision::Proxy(name.to_string())
    }

    #[test]
    fn test_internal_hosts() {
        let policy = policy_with(vec![Rule::new(
            RuleType::Shexp,
            RuleSubject::Host,
            "*.internal.example.com",
            "work",
        )]);
        let req = RequestInfo::new("http://a.internal.example.com/", "a.internal.example.com");
        assert_eq!(decide(&policy, &req), proxy("work"));
        let req = RequestInfo::new("http://external.com/", "external.com");
        assert_eq!(decide(&policy, &req), Decision::Direct);
    }

    #[test]
    fn test_first_match_wins() {
        let policy = policy_with(vec![
            Rule::new(RuleType::Shexp, RuleSubject::Host, "*.example.com", "tor"),
            Rule::new(RuleType::Exact, RuleSubject::Host, "www.example.com", "work"),
        ]);
        let req = RequestInfo::from_url("https://www.example.com/index.html");
        assert_eq!(decide(&policy, &req), proxy("tor"));

        let policy = policy_with(vec![
            Rule::new(RuleType::Exact, RuleSubject::Host, "www.example.com", "work"),
            Rule::new(RuleType::Shexp, RuleSubject::Host, "*.example.com", "tor"),
        ]);
        assert_eq!(decide(&policy, &req), proxy("work"));
    }

    #[test]
    fn test_invalid_regex_does_not_stop_evaluation() {
        let policy = policy_with(vec![
            Rule::new(RuleType::Regex, RuleSubject::Url, "([a-z]+", "tor"),
            Rule::new(RuleType::Regex, RuleSubject::Url, "^https://", "work"),
        ]);
        let req = RequestInfo::from_url("https://abc.org/");
        assert_eq!(decide(&policy, &req), proxy("work"));
    }

    #[test]
    fn test_subject_selection() {
        let policy = policy_with(vec![
            Rule::new(RuleType::Regex, RuleSubject::Url, "/admin", "work"),
            Rule::new(RuleType::Regex, RuleSubject::Host, "/", "tor"),
        ]);
        assert_eq!(
            decide(&policy, &RequestInfo::from_url("http://x.org/admin/panel")),
            proxy("work")
        );
        assert_eq!(
            decide(&policy, &RequestInfo::from_url("http://x.org/public")),
            Decision::Direct
        );
    }

    #[test]
    fn test_direct_and_dangling_targets() {
        let mut policy = policy_with(vec![
            Rule::new(RuleType::Exact, RuleSubject::Host, "a.org", "direct"),
            Rule::new(RuleType::Exact, RuleSubject::Host, "b.org", "deleted"),
        ]);
        policy.auto_default = "tor".into();
        assert_eq!(decide(&policy, &RequestInfo::new("", "a.org")), Decision::Direct);
        assert_eq!(decide(&policy, &RequestInfo::new("", "b.org")), Decision::Direct);
        assert_eq!(decide(&policy, &RequestInfo::new("", "c.org")), proxy("tor"));
        policy.auto_default = "deleted".into();
        assert_eq!(decide(&policy, &RequestInfo::new("", "c.org")), Decision::Direct);
    }

    #[test]
    fn test_deterministic() {
        let policy = policy_with(vec![
            Rule::new(RuleType::Shexp, RuleSubject::Url, "*://*.onion/*", "tor"),
            Rule::new(RuleType::Regex, RuleSubject::Host, "^10\\.", "work"),
        ]);
        let dispatching = Dispatching::new(&policy);
        for url in ["http://abc.onion/x", "http://10.0.0.1/", "http://other/"] {
            let req = RequestInfo::from_url(url);
            let first = decide(&policy, &req);
            for _ in 0..5 {
                assert_eq!(decide(&policy, &req), first);
                assert_eq!(dispatching.matches(&req, false), first);
            }
        }
    }

    #[test]
    fn test_request_from_url() {
        let req = RequestInfo::from_url("https://user@Svc.Example.com:8443/a?b#c");
        assert_eq!(req.host, "svc.example.com");
        assert_eq!(RequestInfo::from_url("not a url").host, "");
    }
}
