//! Conversions between the persisted record and the policy model.
//!
//! Loading is total: every record, however malformed, produces a policy.
//! Unknown enum values become the enum's first variant, missing lists become
//! empty and missing strings become empty.

use crate::config::{
    Policy, ProxyConfig, ProxyMode, ProxyScheme, ProxyServer, Rule, RuleSubject, RuleType, DIRECT,
};
use serde_json::Value;
use steerapi::{PolicySchema, ProxyConfigSchema, ProxyServerSchema, RuleSchema};

impl From<&ProxyServerSchema> for ProxyServer {
    fn from(s: &ProxyServerSchema) -> Self {
        ProxyServer {
            scheme: ProxyScheme::parse(&s.scheme),
            host: s.host.clone(),
            port: s.port,
        }
    }
}

impl From<&ProxyServer> for ProxyServerSchema {
    fn from(s: &ProxyServer) -> Self {
        ProxyServerSchema {
            scheme: s.scheme.to_string(),
            host: s.host.clone(),
            port: s.port,
        }
    }
}

impl From<&ProxyConfigSchema> for ProxyConfig {
    fn from(s: &ProxyConfigSchema) -> Self {
        ProxyConfig {
            name: s.name.clone(),
            badge_text: s.badge_text.clone(),
            server: ProxyServer::from(&s.server),
        }
    }
}

impl From<&ProxyConfig> for ProxyConfigSchema {
    fn from(p: &ProxyConfig) -> Self {
        ProxyConfigSchema {
            name: p.name.clone(),
            badge_text: p.badge_text.clone(),
            server: ProxyServerSchema::from(&p.server),
        }
    }
}

impl From<&RuleSchema> for Rule {
    fn from(s: &RuleSchema) -> Self {
        Rule {
            rule_type: RuleType::parse(&s.rule_type),
            subject: RuleSubject::parse(&s.subject),
            pattern: s.pattern.clone(),
            proxy_name: s.proxy_name.clone(),
        }
    }
}

impl From<&Rule> for RuleSchema {
    fn from(r: &Rule) -> Self {
        RuleSchema {
            rule_type: r.rule_type.to_string(),
            subject: r.subject.to_string(),
            pattern: r.pattern.clone(),
            proxy_name: r.proxy_name.clone(),
        }
    }
}

impl Policy {
    pub fn from_schema(schema: &PolicySchema) -> Self {
        Policy {
            mode: ProxyMode::parse(&schema.mode),
            fixed_proxy_name: schema
                .fixed_proxy_name
                .as_ref()
                .filter(|name| !name.is_empty())
                .cloned(),
            proxies: schema.proxies.iter().map(ProxyConfig::from).collect(),
            auto_default: if schema.auto_default.is_empty() {
                DIRECT.to_string()
            } else {
                schema.auto_default.clone()
            },
            auto_rules: schema.auto_rules.iter().map(Rule::from).collect(),
        }
    }

    pub fn to_schema(&self) -> PolicySchema {
        PolicySchema {
            mode: self.mode.to_string(),
            fixed_proxy_name: self.fixed_proxy_name.clone(),
            proxies: self.proxies.iter().map(ProxyConfigSchema::from).collect(),
            auto_default: self.auto_default.clone(),
            auto_rules: self.auto_rules.iter().map(RuleSchema::from).collect(),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        Self::from_schema(&PolicySchema::from_value(value))
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self.to_schema())
    }
}
