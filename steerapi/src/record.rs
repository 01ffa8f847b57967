use super::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key under which the policy record is persisted.
pub const POLICY_KEY: &str = "options";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicySchema {
    #[serde(default, deserialize_with = "lenient::string")]
    pub mode: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub fixed_proxy_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub proxies: Vec<ProxyConfigSchema>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub auto_default: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub auto_rules: Vec<RuleSchema>,
}

impl PolicySchema {
    /// Never fails; a record that is not an object reads as the default record.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfigSchema {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub badge_text: String,
    #[serde(default, deserialize_with = "lenient::object")]
    pub server: ProxyServerSchema,
}

/// Shared by the persisted record, the apply request and the observed settings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyServerSchema {
    #[serde(default, deserialize_with = "lenient::string")]
    pub scheme: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub host: String,
    #[serde(default, deserialize_with = "lenient::port")]
    pub port: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuleSchema {
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub rule_type: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub subject: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub pattern: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub proxy_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrong_shapes_degrade() {
        let record = PolicySchema::from_value(&json!({
            "mode": 42,
            "proxies": "not a list",
            "autoRules": [
                {"type": "regex", "subject": "host", "pattern": "x", "proxyName": "a"},
                7,
                {"pattern": null}
            ],
            "extra": {"ignored": true}
        }));
        assert_eq!(record.mode, "42");
        assert!(record.proxies.is_empty());
        assert_eq!(record.fixed_proxy_name, None);
        assert_eq!(record.auto_default, "");
        assert_eq!(record.auto_rules.len(), 3);
        assert_eq!(record.auto_rules[0].rule_type, "regex");
        assert_eq!(record.auto_rules[1], RuleSchema::default());
        assert_eq!(record.auto_rules[2].pattern, "");
    }

    #[test]
    fn test_non_object_record() {
        assert_eq!(PolicySchema::from_value(&json!(null)), PolicySchema::default());
        assert_eq!(PolicySchema::from_value(&json!([1, 2])), PolicySchema::default());
    }

    #[test]
    fn test_server_fields() {
        let proxy: ProxyConfigSchema = serde_json::from_value(json!({
            "name": "work",
            "server": {"scheme": "socks5", "host": "10.0.0.1", "port": "1081"}
        }))
        .unwrap();
        assert_eq!(proxy.badge_text, "");
        assert_eq!(proxy.server.port, 1081);

        let proxy: ProxyConfigSchema =
            serde_json::from_value(json!({"name": "x", "server": "oops"})).unwrap();
        assert_eq!(proxy.server, ProxyServerSchema::default());
    }

    #[test]
    fn test_serialized_names() {
        let rule = RuleSchema {
            rule_type: "shexp".into(),
            subject: "url".into(),
            pattern: "*".into(),
            proxy_name: "direct".into(),
        };
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({"type": "shexp", "subject": "url", "pattern": "*", "proxyName": "direct"})
        );
    }
}
