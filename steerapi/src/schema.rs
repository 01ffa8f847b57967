use super::lenient;
use crate::ProxyServerSchema;
use serde::{Deserialize, Serialize};

/// Proxy settings as exchanged with the external proxy stack. The same shape
/// is sent when applying a policy and read back when observing the stack.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProxySettingsSchema {
    #[serde(default, deserialize_with = "lenient::string")]
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pac_script: Option<PacScriptSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<ProxyRulesSchema>,
}

impl ProxySettingsSchema {
    pub fn mode_only<S: Into<String>>(mode: S) -> Self {
        Self {
            mode: mode.into(),
            pac_script: None,
            rules: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PacScriptSchema {
    #[serde(default, deserialize_with = "lenient::string")]
    pub data: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRulesSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_proxy: Option<ProxyServerSchema>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusSchema {
    pub declared_mode: String,
    pub observed_mode: String,
    pub foreign: bool,
    pub fixed_foreign: bool,
    pub pac_foreign: bool,
    pub management_drift: bool,
    pub badge_text: String,
    pub badge_color: Option<String>,
    pub fixed_proxy: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_shapes() {
        let direct = ProxySettingsSchema::mode_only("direct");
        assert_eq!(serde_json::to_value(&direct).unwrap(), json!({"mode": "direct"}));

        let fixed = ProxySettingsSchema {
            mode: "fixed_servers".into(),
            pac_script: None,
            rules: Some(ProxyRulesSchema {
                single_proxy: Some(ProxyServerSchema {
                    scheme: "http".into(),
                    host: "proxy.local".into(),
                    port: 80,
                }),
            }),
        };
        assert_eq!(
            serde_json::to_value(&fixed).unwrap(),
            json!({
                "mode": "fixed_servers",
                "rules": {"singleProxy": {"scheme": "http", "host": "proxy.local", "port": 80}}
            })
        );
    }

    #[test]
    fn test_observed_extra_fields() {
        let observed: ProxySettingsSchema = serde_json::from_value(json!({
            "mode": "pac_script",
            "pacScript": {"data": "function FindProxyForURL(u, h) { return 'DIRECT'; }", "mandatory": false}
        }))
        .unwrap();
        assert_eq!(observed.mode, "pac_script");
        assert!(observed.pac_script.unwrap().data.contains("FindProxyForURL"));
        assert!(observed.rules.is_none());
    }
}
