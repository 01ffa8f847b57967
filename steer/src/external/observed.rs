use crate::config::{ProxyMode, ProxyServer};
use steerapi::ProxySettingsSchema;

/// What the external stack currently reports. Always read back from the
/// stack, never inferred from the last request sent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObservedState {
    pub mode: ProxyMode,
    pub pac_script: Option<String>,
    pub single_proxy: Option<ProxyServer>,
}

impl ObservedState {
    pub fn from_schema(schema: &ProxySettingsSchema) -> Self {
        Self {
            mode: ProxyMode::parse(&schema.mode),
            pac_script: schema.pac_script.as_ref().map(|p| p.data.clone()),
            single_proxy: schema
                .rules
                .as_ref()
                .and_then(|r| r.single_proxy.as_ref())
                .map(ProxyServer::from),
        }
    }
}
