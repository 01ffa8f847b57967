use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File error: {0}")]
    File(#[from] FileError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Internal error: {0}")]
    Internal(&'static str),
}

#[derive(Error, Debug)]
pub enum FileError {
    #[error("{0} io error: {1}")]
    Io(String, std::io::Error),
    #[error("Env variable error: {0}")]
    Env(#[from] std::env::VarError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} io error: {1}")]
    Io(String, std::io::Error),
    #[error("{0} serde error: {1}")]
    Serde(String, serde_yaml::Error),
    #[error("Record encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The part of a policy a validation issue points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyEntity {
    Proxy(usize),
    Rule(usize),
    AutoDefault,
    FixedProxy,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("Proxy #{0} has an empty name")]
    EmptyProxyName(usize),
    #[error("Proxy #{0} uses the reserved name \"direct\"")]
    ReservedProxyName(usize),
    #[error("Duplicate proxy name {name} at #{index}")]
    DuplicateProxy { index: usize, name: String },
    #[error("Proxy {name} has an empty host")]
    EmptyHost { index: usize, name: String },
    #[error("Proxy {name} has port {port} out of range")]
    PortOutOfRange {
        index: usize,
        name: String,
        port: i64,
    },
    #[error("Rule #{0} has an empty pattern")]
    EmptyPattern(usize),
    #[error("Rule #{index} refers to unknown proxy {proxy}")]
    DanglingRuleProxy { index: usize, proxy: String },
    #[error("Default refers to unknown proxy {0}")]
    DanglingDefault(String),
    #[error("Fixed server refers to unknown proxy \"{0}\"")]
    DanglingFixed(String),
}

impl ValidationIssue {
    pub fn entity(&self) -> PolicyEntity {
        match self {
            ValidationIssue::EmptyProxyName(index) | ValidationIssue::ReservedProxyName(index) => {
                PolicyEntity::Proxy(*index)
            }
            ValidationIssue::DuplicateProxy { index, .. }
            | ValidationIssue::EmptyHost { index, .. }
            | ValidationIssue::PortOutOfRange { index, .. } => PolicyEntity::Proxy(*index),
            ValidationIssue::EmptyPattern(index)
            | ValidationIssue::DanglingRuleProxy { index, .. } => PolicyEntity::Rule(*index),
            ValidationIssue::DanglingDefault(_) => PolicyEntity::AutoDefault,
            ValidationIssue::DanglingFixed(_) => PolicyEntity::FixedProxy,
        }
    }
}

/// Every issue found in a rejected policy, in policy order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationIssue>);

impl ValidationErrors {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }

    pub fn entities(&self) -> Vec<PolicyEntity> {
        self.0.iter().map(ValidationIssue::entity).collect()
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
