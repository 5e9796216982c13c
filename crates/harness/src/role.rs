//! Simulated user identities and their bearer credentials

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// The identity a request is sent as.
///
/// The set is closed: case files naming any other role fail to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Unauthenticated; no Authorization header is sent
    None,
    Admin,
    Operator,
    Commenter,
    Viewer,
    Disabled,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::None => "none",
            Role::Admin => "admin",
            Role::Operator => "operator",
            Role::Commenter => "commenter",
            Role::Viewer => "viewer",
            Role::Disabled => "disabled",
        }
    }

    pub fn all() -> &'static [Role] {
        &[
            Role::None,
            Role::Admin,
            Role::Operator,
            Role::Commenter,
            Role::Viewer,
            Role::Disabled,
        ]
    }

    /// Whether requests made as this role carry a credential
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Role::None)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Role::None),
            "admin" => Ok(Role::Admin),
            "operator" => Ok(Role::Operator),
            "commenter" => Ok(Role::Commenter),
            "viewer" => Ok(Role::Viewer),
            "disabled" => Ok(Role::Disabled),
            _ => Err(ConfigurationError::UnknownRole(s.to_string())),
        }
    }
}

/// Static bearer tokens keyed by role name, fixed for the lifetime of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenTable {
    tokens: BTreeMap<String, String>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token for a role, replacing any previous value
    pub fn insert(&mut self, role: Role, token: impl Into<String>) {
        self.tokens.insert(role.as_str().to_string(), token.into());
    }

    /// Check that every configured key names a real role
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for key in self.tokens.keys() {
            key.parse::<Role>()?;
        }
        Ok(())
    }

    /// Look up the credential for a role.
    ///
    /// `Ok(None)` means no header should be sent at all.
    pub fn resolve(&self, role: Role) -> Result<Option<&str>, ConfigurationError> {
        if !role.is_authenticated() {
            return Ok(None);
        }
        match self.tokens.get(role.as_str()) {
            Some(token) if !token.is_empty() => Ok(Some(token.as_str())),
            _ => Err(ConfigurationError::MissingCredential(role)),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
