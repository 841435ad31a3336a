//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Subnet identifier on the chain (`netuid`).
pub type SubnetId = u16;

/// Cache and single-flight key for a dividend query.
///
/// A missing field is a wildcard: `subnet_id = None` means every subnet,
/// `account_id = None` means every account in scope. Two keys are equal only
/// when both fields match exactly, so wildcard keys never alias specific ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    subnet_id: Option<SubnetId>,
    account_id: Option<String>,
}

impl QueryKey {
    /// Create a key from optional subnet and account parts.
    #[must_use]
    pub const fn new(subnet_id: Option<SubnetId>, account_id: Option<String>) -> Self {
        Self {
            subnet_id,
            account_id,
        }
    }

    /// Key for a single subnet/account pair.
    pub fn specific(subnet_id: SubnetId, account_id: impl Into<String>) -> Self {
        Self {
            subnet_id: Some(subnet_id),
            account_id: Some(account_id.into()),
        }
    }

    /// Key matching every subnet and every account.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            subnet_id: None,
            account_id: None,
        }
    }

    #[must_use]
    pub const fn subnet_id(&self) -> Option<SubnetId> {
        self.subnet_id
    }

    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    /// Returns true when either part is a wildcard.
    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        self.subnet_id.is_none() || self.account_id.is_none()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subnet_id {
            Some(id) => write!(f, "netuid:{id}")?,
            None => write!(f, "netuid:all")?,
        }
        match &self.account_id {
            Some(account) => write!(f, ":hotkey:{account}"),
            None => write!(f, ":hotkey:all"),
        }
    }
}

/// Trade job identifier - newtype for type safety.
///
/// Ids are derived deterministically from the logical request, so
/// re-enqueueing the same request inside one window yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Create a new `JobId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the job ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
