//! Access decision and permission records returned by the evaluator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Literal wildcard accepted in statement resources and actions.
pub const WILDCARD: &str = "*";

/// Reason reported when no statement matched.
pub const NO_MATCHING_POLICY: &str = "No matching policy";

/// Result of a single access check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: String,
    pub user_id: String,
    pub resource: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

/// One raw allow grant, expanded per action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub resource: String,
    pub action: String,
    pub policy_id: String,
    pub policy_name: String,
}
