//! Statement model - one allow/deny rule owned by a policy.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WILDCARD;

/// Statement effect. There is no priority field; evaluation order decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Statement entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub statement_id: String,
    pub policy_id: String,
    /// Resource name or `*`.
    pub resource: String,
    /// Action names; may contain `*`.
    pub actions: Vec<String>,
    pub effect: Effect,
}

impl Statement {
    /// Create a new statement with a generated id.
    pub fn new(request: CreateStatementRequest) -> Self {
        Self {
            statement_id: Uuid::new_v4().to_string(),
            policy_id: request.policy_id,
            resource: request.resource,
            actions: request.actions,
            effect: request.effect,
        }
    }

    /// Resource is an exact match or the wildcard.
    pub fn covers_resource(&self, resource: &str) -> bool {
        self.resource == resource || self.resource == WILDCARD
    }

    /// Action set contains the action or the wildcard.
    pub fn covers_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action || a == WILDCARD)
    }

    /// Whether this statement applies to a (resource, action) request.
    pub fn matches(&self, resource: &str, action: &str) -> bool {
        self.covers_resource(resource) && self.covers_action(action)
    }

    pub fn is_allow(&self) -> bool {
        self.effect == Effect::Allow
    }

    /// Apply a partial update.
    pub fn apply(&mut self, update: UpdateStatementRequest) {
        if let Some(resource) = update.resource {
            self.resource = resource;
        }
        if let Some(actions) = update.actions {
            self.actions = actions;
        }
        if let Some(effect) = update.effect {
            self.effect = effect;
        }
    }
}

/// Request to create a statement under an existing policy.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStatementRequest {
    pub policy_id: String,
    pub resource: String,
    pub actions: Vec<String>,
    pub effect: Effect,
}

/// Partial statement update. The owning policy cannot change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStatementRequest {
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub actions: Option<Vec<String>>,
    #[serde(default)]
    pub effect: Option<Effect>,
}

/// Filter for listing statements.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatementFilter {
    #[serde(default)]
    pub policy_id: Option<String>,
}

impl StatementFilter {
    pub fn for_policy(policy_id: impl Into<String>) -> Self {
        Self {
            policy_id: Some(policy_id.into()),
        }
    }

    pub fn matches(&self, statement: &Statement) -> bool {
        self.policy_id
            .as_deref()
            .map_or(true, |id| id == statement.policy_id)
    }
}
