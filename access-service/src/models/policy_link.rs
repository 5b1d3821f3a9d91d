//! Policy link model - attaches a policy to a user, role, or team.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of entity a policy can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    User,
    Role,
    Team,
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(EntityType::User),
            "role" => Ok(EntityType::Role),
            "team" => Ok(EntityType::Team),
            _ => Err(format!("Invalid entity type: {}", s)),
        }
    }
}

/// Policy link entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyLink {
    pub policy_link_id: String,
    pub policy_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
}

impl PolicyLink {
    /// Create a new link with a generated id.
    pub fn new(request: CreatePolicyLinkRequest) -> Self {
        Self {
            policy_link_id: Uuid::new_v4().to_string(),
            policy_id: request.policy_id,
            entity_type: request.entity_type,
            entity_id: request.entity_id,
        }
    }

    /// Re-point the link at another entity. The policy cannot change.
    pub fn apply(&mut self, update: UpdatePolicyLinkRequest) {
        if let Some(entity_type) = update.entity_type {
            self.entity_type = entity_type;
        }
        if let Some(entity_id) = update.entity_id {
            self.entity_id = entity_id;
        }
    }

    /// The (entity_type, entity_id) pair this link attaches to.
    pub fn subject_key(&self) -> (EntityType, String) {
        (self.entity_type, self.entity_id.clone())
    }
}

/// Request to attach a policy to an entity.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePolicyLinkRequest {
    pub policy_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePolicyLinkRequest {
    #[serde(default)]
    pub entity_type: Option<EntityType>,
    #[serde(default)]
    pub entity_id: Option<String>,
}

/// Filter for listing links. All set fields must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyLinkFilter {
    #[serde(default)]
    pub entity_type: Option<EntityType>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub policy_id: Option<String>,
}

impl PolicyLinkFilter {
    pub fn for_entity(entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type),
            entity_id: Some(entity_id.into()),
            policy_id: None,
        }
    }

    pub fn for_entity_type(entity_type: EntityType) -> Self {
        Self {
            entity_type: Some(entity_type),
            ..Default::default()
        }
    }

    pub fn for_policy(policy_id: impl Into<String>) -> Self {
        Self {
            policy_id: Some(policy_id.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, link: &PolicyLink) -> bool {
        self.entity_type.map_or(true, |t| t == link.entity_type)
            && self
                .entity_id
                .as_deref()
                .map_or(true, |id| id == link.entity_id)
            && self
                .policy_id
                .as_deref()
                .map_or(true, |id| id == link.policy_id)
    }
}
