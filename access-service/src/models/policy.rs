//! Policy model - named bundle of statements attached to subjects via links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PolicyLink, Statement};

/// Policy lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    Active,
    Inactive,
}

impl std::str::FromStr for PolicyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(PolicyStatus::Active),
            "inactive" => Ok(PolicyStatus::Inactive),
            _ => Err(format!("Invalid policy status: {}", s)),
        }
    }
}

/// The kind of subject a policy is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    User,
    Role,
    Team,
    Global,
}

impl std::str::FromStr for PolicyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(PolicyType::User),
            "role" => Ok(PolicyType::Role),
            "team" => Ok(PolicyType::Team),
            "global" => Ok(PolicyType::Global),
            _ => Err(format!("Invalid policy type: {}", s)),
        }
    }
}

/// Policy entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub policy_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: PolicyStatus,
    #[serde(rename = "type")]
    pub policy_type: PolicyType,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    /// Create a new policy with a generated id.
    pub fn new(request: CreatePolicyRequest) -> Self {
        let now = Utc::now();
        Self {
            policy_id: Uuid::new_v4().to_string(),
            name: request.name,
            description: request.description,
            status: request.status.unwrap_or(PolicyStatus::Active),
            policy_type: request.policy_type,
            created_by: request.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update and bump `updated_at`.
    pub fn apply(&mut self, update: UpdatePolicyRequest) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(policy_type) = update.policy_type {
            self.policy_type = policy_type;
        }
        self.updated_at = Utc::now();
    }

    /// Case-insensitive substring match over name and description.
    /// `needle` must already be lowercase.
    pub fn matches_keyword(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}

/// Request to create a policy.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePolicyRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to `active`.
    #[serde(default)]
    pub status: Option<PolicyStatus>,
    #[serde(rename = "type")]
    pub policy_type: PolicyType,
    pub created_by: String,
}

/// Partial policy update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePolicyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<PolicyStatus>,
    #[serde(default, rename = "type")]
    pub policy_type: Option<PolicyType>,
}

/// Filter for listing policies. `None` fields do not constrain the result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyFilter {
    #[serde(default)]
    pub status: Option<PolicyStatus>,
    #[serde(default, rename = "type")]
    pub policy_type: Option<PolicyType>,
    /// Case-insensitive substring over name and description.
    #[serde(default)]
    pub search: Option<String>,
}

impl PolicyFilter {
    pub fn search(keyword: impl Into<String>) -> Self {
        Self {
            search: Some(keyword.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, policy: &Policy) -> bool {
        if self.status.is_some_and(|s| s != policy.status) {
            return false;
        }
        if self.policy_type.is_some_and(|t| t != policy.policy_type) {
            return false;
        }
        match self.search.as_deref() {
            Some(keyword) => policy.matches_keyword(&keyword.to_lowercase()),
            None => true,
        }
    }
}

/// Policy with its statements and links, for detail views.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyDetail {
    #[serde(flatten)]
    pub policy: Policy,
    pub statements: Vec<Statement>,
    pub links: Vec<PolicyLink>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign_policy() -> Policy {
        Policy::new(CreatePolicyRequest {
            name: "Campaign Managers".to_string(),
            description: Some("Full access to Budgets and activities".to_string()),
            status: None,
            policy_type: PolicyType::Role,
            created_by: "admin".to_string(),
        })
    }

    #[test]
    fn test_new_policy_defaults_to_active() {
        let policy = campaign_policy();
        assert_eq!(policy.status, PolicyStatus::Active);
        assert_eq!(policy.created_at, policy.updated_at);
        assert!(!policy.policy_id.is_empty());
    }

    #[test]
    fn test_filter_search_is_case_insensitive() {
        let policy = campaign_policy();
        assert!(PolicyFilter::search("MANAGERS").matches(&policy));
        assert!(PolicyFilter::search("budgets").matches(&policy));
        assert!(!PolicyFilter::search("kpi").matches(&policy));
    }

    #[test]
    fn test_filter_by_status_and_type() {
        let policy = campaign_policy();
        let filter = PolicyFilter {
            status: Some(PolicyStatus::Inactive),
            ..Default::default()
        };
        assert!(!filter.matches(&policy));

        let filter = PolicyFilter {
            status: Some(PolicyStatus::Active),
            policy_type: Some(PolicyType::Role),
            search: None,
        };
        assert!(filter.matches(&policy));
    }

    #[test]
    fn test_apply_partial_update() {
        let mut policy = campaign_policy();
        policy.apply(UpdatePolicyRequest {
            status: Some(PolicyStatus::Inactive),
            ..Default::default()
        });
        assert_eq!(policy.status, PolicyStatus::Inactive);
        assert_eq!(policy.name, "Campaign Managers");
    }

    #[test]
    fn test_type_serializes_as_type_field() {
        let policy = campaign_policy();
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["type"], "role");
        assert_eq!(json["status"], "active");
    }
}
