//! Access evaluator.
//!
//! Answers "can user U perform action A on resource R?" by walking the
//! user's applicable policy links in order (direct user links first, then
//! role links) and scanning each policy's statements in store order:
//!
//! - an `Allow` match grants provisionally and the scan continues;
//! - a `Deny` match revokes, ends the scan of that policy, and stops the
//!   walk over the remaining links.
//!
//! The reported reason names the policy that decided the outcome, so the
//! walk order is observable and must not be reordered.
//!
//! `get_user_permissions` walks the same links but reports raw allow grants
//! without applying denies. The two operations intentionally disagree when
//! a deny vetoes an allow.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use super::directory::SubjectDirectory;
use super::policy::PolicyService;
use super::ServiceError;
use crate::config::RoleResolution;
use crate::models::{
    AccessDecision, Effect, EntityType, Permission, Policy, PolicyFilter, PolicyLink,
    PolicyLinkFilter, StatementFilter, NO_MATCHING_POLICY,
};

#[derive(Clone)]
pub struct AccessEvaluator {
    policies: Arc<PolicyService>,
    directory: Arc<dyn SubjectDirectory>,
    role_resolution: RoleResolution,
}

impl AccessEvaluator {
    pub fn new(
        policies: Arc<PolicyService>,
        directory: Arc<dyn SubjectDirectory>,
        role_resolution: RoleResolution,
    ) -> Self {
        Self {
            policies,
            directory,
            role_resolution,
        }
    }

    pub fn role_resolution(&self) -> RoleResolution {
        self.role_resolution
    }

    /// Links whose policies apply to `user_id`: user links, then role links.
    async fn applicable_links(&self, user_id: &str) -> Result<Vec<PolicyLink>, ServiceError> {
        let mut links = self
            .policies
            .list_policy_links(&PolicyLinkFilter::for_entity(EntityType::User, user_id))
            .await?;

        let role_links = self
            .policies
            .list_policy_links(&PolicyLinkFilter::for_entity_type(EntityType::Role))
            .await?;

        match self.role_resolution {
            RoleResolution::All => links.extend(role_links),
            RoleResolution::Membership => {
                let roles = self.directory.roles_for(user_id).await;
                links.extend(
                    role_links
                        .into_iter()
                        .filter(|link| roles.contains(&link.entity_id)),
                );
            }
        }

        Ok(links)
    }

    /// Decide whether `user_id` may perform `action` on `resource`.
    ///
    /// "No access" is a normal decision, never an error. Errors only come
    /// from the collaborators (e.g. a simulated transport fault).
    pub async fn check_access(
        &self,
        user_id: &str,
        resource: &str,
        action: &str,
    ) -> Result<AccessDecision, ServiceError> {
        let result = self.evaluate(user_id, resource, action).await;
        if let Err(e) = &result {
            tracing::error!(
                user_id = user_id,
                resource = resource,
                action = action,
                error = %e,
                "Access check failed"
            );
        }
        result
    }

    async fn evaluate(
        &self,
        user_id: &str,
        resource: &str,
        action: &str,
    ) -> Result<AccessDecision, ServiceError> {
        let links = self.applicable_links(user_id).await?;

        let mut allowed = false;
        let mut reason = NO_MATCHING_POLICY.to_string();

        for link in &links {
            let statements = self
                .policies
                .list_statements(&StatementFilter::for_policy(&link.policy_id))
                .await?;

            let mut denied = false;
            for statement in statements.iter().filter(|s| s.matches(resource, action)) {
                match statement.effect {
                    Effect::Allow => {
                        allowed = true;
                        reason = format!("Allowed by policy {}", link.policy_id);
                    }
                    Effect::Deny => {
                        allowed = false;
                        reason = format!("Denied by policy {}", link.policy_id);
                        denied = true;
                        break;
                    }
                }
            }

            if denied {
                break;
            }
        }

        tracing::debug!(
            user_id = user_id,
            resource = resource,
            action = action,
            allowed = allowed,
            reason = %reason,
            links = links.len(),
            "Access evaluated"
        );

        Ok(AccessDecision {
            allowed,
            reason,
            user_id: user_id.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            timestamp: Utc::now(),
        })
    }

    /// Every allow grant reachable from the user's applicable links, one
    /// record per (resource, action). Denies are not applied.
    pub async fn get_user_permissions(
        &self,
        user_id: &str,
    ) -> Result<Vec<Permission>, ServiceError> {
        let result = self.collect_permissions(user_id).await;
        if let Err(e) = &result {
            tracing::error!(user_id = user_id, error = %e, "Permission listing failed");
        }
        result
    }

    async fn collect_permissions(&self, user_id: &str) -> Result<Vec<Permission>, ServiceError> {
        let links = self.applicable_links(user_id).await?;
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let policies: HashMap<String, Policy> = self
            .policies
            .list_policies(&PolicyFilter::default())
            .await?
            .into_iter()
            .map(|p| (p.policy_id.clone(), p))
            .collect();
        let mut permissions = Vec::new();

        for link in &links {
            let Some(policy) = policies.get(&link.policy_id) else {
                tracing::debug!(
                    policy_id = %link.policy_id,
                    "Skipping link to a policy that no longer exists"
                );
                continue;
            };

            let statements = self
                .policies
                .list_statements(&StatementFilter::for_policy(&link.policy_id))
                .await?;

            for statement in statements.iter().filter(|s| s.is_allow()) {
                permissions.extend(statement.actions.iter().map(|action| Permission {
                    resource: statement.resource.clone(),
                    action: action.clone(),
                    policy_id: policy.policy_id.clone(),
                    policy_name: policy.name.clone(),
                }));
            }
        }

        Ok(permissions)
    }

    /// Keyword search over policy name and description.
    pub async fn search_policies(&self, keyword: &str) -> Result<Vec<Policy>, ServiceError> {
        self.policies.search_policies(keyword).await
    }
}
