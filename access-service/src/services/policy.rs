//! Policy service: CRUD over policies, statements and links.
//!
//! Every call crosses the mocked transport before touching the store.
//! Failures are logged and returned unchanged.

use std::sync::Arc;

use http::Method;

use super::store::{DeletedPolicy, PolicyStore};
use super::transport::MockTransport;
use super::ServiceError;
use crate::models::{
    CreatePolicyLinkRequest, CreatePolicyRequest, CreateStatementRequest, EntityType, Policy,
    PolicyDetail, PolicyFilter, PolicyLink, PolicyLinkFilter, Statement, StatementFilter,
    UpdatePolicyLinkRequest, UpdatePolicyRequest, UpdateStatementRequest,
};

fn logged(operation: &'static str) -> impl FnOnce(ServiceError) -> ServiceError {
    move |e| {
        tracing::error!(operation = operation, error = %e, "Policy service call failed");
        e
    }
}

fn entity_type_param(filter: &PolicyLinkFilter) -> &'static str {
    match filter.entity_type {
        Some(EntityType::User) => "user",
        Some(EntityType::Role) => "role",
        Some(EntityType::Team) => "team",
        None => "",
    }
}

#[derive(Clone)]
pub struct PolicyService {
    store: Arc<dyn PolicyStore>,
    transport: MockTransport,
}

impl PolicyService {
    pub fn new(store: Arc<dyn PolicyStore>, transport: MockTransport) -> Self {
        Self { store, transport }
    }

    // ==================== Policy Operations ====================

    pub async fn list_policies(&self, filter: &PolicyFilter) -> Result<Vec<Policy>, ServiceError> {
        let url = self.transport.build_url(
            "/policies",
            &[("search", filter.search.as_deref().unwrap_or_default())],
        )?;
        self.transport
            .request(Method::GET, &url, self.store.list_policies(filter))
            .await
            .map(|r| r.into_data())
            .map_err(logged("list_policies"))
    }

    /// Case-insensitive keyword search over policy name and description.
    pub async fn search_policies(&self, keyword: &str) -> Result<Vec<Policy>, ServiceError> {
        self.list_policies(&PolicyFilter::search(keyword)).await
    }

    /// Fetch a policy; a missing policy is `None`, not an error.
    pub async fn find_policy(&self, policy_id: &str) -> Result<Option<Policy>, ServiceError> {
        let url = self.transport.build_url(&format!("/policies/{}", policy_id), &[])?;
        self.transport
            .request(Method::GET, &url, self.store.get_policy(policy_id))
            .await
            .map(|r| r.into_data())
            .map_err(logged("find_policy"))
    }

    pub async fn get_policy(&self, policy_id: &str) -> Result<Policy, ServiceError> {
        self.find_policy(policy_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Policy", policy_id))
    }

    /// Policy together with its statements and links.
    pub async fn get_policy_detail(&self, policy_id: &str) -> Result<PolicyDetail, ServiceError> {
        let statement_filter = StatementFilter::for_policy(policy_id);
        let link_filter = PolicyLinkFilter::for_policy(policy_id);
        let (policy, statements, links) = futures::try_join!(
            self.get_policy(policy_id),
            self.list_statements(&statement_filter),
            self.list_policy_links(&link_filter),
        )?;
        Ok(PolicyDetail {
            policy,
            statements,
            links,
        })
    }

    pub async fn create_policy(&self, request: CreatePolicyRequest) -> Result<Policy, ServiceError> {
        if request.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Policy name cannot be empty".to_string(),
            ));
        }

        let policy = Policy::new(request);
        let url = self.transport.build_url("/policies", &[])?;
        let created = self
            .transport
            .request(Method::POST, &url, async {
                self.store.insert_policy(policy.clone()).await?;
                Ok(policy.clone())
            })
            .await
            .map(|r| r.into_data())
            .map_err(logged("create_policy"))?;

        tracing::info!(
            policy_id = %created.policy_id,
            name = %created.name,
            "Policy created"
        );
        Ok(created)
    }

    pub async fn update_policy(
        &self,
        policy_id: &str,
        request: UpdatePolicyRequest,
    ) -> Result<Policy, ServiceError> {
        if request.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ServiceError::ValidationError(
                "Policy name cannot be empty".to_string(),
            ));
        }

        let url = self.transport.build_url(&format!("/policies/{}", policy_id), &[])?;
        self.transport
            .request(Method::PUT, &url, async {
                let mut policy = self
                    .store
                    .get_policy(policy_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Policy", policy_id))?;
                policy.apply(request);
                self.store.update_policy(policy.clone()).await?;
                Ok(policy)
            })
            .await
            .map(|r| r.into_data())
            .map_err(logged("update_policy"))
    }

    /// Delete a policy and, with it, its statements and links.
    pub async fn delete_policy(&self, policy_id: &str) -> Result<DeletedPolicy, ServiceError> {
        let url = self.transport.build_url(&format!("/policies/{}", policy_id), &[])?;
        let deleted = self
            .transport
            .request(Method::DELETE, &url, self.store.delete_policy(policy_id))
            .await
            .map(|r| r.into_data())
            .map_err(logged("delete_policy"))?;

        tracing::info!(
            policy_id = policy_id,
            statements_removed = deleted.statements_removed,
            links_removed = deleted.links_removed,
            "Policy deleted"
        );
        Ok(deleted)
    }

    // ==================== Statement Operations ====================

    pub async fn list_statements(
        &self,
        filter: &StatementFilter,
    ) -> Result<Vec<Statement>, ServiceError> {
        let url = self.transport.build_url(
            "/statements",
            &[("policy_id", filter.policy_id.as_deref().unwrap_or_default())],
        )?;
        self.transport
            .request(Method::GET, &url, self.store.list_statements(filter))
            .await
            .map(|r| r.into_data())
            .map_err(logged("list_statements"))
    }

    pub async fn create_statement(
        &self,
        request: CreateStatementRequest,
    ) -> Result<Statement, ServiceError> {
        validate_statement(&request.resource, &request.actions)?;

        let statement = Statement::new(request);
        let url = self.transport.build_url("/statements", &[])?;
        self.transport
            .request(Method::POST, &url, async {
                self.store.insert_statement(statement.clone()).await?;
                Ok(statement.clone())
            })
            .await
            .map(|r| r.into_data())
            .map_err(logged("create_statement"))
    }

    pub async fn update_statement(
        &self,
        statement_id: &str,
        request: UpdateStatementRequest,
    ) -> Result<Statement, ServiceError> {
        let url = self
            .transport
            .build_url(&format!("/statements/{}", statement_id), &[])?;
        self.transport
            .request(Method::PUT, &url, async {
                let mut statement = self
                    .store
                    .get_statement(statement_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Statement", statement_id))?;
                statement.apply(request);
                validate_statement(&statement.resource, &statement.actions)?;
                self.store.update_statement(statement.clone()).await?;
                Ok(statement)
            })
            .await
            .map(|r| r.into_data())
            .map_err(logged("update_statement"))
    }

    pub async fn delete_statement(&self, statement_id: &str) -> Result<Statement, ServiceError> {
        let url = self
            .transport
            .build_url(&format!("/statements/{}", statement_id), &[])?;
        self.transport
            .request(Method::DELETE, &url, self.store.delete_statement(statement_id))
            .await
            .map(|r| r.into_data())
            .map_err(logged("delete_statement"))
    }

    // ==================== Policy Link Operations ====================

    pub async fn list_policy_links(
        &self,
        filter: &PolicyLinkFilter,
    ) -> Result<Vec<PolicyLink>, ServiceError> {
        let url = self.transport.build_url(
            "/policy-links",
            &[
                ("entity_type", entity_type_param(filter)),
                ("entity_id", filter.entity_id.as_deref().unwrap_or_default()),
                ("policy_id", filter.policy_id.as_deref().unwrap_or_default()),
            ],
        )?;
        self.transport
            .request(Method::GET, &url, self.store.list_policy_links(filter))
            .await
            .map(|r| r.into_data())
            .map_err(logged("list_policy_links"))
    }

    pub async fn create_policy_link(
        &self,
        request: CreatePolicyLinkRequest,
    ) -> Result<PolicyLink, ServiceError> {
        if request.entity_id.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Policy link entity_id cannot be empty".to_string(),
            ));
        }

        let link = PolicyLink::new(request);
        let url = self.transport.build_url("/policy-links", &[])?;
        self.transport
            .request(Method::POST, &url, async {
                self.store.insert_policy_link(link.clone()).await?;
                Ok(link.clone())
            })
            .await
            .map(|r| r.into_data())
            .map_err(logged("create_policy_link"))
    }

    pub async fn update_policy_link(
        &self,
        link_id: &str,
        request: UpdatePolicyLinkRequest,
    ) -> Result<PolicyLink, ServiceError> {
        if request
            .entity_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            return Err(ServiceError::ValidationError(
                "Policy link entity_id cannot be empty".to_string(),
            ));
        }

        let url = self
            .transport
            .build_url(&format!("/policy-links/{}", link_id), &[])?;
        self.transport
            .request(Method::PUT, &url, async {
                let mut link = self
                    .store
                    .get_policy_link(link_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("PolicyLink", link_id))?;
                link.apply(request);
                self.store.update_policy_link(link.clone()).await?;
                Ok(link)
            })
            .await
            .map(|r| r.into_data())
            .map_err(logged("update_policy_link"))
    }

    pub async fn delete_policy_link(&self, link_id: &str) -> Result<PolicyLink, ServiceError> {
        let url = self
            .transport
            .build_url(&format!("/policy-links/{}", link_id), &[])?;
        self.transport
            .request(Method::DELETE, &url, self.store.delete_policy_link(link_id))
            .await
            .map(|r| r.into_data())
            .map_err(logged("delete_policy_link"))
    }
}

fn validate_statement(resource: &str, actions: &[String]) -> Result<(), ServiceError> {
    if resource.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "Statement resource cannot be empty".to_string(),
        ));
    }
    if actions.is_empty() || actions.iter().any(|a| a.trim().is_empty()) {
        return Err(ServiceError::ValidationError(
            "Statement actions must be non-empty".to_string(),
        ));
    }
    Ok(())
}
