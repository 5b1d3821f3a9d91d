//! Policy store: the repository the policy service and evaluator read from.
//!
//! Listings preserve insertion order. The access evaluator walks links and
//! statements in that order, so it is part of the contract, not an accident
//! of the backing map.

use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::ServiceError;
use crate::models::{
    EntityType, Policy, PolicyFilter, PolicyLink, PolicyLinkFilter, Statement, StatementFilter,
};

/// What a policy delete removed.
#[derive(Debug, Clone)]
pub struct DeletedPolicy {
    pub policy: Policy,
    pub statements_removed: usize,
    pub links_removed: usize,
}

#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn list_policies(&self, filter: &PolicyFilter) -> Result<Vec<Policy>, ServiceError>;
    async fn get_policy(&self, policy_id: &str) -> Result<Option<Policy>, ServiceError>;
    async fn insert_policy(&self, policy: Policy) -> Result<(), ServiceError>;
    /// Replace an existing policy record.
    async fn update_policy(&self, policy: Policy) -> Result<(), ServiceError>;
    /// Remove a policy together with its statements and links.
    async fn delete_policy(&self, policy_id: &str) -> Result<DeletedPolicy, ServiceError>;

    async fn list_statements(
        &self,
        filter: &StatementFilter,
    ) -> Result<Vec<Statement>, ServiceError>;
    async fn get_statement(&self, statement_id: &str) -> Result<Option<Statement>, ServiceError>;
    /// Fails if the owning policy does not exist.
    async fn insert_statement(&self, statement: Statement) -> Result<(), ServiceError>;
    async fn update_statement(&self, statement: Statement) -> Result<(), ServiceError>;
    async fn delete_statement(&self, statement_id: &str) -> Result<Statement, ServiceError>;

    async fn list_policy_links(
        &self,
        filter: &PolicyLinkFilter,
    ) -> Result<Vec<PolicyLink>, ServiceError>;
    async fn get_policy_link(&self, link_id: &str) -> Result<Option<PolicyLink>, ServiceError>;
    /// Fails if the linked policy does not exist.
    async fn insert_policy_link(&self, link: PolicyLink) -> Result<(), ServiceError>;
    /// Replace a link record, moving it to its new entity if that changed.
    async fn update_policy_link(&self, link: PolicyLink) -> Result<(), ServiceError>;
    async fn delete_policy_link(&self, link_id: &str) -> Result<PolicyLink, ServiceError>;
}

#[derive(Default)]
struct Tables {
    policies: IndexMap<String, Policy>,
    statements: IndexMap<String, Statement>,
    links: IndexMap<String, PolicyLink>,
    statements_by_policy: HashMap<String, Vec<String>>,
    links_by_policy: HashMap<String, Vec<String>>,
    links_by_entity: HashMap<(EntityType, String), Vec<String>>,
}

fn unindex(index: &mut HashMap<String, Vec<String>>, key: &str, id: &str) {
    if let Some(ids) = index.get_mut(key) {
        ids.retain(|i| i != id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

impl Tables {
    fn remove_link(&mut self, link_id: &str) -> Option<PolicyLink> {
        let link = self.links.shift_remove(link_id)?;
        unindex(&mut self.links_by_policy, &link.policy_id, link_id);
        self.unindex_entity(&link.subject_key(), link_id);
        Some(link)
    }

    fn unindex_entity(&mut self, key: &(EntityType, String), link_id: &str) {
        if let Some(ids) = self.links_by_entity.get_mut(key) {
            ids.retain(|i| i != link_id);
            if ids.is_empty() {
                self.links_by_entity.remove(key);
            }
        }
    }

    /// Add a link to its entity index, keeping the index in table order.
    fn index_entity(&mut self, key: (EntityType, String), link_id: &str) {
        let links = &self.links;
        let ids = self.links_by_entity.entry(key).or_default();
        ids.push(link_id.to_string());
        ids.sort_by_key(|id| links.get_index_of(id));
    }

    fn remove_statement(&mut self, statement_id: &str) -> Option<Statement> {
        let statement = self.statements.shift_remove(statement_id)?;
        unindex(
            &mut self.statements_by_policy,
            &statement.policy_id,
            statement_id,
        );
        Some(statement)
    }

    fn resolve<'a, T: Clone>(table: &'a IndexMap<String, T>, ids: &'a [String]) -> Vec<T> {
        ids.iter().filter_map(|id| table.get(id)).cloned().collect()
    }
}

/// In-memory policy store with lookup indexes by `policy_id` and by
/// `(entity_type, entity_id)`.
#[derive(Default)]
pub struct InMemoryPolicyStore {
    tables: RwLock<Tables>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of (policies, statements, links) currently held.
    pub async fn counts(&self) -> (usize, usize, usize) {
        let tables = self.tables.read().await;
        (
            tables.policies.len(),
            tables.statements.len(),
            tables.links.len(),
        )
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn list_policies(&self, filter: &PolicyFilter) -> Result<Vec<Policy>, ServiceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .policies
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn get_policy(&self, policy_id: &str) -> Result<Option<Policy>, ServiceError> {
        Ok(self.tables.read().await.policies.get(policy_id).cloned())
    }

    async fn insert_policy(&self, policy: Policy) -> Result<(), ServiceError> {
        let mut tables = self.tables.write().await;
        if tables.policies.contains_key(&policy.policy_id) {
            return Err(ServiceError::Conflict(format!(
                "Policy already exists: {}",
                policy.policy_id
            )));
        }
        tables.policies.insert(policy.policy_id.clone(), policy);
        Ok(())
    }

    async fn update_policy(&self, policy: Policy) -> Result<(), ServiceError> {
        let mut tables = self.tables.write().await;
        match tables.policies.get_mut(&policy.policy_id) {
            Some(existing) => {
                *existing = policy;
                Ok(())
            }
            None => Err(ServiceError::not_found("Policy", policy.policy_id)),
        }
    }

    async fn delete_policy(&self, policy_id: &str) -> Result<DeletedPolicy, ServiceError> {
        let mut tables = self.tables.write().await;
        let policy = tables
            .policies
            .shift_remove(policy_id)
            .ok_or_else(|| ServiceError::not_found("Policy", policy_id))?;

        let statement_ids = tables
            .statements_by_policy
            .get(policy_id)
            .cloned()
            .unwrap_or_default();
        let statements_removed = statement_ids
            .iter()
            .filter_map(|id| tables.remove_statement(id))
            .count();

        let link_ids = tables
            .links_by_policy
            .get(policy_id)
            .cloned()
            .unwrap_or_default();
        let links_removed = link_ids
            .iter()
            .filter_map(|id| tables.remove_link(id))
            .count();

        Ok(DeletedPolicy {
            policy,
            statements_removed,
            links_removed,
        })
    }

    async fn list_statements(
        &self,
        filter: &StatementFilter,
    ) -> Result<Vec<Statement>, ServiceError> {
        let tables = self.tables.read().await;
        let statements = match filter.policy_id.as_deref() {
            Some(policy_id) => tables
                .statements_by_policy
                .get(policy_id)
                .map(|ids| Tables::resolve(&tables.statements, ids))
                .unwrap_or_default(),
            None => tables.statements.values().cloned().collect(),
        };
        Ok(statements)
    }

    async fn get_statement(&self, statement_id: &str) -> Result<Option<Statement>, ServiceError> {
        Ok(self.tables.read().await.statements.get(statement_id).cloned())
    }

    async fn insert_statement(&self, statement: Statement) -> Result<(), ServiceError> {
        let mut tables = self.tables.write().await;
        if !tables.policies.contains_key(&statement.policy_id) {
            return Err(ServiceError::ValidationError(format!(
                "Statement references unknown policy: {}",
                statement.policy_id
            )));
        }
        if tables.statements.contains_key(&statement.statement_id) {
            return Err(ServiceError::Conflict(format!(
                "Statement already exists: {}",
                statement.statement_id
            )));
        }
        tables
            .statements_by_policy
            .entry(statement.policy_id.clone())
            .or_default()
            .push(statement.statement_id.clone());
        tables
            .statements
            .insert(statement.statement_id.clone(), statement);
        Ok(())
    }

    async fn update_statement(&self, statement: Statement) -> Result<(), ServiceError> {
        let mut tables = self.tables.write().await;
        match tables.statements.get_mut(&statement.statement_id) {
            Some(existing) if existing.policy_id == statement.policy_id => {
                *existing = statement;
                Ok(())
            }
            Some(_) => Err(ServiceError::ValidationError(
                "Statement cannot move to another policy".to_string(),
            )),
            None => Err(ServiceError::not_found("Statement", statement.statement_id)),
        }
    }

    async fn delete_statement(&self, statement_id: &str) -> Result<Statement, ServiceError> {
        self.tables
            .write()
            .await
            .remove_statement(statement_id)
            .ok_or_else(|| ServiceError::not_found("Statement", statement_id))
    }

    async fn list_policy_links(
        &self,
        filter: &PolicyLinkFilter,
    ) -> Result<Vec<PolicyLink>, ServiceError> {
        let tables = self.tables.read().await;
        let candidates = match (&filter.entity_type, &filter.entity_id, &filter.policy_id) {
            (Some(entity_type), Some(entity_id), _) => tables
                .links_by_entity
                .get(&(*entity_type, entity_id.clone()))
                .map(|ids| Tables::resolve(&tables.links, ids))
                .unwrap_or_default(),
            (_, _, Some(policy_id)) => tables
                .links_by_policy
                .get(policy_id)
                .map(|ids| Tables::resolve(&tables.links, ids))
                .unwrap_or_default(),
            _ => tables.links.values().cloned().collect(),
        };
        Ok(candidates
            .into_iter()
            .filter(|link| filter.matches(link))
            .collect())
    }

    async fn get_policy_link(&self, link_id: &str) -> Result<Option<PolicyLink>, ServiceError> {
        Ok(self.tables.read().await.links.get(link_id).cloned())
    }

    async fn insert_policy_link(&self, link: PolicyLink) -> Result<(), ServiceError> {
        let mut tables = self.tables.write().await;
        if !tables.policies.contains_key(&link.policy_id) {
            return Err(ServiceError::ValidationError(format!(
                "Policy link references unknown policy: {}",
                link.policy_id
            )));
        }
        if tables.links.contains_key(&link.policy_link_id) {
            return Err(ServiceError::Conflict(format!(
                "Policy link already exists: {}",
                link.policy_link_id
            )));
        }
        tables
            .links_by_policy
            .entry(link.policy_id.clone())
            .or_default()
            .push(link.policy_link_id.clone());
        tables
            .links_by_entity
            .entry(link.subject_key())
            .or_default()
            .push(link.policy_link_id.clone());
        tables.links.insert(link.policy_link_id.clone(), link);
        Ok(())
    }

    async fn update_policy_link(&self, link: PolicyLink) -> Result<(), ServiceError> {
        let mut tables = self.tables.write().await;
        let previous = match tables.links.get(&link.policy_link_id) {
            Some(existing) if existing.policy_id == link.policy_id => existing.subject_key(),
            Some(_) => {
                return Err(ServiceError::ValidationError(
                    "Policy link cannot move to another policy".to_string(),
                ));
            }
            None => {
                return Err(ServiceError::not_found(
                    "PolicyLink",
                    link.policy_link_id.clone(),
                ));
            }
        };

        let key = link.subject_key();
        let link_id = link.policy_link_id.clone();
        tables.links.insert(link_id.clone(), link);
        if key != previous {
            tables.unindex_entity(&previous, &link_id);
            tables.index_entity(key, &link_id);
        }
        Ok(())
    }

    async fn delete_policy_link(&self, link_id: &str) -> Result<PolicyLink, ServiceError> {
        self.tables
            .write()
            .await
            .remove_link(link_id)
            .ok_or_else(|| ServiceError::not_found("PolicyLink", link_id))
    }
}
