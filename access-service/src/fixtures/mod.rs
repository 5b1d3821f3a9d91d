//! Static fixture data standing in for a backend.

use serde::Deserialize;

use crate::models::{Policy, PolicyLink, Statement, Subject};
use crate::services::{InMemoryDirectory, PolicyStore, ServiceError};

const BUILTIN: &str = include_str!("../../fixtures/access.json");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureSet {
    #[serde(default)]
    pub policies: Vec<Policy>,
    #[serde(default)]
    pub statements: Vec<Statement>,
    #[serde(default)]
    pub policy_links: Vec<PolicyLink>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl FixtureSet {
    /// The fixture set shipped with the crate.
    pub fn builtin() -> Result<Self, ServiceError> {
        Self::from_json(BUILTIN)
    }

    pub fn from_json(raw: &str) -> Result<Self, ServiceError> {
        serde_json::from_str(raw).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("Invalid fixture data: {}", e))
        })
    }

    /// Load policies first so statements and links find their parents.
    pub async fn load_into(
        &self,
        store: &dyn PolicyStore,
        directory: &InMemoryDirectory,
    ) -> Result<(), ServiceError> {
        for policy in &self.policies {
            store.insert_policy(policy.clone()).await?;
        }
        for statement in &self.statements {
            store.insert_statement(statement.clone()).await?;
        }
        for link in &self.policy_links {
            store.insert_policy_link(link.clone()).await?;
        }
        for subject in &self.subjects {
            directory.upsert(subject.clone());
        }

        tracing::info!(
            policies = self.policies.len(),
            statements = self.statements.len(),
            policy_links = self.policy_links.len(),
            subjects = self.subjects.len(),
            "Fixtures loaded"
        );
        Ok(())
    }
}
