//! access-service: policy store and access evaluator for the MRM app.
//!
//! ```ignore
//! let module = AccessModule::bootstrap().await?;
//! let decision = module.check_access("user-002", "budgets", "update").await?;
//! ```

pub mod config;
pub mod fixtures;
pub mod models;
pub mod services;

use std::sync::Arc;

use service_core::error::AppError;

use crate::config::AccessConfig;
use crate::fixtures::FixtureSet;
use crate::models::{AccessDecision, Permission, Policy};
use crate::services::{
    AccessEvaluator, InMemoryDirectory, InMemoryPolicyStore, MockTransport, PolicyService,
    ServiceError,
};

/// Assembled services sharing one store, directory and transport.
#[derive(Clone)]
pub struct AccessModule {
    pub config: AccessConfig,
    pub store: Arc<InMemoryPolicyStore>,
    pub directory: Arc<InMemoryDirectory>,
    pub policies: Arc<PolicyService>,
    pub evaluator: Arc<AccessEvaluator>,
}

impl AccessModule {
    /// Build a module over an empty store and directory.
    pub fn new(config: AccessConfig) -> Self {
        let store = Arc::new(InMemoryPolicyStore::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let transport = MockTransport::new(config.transport.clone());
        let policies = Arc::new(PolicyService::new(store.clone(), transport));
        let evaluator = Arc::new(AccessEvaluator::new(
            policies.clone(),
            directory.clone(),
            config.evaluation.role_resolution,
        ));

        Self {
            config,
            store,
            directory,
            policies,
            evaluator,
        }
    }

    /// Build a module seeded with the given fixtures.
    pub async fn with_fixtures(
        config: AccessConfig,
        fixtures: &FixtureSet,
    ) -> Result<Self, ServiceError> {
        let module = Self::new(config);
        fixtures
            .load_into(module.store.as_ref(), module.directory.as_ref())
            .await?;
        Ok(module)
    }

    /// Load configuration from the environment, install logging and seed the
    /// built-in fixtures when enabled.
    pub async fn bootstrap() -> Result<Self, AppError> {
        let config = AccessConfig::from_env()?;

        if service_core::observability::try_init_tracing(&config.service_name, &config.log_level)
            .is_err()
        {
            tracing::debug!("Tracing subscriber already installed");
        }

        let module = if config.seed_fixtures {
            let fixtures = FixtureSet::builtin()?;
            Self::with_fixtures(config, &fixtures).await?
        } else {
            Self::new(config)
        };

        tracing::info!(
            service = %module.config.service_name,
            version = %module.config.service_version,
            role_resolution = ?module.evaluator.role_resolution(),
            "Access module ready"
        );
        Ok(module)
    }

    pub async fn check_access(
        &self,
        user_id: &str,
        resource: &str,
        action: &str,
    ) -> Result<AccessDecision, ServiceError> {
        self.evaluator.check_access(user_id, resource, action).await
    }

    pub async fn get_user_permissions(
        &self,
        user_id: &str,
    ) -> Result<Vec<Permission>, ServiceError> {
        self.evaluator.get_user_permissions(user_id).await
    }

    pub async fn search_policies(&self, keyword: &str) -> Result<Vec<Policy>, ServiceError> {
        self.evaluator.search_policies(keyword).await
    }
}
