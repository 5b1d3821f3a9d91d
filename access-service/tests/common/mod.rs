//! Test helpers for access-service integration tests.
//!
//! Builds a zero-latency module over an empty store and offers shorthand
//! for creating policies, statements and links in a known order.

#![allow(dead_code)]

use access_service::{
    config::{AccessConfig, RoleResolution, TransportConfig},
    fixtures::FixtureSet,
    models::{
        CreatePolicyLinkRequest, CreatePolicyRequest, CreateStatementRequest, Effect, EntityType,
        Policy, PolicyLink, PolicyType, Statement, Subject,
    },
    AccessModule,
};

/// Set TEST_LOG=1 to see service logs while running tests.
fn init_test_tracing() {
    if std::env::var("TEST_LOG").is_ok() {
        let _ = service_core::observability::try_init_tracing("access-service-test", "debug");
    }
}

pub struct TestApp {
    pub module: AccessModule,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_config(AccessConfig::for_tests())
    }

    pub fn with_resolution(role_resolution: RoleResolution) -> Self {
        let mut config = AccessConfig::for_tests();
        config.evaluation.role_resolution = role_resolution;
        Self::with_config(config)
    }

    /// Module whose transport fails every request.
    pub fn with_failing_transport() -> Self {
        let mut config = AccessConfig::for_tests();
        config.transport = TransportConfig {
            failure_rate: 1.0,
            ..TransportConfig::instant()
        };
        Self::with_config(config)
    }

    pub fn with_config(config: AccessConfig) -> Self {
        init_test_tracing();
        Self {
            module: AccessModule::new(config),
        }
    }

    /// Module seeded with the built-in fixture set.
    pub async fn seeded(role_resolution: RoleResolution) -> Self {
        init_test_tracing();
        let mut config = AccessConfig::for_tests();
        config.evaluation.role_resolution = role_resolution;
        let fixtures = FixtureSet::builtin().expect("builtin fixtures parse");
        let module = AccessModule::with_fixtures(config, &fixtures)
            .await
            .expect("fixtures load");
        Self { module }
    }

    pub async fn policy(&self, name: &str) -> Policy {
        self.module
            .policies
            .create_policy(CreatePolicyRequest {
                name: name.to_string(),
                description: None,
                status: None,
                policy_type: PolicyType::User,
                created_by: "test".to_string(),
            })
            .await
            .expect("create policy")
    }

    pub async fn statement(
        &self,
        policy: &Policy,
        effect: Effect,
        resource: &str,
        actions: &[&str],
    ) -> Statement {
        self.module
            .policies
            .create_statement(CreateStatementRequest {
                policy_id: policy.policy_id.clone(),
                resource: resource.to_string(),
                actions: actions.iter().map(|a| a.to_string()).collect(),
                effect,
            })
            .await
            .expect("create statement")
    }

    pub async fn allow(&self, policy: &Policy, resource: &str, actions: &[&str]) -> Statement {
        self.statement(policy, Effect::Allow, resource, actions).await
    }

    pub async fn deny(&self, policy: &Policy, resource: &str, actions: &[&str]) -> Statement {
        self.statement(policy, Effect::Deny, resource, actions).await
    }

    pub async fn attach(
        &self,
        policy: &Policy,
        entity_type: EntityType,
        entity_id: &str,
    ) -> PolicyLink {
        self.module
            .policies
            .create_policy_link(CreatePolicyLinkRequest {
                policy_id: policy.policy_id.clone(),
                entity_type,
                entity_id: entity_id.to_string(),
            })
            .await
            .expect("create policy link")
    }

    pub fn add_subject(&self, user_id: &str, roles: &[&str]) {
        self.module.directory.upsert(Subject {
            user_id: user_id.to_string(),
            name: user_id.to_string(),
            email: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            teams: vec![],
        });
    }
}

pub fn allowed_by(policy: &Policy) -> String {
    format!("Allowed by policy {}", policy.policy_id)
}

pub fn denied_by(policy: &Policy) -> String {
    format!("Denied by policy {}", policy.policy_id)
}
