pub mod access;
pub mod policy;
pub mod policy_link;
pub mod statement;
pub mod subject;

pub use access::{AccessDecision, NO_MATCHING_POLICY, Permission, WILDCARD};
pub use policy::{
    CreatePolicyRequest, Policy, PolicyDetail, PolicyFilter, PolicyStatus, PolicyType,
    UpdatePolicyRequest,
};
pub use policy_link::{
    CreatePolicyLinkRequest, EntityType, PolicyLink, PolicyLinkFilter, UpdatePolicyLinkRequest,
};
pub use statement::{
    CreateStatementRequest, Effect, Statement, StatementFilter, UpdateStatementRequest,
};
pub use subject::Subject;
