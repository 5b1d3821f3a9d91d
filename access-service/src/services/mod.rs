//! Services layer for access-service.
//!
//! Policy store, subject directory, mocked transport, the policy CRUD
//! service and the access evaluator built on top of them.

mod directory;
pub mod error;
mod evaluator;
mod policy;
pub mod store;
pub mod transport;

pub use directory::{InMemoryDirectory, SubjectDirectory};
pub use error::ServiceError;
pub use evaluator::AccessEvaluator;
pub use policy::PolicyService;
pub use store::{DeletedPolicy, InMemoryPolicyStore, PolicyStore};
pub use transport::{ApiResponse, MockTransport};
