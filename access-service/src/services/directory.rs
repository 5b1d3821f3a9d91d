//! Subject directory: user to role membership lookup.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::models::Subject;

#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    async fn find_subject(&self, user_id: &str) -> Option<Subject>;

    /// Roles held by the user. Unknown users hold none.
    async fn roles_for(&self, user_id: &str) -> Vec<String> {
        self.find_subject(user_id)
            .await
            .map(|s| s.roles)
            .unwrap_or_default()
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    subjects: DashMap<String, Subject>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, subject: Subject) {
        self.subjects.insert(subject.user_id.clone(), subject);
    }

    pub fn remove(&self, user_id: &str) -> Option<Subject> {
        self.subjects.remove(user_id).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

#[async_trait]
impl SubjectDirectory for InMemoryDirectory {
    async fn find_subject(&self, user_id: &str) -> Option<Subject> {
        self.subjects.get(user_id).map(|s| s.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roles_for_known_and_unknown_user() {
        let directory = InMemoryDirectory::new();
        directory.upsert(Subject {
            user_id: "u1".to_string(),
            name: "Dana".to_string(),
            email: None,
            roles: vec!["marketing_manager".to_string()],
            teams: vec![],
        });

        assert_eq!(directory.roles_for("u1").await, vec!["marketing_manager"]);
        assert!(directory.roles_for("ghost").await.is_empty());
        assert!(directory.remove("u1").is_some());
        assert!(directory.is_empty());
    }
}
