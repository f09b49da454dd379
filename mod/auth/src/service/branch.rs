use motorlog_core::{ListResult, new_id, now_rfc3339};
use motorlog_sql::Value;

use crate::model::{Branch, CreateBranch, UpdateBranch};
use crate::service::{AuthError, AuthService};

impl AuthService {
    /// Create a new branch.
    pub fn create_branch(&self, input: CreateBranch) -> Result<Branch, AuthError> {
        if input.name.trim().is_empty() {
            return Err(AuthError::Validation("branch name cannot be empty".into()));
        }
        if input.location.trim().is_empty() {
            return Err(AuthError::Validation("branch location cannot be empty".into()));
        }

        let now = now_rfc3339();
        let branch = Branch {
            id: new_id(),
            name: input.name.trim().to_string(),
            location: input.location.trim().to_string(),
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        self.insert_record(
            "branches",
            &branch.id,
            &branch,
            &[
                ("name", Value::text(&branch.name)),
                ("location", Value::text(&branch.location)),
                ("created_at", Value::text(&now)),
                ("updated_at", Value::text(&now)),
            ],
        )?;

        Ok(branch)
    }

    /// Get a branch by id.
    pub fn get_branch(&self, id: &str) -> Result<Branch, AuthError> {
        self.get_record("branches", id)
    }

    /// List branches, newest first.
    pub fn list_branches(&self, limit: usize, offset: usize) -> Result<ListResult<Branch>, AuthError> {
        let (items, total) = self.list_records("branches", limit, offset)?;
        Ok(ListResult { items, total })
    }

    /// Update a branch.
    pub fn update_branch(&self, id: &str, input: UpdateBranch) -> Result<Branch, AuthError> {
        let mut branch: Branch = self.get_record("branches", id)?;
        let now = now_rfc3339();

        branch.name = input.name.trim().to_string();
        branch.location = input.location.trim().to_string();
        branch.updated_at = now.clone();

        self.update_record(
            "branches",
            id,
            &branch,
            &[
                ("name", Value::text(&branch.name)),
                ("location", Value::text(&branch.location)),
                ("updated_at", Value::text(&now)),
            ],
        )?;

        Ok(branch)
    }

    /// Delete a branch by id.
    pub fn delete_branch(&self, id: &str) -> Result<(), AuthError> {
        self.delete_record("branches", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::AuthConfig;
    use motorlog_sql::SqliteStore;
    use std::sync::Arc;

    fn test_service() -> Arc<AuthService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        AuthService::new(sql, AuthConfig::default()).unwrap()
    }

    #[test]
    fn test_branch_crud() {
        let svc = test_service();

        let branch = svc
            .create_branch(CreateBranch {
                name: "الفرع الرئيسي".into(),
                location: "القاهرة".into(),
            })
            .unwrap();

        let fetched = svc.get_branch(&branch.id).unwrap();
        assert_eq!(fetched.location, "القاهرة");

        let updated = svc
            .update_branch(
                &branch.id,
                UpdateBranch {
                    name: "الفرع الرئيسي".into(),
                    location: "الجيزة".into(),
                },
            )
            .unwrap();
        assert_eq!(updated.location, "الجيزة");

        let list = svc.list_branches(50, 0).unwrap();
        assert_eq!(list.total, 1);

        svc.delete_branch(&branch.id).unwrap();
        assert!(svc.get_branch(&branch.id).is_err());
    }

    #[test]
    fn test_duplicate_branch_name() {
        let svc = test_service();
        let input = CreateBranch {
            name: "فرع الإسكندرية".into(),
            location: "الإسكندرية".into(),
        };
        svc.create_branch(input.clone()).unwrap();
        assert!(matches!(
            svc.create_branch(input),
            Err(AuthError::Conflict(_))
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let svc = test_service();
        assert!(matches!(
            svc.create_branch(CreateBranch {
                name: "  ".into(),
                location: "x".into()
            }),
            Err(AuthError::Validation(_))
        ));
    }
}
