use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use motorlog_core::{ListResult, new_id, now_rfc3339};
use motorlog_sql::Value;

use crate::model::{CreateUser, Role, UpdateUser, User, UserPublic};
use crate::service::{AuthError, AuthService};

/// Hash a plaintext password with argon2id and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Internal(format!("password hash failed: {}", e)))
}

/// Verify a plaintext password against a stored argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

impl AuthService {
    /// Create a new user with a hashed password.
    pub fn create_user(&self, input: CreateUser) -> Result<UserPublic, AuthError> {
        if input.username.trim().len() < 3 {
            return Err(AuthError::Validation(
                "username must be at least 3 characters".into(),
            ));
        }
        if input.password.len() < 6 {
            return Err(AuthError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }

        let now = now_rfc3339();
        let user = User {
            id: new_id(),
            username: input.username.trim().to_string(),
            password_hash: hash_password(&input.password)?,
            name: input.name,
            role: input.role,
            branch_id: input.branch_id,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        self.insert_record(
            "users",
            &user.id,
            &user,
            &[
                ("username", Value::text(&user.username)),
                ("name", Value::text(&user.name)),
                ("role", Value::text(role_str(user.role))),
                (
                    "branch_id",
                    user.branch_id
                        .as_deref()
                        .map(Value::text)
                        .unwrap_or(Value::Null),
                ),
                ("created_at", Value::text(&now)),
                ("updated_at", Value::text(&now)),
            ],
        )?;

        Ok(user.into())
    }

    /// Get a user by id (public projection).
    pub fn get_user(&self, id: &str) -> Result<UserPublic, AuthError> {
        let user: User = self.get_record("users", id)?;
        Ok(user.into())
    }

    /// Look up a user by username (internal, includes the hash).
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let rows = self
            .sql
            .query(
                "SELECT data FROM users WHERE username = ?1",
                &[Value::text(username)],
            )
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        match rows.first().and_then(|r| r.get_str("data")) {
            Some(data) => {
                let user: User =
                    serde_json::from_str(data).map_err(|e| AuthError::Internal(e.to_string()))?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Verify login credentials. Returns the user on success.
    pub fn verify_credentials(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .get_user_by_username(username)?
            .ok_or_else(|| AuthError::Unauthorized("unknown username".into()))?;

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::Unauthorized("incorrect password".into()));
        }

        Ok(user)
    }

    /// List users (public projections), newest first.
    pub fn list_users(&self, limit: usize, offset: usize) -> Result<ListResult<UserPublic>, AuthError> {
        let (items, total): (Vec<User>, usize) = self.list_records("users", limit, offset)?;
        Ok(ListResult {
            items: items.into_iter().map(UserPublic::from).collect(),
            total,
        })
    }

    /// Update a user. Password is re-hashed only when provided.
    pub fn update_user(&self, id: &str, input: UpdateUser) -> Result<UserPublic, AuthError> {
        let mut user: User = self.get_record("users", id)?;
        let now = now_rfc3339();

        user.username = input.username.trim().to_string();
        user.name = input.name;
        user.role = input.role;
        user.branch_id = input.branch_id;
        user.updated_at = now.clone();

        if let Some(password) = input.password.as_deref() {
            if password.len() < 6 {
                return Err(AuthError::Validation(
                    "password must be at least 6 characters".into(),
                ));
            }
            user.password_hash = hash_password(password)?;
        }

        self.update_record(
            "users",
            id,
            &user,
            &[
                ("username", Value::text(&user.username)),
                ("name", Value::text(&user.name)),
                ("role", Value::text(role_str(user.role))),
                (
                    "branch_id",
                    user.branch_id
                        .as_deref()
                        .map(Value::text)
                        .unwrap_or(Value::Null),
                ),
                ("updated_at", Value::text(&now)),
            ],
        )?;

        Ok(user.into())
    }

    /// Delete a user by id.
    pub fn delete_user(&self, id: &str) -> Result<(), AuthError> {
        self.delete_record("users", id)
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::Employee => "employee",
    }
}
