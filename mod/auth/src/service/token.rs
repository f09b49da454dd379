use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::model::{Claims, TokenPair, User};
use crate::service::{AuthError, AuthService};

impl AuthService {
    /// Issue a JWT token pair (access + refresh) for a user.
    pub fn issue_tokens(&self, user: &User) -> Result<TokenPair, AuthError> {
        let now = chrono::Utc::now();
        let access_exp = now + chrono::Duration::seconds(self.config.access_ttl_secs);
        let refresh_exp = now + chrono::Duration::seconds(self.config.refresh_ttl_secs);

        let access_claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
            branch_id: user.branch_id.clone(),
            refresh: false,
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
        };

        let refresh_claims = Claims {
            refresh: true,
            exp: refresh_exp.timestamp(),
            ..access_claims.clone()
        };

        let key = EncodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let access_token = encode(&Header::default(), &access_claims, &key)
            .map_err(|e| AuthError::Internal(format!("JWT encode failed: {}", e)))?;
        let refresh_token = encode(&Header::default(), &refresh_claims, &key)
            .map_err(|e| AuthError::Internal(format!("JWT encode failed: {}", e)))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_ttl_secs,
        })
    }

    /// Verify and decode an access token.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.decode_token(token)?;
        if claims.refresh {
            return Err(AuthError::Unauthorized(
                "refresh token used where access token expected".into(),
            ));
        }
        Ok(claims)
    }

    /// Verify a refresh token and issue a fresh token pair.
    ///
    /// The user row is re-read so role/branch changes and deletions take
    /// effect at rotation time.
    pub fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.decode_token(refresh_token)?;
        if !claims.refresh {
            return Err(AuthError::Unauthorized(
                "access token used where refresh token expected".into(),
            ));
        }

        let user: User = self
            .get_record("users", &claims.sub)
            .map_err(|_| AuthError::Unauthorized("user no longer exists".into()))?;

        self.issue_tokens(&user)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AuthError::Unauthorized("token expired".into())
            }
            _ => AuthError::Unauthorized(format!("invalid token: {}", e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateUser, Role};
    use crate::service::AuthConfig;
    use motorlog_sql::SqliteStore;
    use std::sync::Arc;

    fn test_service() -> Arc<AuthService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        AuthService::new(sql, AuthConfig::default()).unwrap()
    }

    fn seed_user(svc: &AuthService) -> User {
        svc.create_user(CreateUser {
            username: "employee1".into(),
            password: "123456".into(),
            name: "أحمد محمد".into(),
            role: Role::Employee,
            branch_id: Some("b1".into()),
        })
        .unwrap();
        svc.get_user_by_username("employee1").unwrap().unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let svc = test_service();
        let user = seed_user(&svc);

        let pair = svc.issue_tokens(&user).unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 900);

        let claims = svc.verify_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Employee);
        assert_eq!(claims.branch_id.as_deref(), Some("b1"));
        assert!(!claims.refresh);
    }

    #[test]
    fn test_refresh_rotation() {
        let svc = test_service();
        let user = seed_user(&svc);

        let pair = svc.issue_tokens(&user).unwrap();

        // Refresh token cannot authenticate a request.
        assert!(svc.verify_access_token(&pair.refresh_token).is_err());
        // Access token cannot rotate.
        assert!(svc.refresh_tokens(&pair.access_token).is_err());

        let rotated = svc.refresh_tokens(&pair.refresh_token).unwrap();
        assert!(svc.verify_access_token(&rotated.access_token).is_ok());
    }

    #[test]
    fn test_refresh_fails_for_deleted_user() {
        let svc = test_service();
        let user = seed_user(&svc);
        let pair = svc.issue_tokens(&user).unwrap();

        svc.delete_user(&user.id).unwrap();
        assert!(matches!(
            svc.refresh_tokens(&pair.refresh_token),
            Err(AuthError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let svc = test_service();
        assert!(svc.verify_access_token("not-a-jwt").is_err());
    }
}
