//! Authentication service.
//!
//! Accounts register with an email or mobile number and a password. Each
//! successful register or login issues a fresh opaque session token that the
//! app sends back as `Authorization: Bearer <token>`.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::Serialize;
use sqlx::SqlitePool;

use mall_core::{Account, UserId, UserStatus, validate_password};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Random bytes in a session token.
const TOKEN_BYTES: usize = 32;

/// The user payload returned by register, login and profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub nickname: String,
    pub points: i64,
    pub credit: i64,
}

impl UserProfile {
    /// Build the payload; `token` is only included right after it is issued.
    #[must_use]
    pub fn new(user: &User, token: Option<String>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            phone: user.phone.clone(),
            account: user.account().to_owned(),
            token,
            nickname: user.nickname.clone(),
            points: user.points,
            credit: user.credit,
        }
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new account and issue its first token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidAccount` or `AuthError::InvalidPassword` if
    /// validation fails.
    /// Returns `AuthError::AccountExists` if the email or phone is taken.
    pub async fn register(&self, account: &str, password: &str) -> Result<UserProfile, AuthError> {
        let account = Account::parse(account)?;
        let password = validate_password(password)?;
        let password_hash = hash_password(password)?;
        let token = generate_token();

        let user = self
            .users
            .create(&account, &password_hash, &token)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    AuthError::AccountExists(if account.is_email() { "email" } else { "phone" })
                }
                other => AuthError::Repository(other),
            })?;

        Ok(UserProfile::new(&user, Some(token)))
    }

    /// Log in and rotate the session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the account or password is wrong.
    /// Returns `AuthError::Disabled` if the account is disabled.
    pub async fn login(&self, account: &str, password: &str) -> Result<UserProfile, AuthError> {
        if password.trim().is_empty() {
            return Err(AuthError::InvalidPassword(mall_core::PasswordError::Empty));
        }
        let account = Account::parse(account)?;

        let user = self
            .users
            .get_by_account(&account)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password.trim(), &user.password_hash)?;

        if user.status == UserStatus::Disabled {
            return Err(AuthError::Disabled);
        }

        let token = generate_token();
        self.users.set_token(user.id, &token).await?;

        Ok(UserProfile::new(&user, Some(token)))
    }

    /// Resolve a session token to its user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is empty or unknown.
    pub async fn profile(&self, token: &str) -> Result<UserProfile, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        let user = self
            .users
            .get_by_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(UserProfile::new(&user, None))
    }
}

/// Generate an opaque session token.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret123", &hash).is_ok());
        assert!(matches!(
            verify_password("secret124", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_token_shape() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(!a.contains('='));
    }

    #[tokio::test]
    async fn test_register_login_profile() {
        let pool = test_pool().await;
        let auth = AuthService::new(&pool);

        let registered = auth.register("user@example.com", "abc12345").await.unwrap();
        assert_eq!(registered.account, "user@example.com");
        assert_eq!(registered.points, 200);
        assert_eq!(registered.credit, 1200);

        let logged_in = auth.login("USER@example.com", "abc12345").await.unwrap();
        assert_ne!(logged_in.token, registered.token);

        let token = logged_in.token.unwrap();
        let profile = auth.profile(&token).await.unwrap();
        assert_eq!(profile.id, registered.id);
        assert!(profile.token.is_none());

        assert!(matches!(
            auth.profile(&registered.token.unwrap()).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_register_rejections() {
        let pool = test_pool().await;
        let auth = AuthService::new(&pool);

        assert!(matches!(
            auth.register("not-an-account", "abc12345").await,
            Err(AuthError::InvalidAccount(_))
        ));
        assert!(matches!(
            auth.register("13800000000", "abcdefgh").await,
            Err(AuthError::InvalidPassword(_))
        ));

        auth.register("13800000000", "abc12345").await.unwrap();
        assert!(matches!(
            auth.register("13800000000", "xyz98765").await,
            Err(AuthError::AccountExists("phone"))
        ));
        assert!(matches!(
            auth.login("13800000000", "wrong1234").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("13900000000", "abc12345").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
