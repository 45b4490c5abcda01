//! User persistence.

use chrono::Utc;
use sqlx::SqlitePool;

use mall_core::{Account, UserId, UserStatus};

use super::{Page, PageRequest, RepositoryError, contains_pattern, map_unique_violation};
use crate::models::User;

const USER_COLUMNS: &str =
    "id, email, phone, password_hash, auth_token, nickname, points, credit, status, created_at";

/// Points granted on registration.
pub const SIGNUP_POINTS: i64 = 200;
/// Credit granted on registration.
pub const SIGNUP_CREDIT: i64 = 1200;

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by email or phone, whichever `account` is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_account(&self, account: &Account) -> Result<Option<User>, RepositoryError> {
        let column = if account.is_email() { "email" } else { "phone" };
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = ?"
        ))
        .bind(account.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get the user holding a session token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE auth_token = ?"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Create a new user. The nickname defaults to the account itself.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or phone is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        account: &Account,
        password_hash: &str,
        token: &str,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, phone, password_hash, auth_token, nickname, points, credit, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(account.email())
        .bind(account.phone())
        .bind(password_hash)
        .bind(token)
        .bind(account.as_str())
        .bind(SIGNUP_POINTS)
        .bind(SIGNUP_CREDIT)
        .bind(UserStatus::Active.as_str())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let what = if account.is_email() { "email" } else { "phone" };
            map_unique_violation(e, what)
        })
    }

    /// Replace a user's session token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_token(&self, id: UserId, token: &str) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET auth_token = ? WHERE id = ?")
            .bind(token)
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Set a user's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_status(&self, id: UserId, status: UserStatus) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Admin search over email, phone and nickname, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        keyword: Option<&str>,
        status: Option<UserStatus>,
        request: PageRequest,
    ) -> Result<Page<User>, RepositoryError> {
        const FILTER: &str = "(?1 IS NULL OR status = ?1) AND (?2 IS NULL \
             OR LOWER(COALESCE(email, '')) LIKE ?2 ESCAPE '\\' \
             OR LOWER(COALESCE(phone, '')) LIKE ?2 ESCAPE '\\' \
             OR LOWER(COALESCE(nickname, '')) LIKE ?2 ESCAPE '\\')";

        let status = status.map(|s| s.as_str());
        let pattern = keyword
            .filter(|k| !k.is_empty())
            .map(contains_pattern);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {FILTER}"))
            .bind(status)
            .bind(&pattern)
            .fetch_one(self.pool)
            .await?;

        let items = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {FILTER} ORDER BY id DESC LIMIT ?3 OFFSET ?4"
        ))
        .bind(status)
        .bind(&pattern)
        .bind(request.size)
        .bind(request.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page {
            items,
            total,
            request,
        })
    }

    /// Count all users, or those with `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, status: Option<UserStatus>) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ?1 IS NULL OR status = ?1")
                .bind(status.map(|s| s.as_str()))
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);
        let account = Account::parse("Alice@Example.com").unwrap();

        let user = repo.create(&account, "hash", "tok1").await.unwrap();
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(user.phone, None);
        assert_eq!(user.nickname, "alice@example.com");
        assert_eq!(user.points, SIGNUP_POINTS);
        assert_eq!(user.credit, SIGNUP_CREDIT);

        let found = repo.get_by_account(&account).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        repo.set_token(user.id, "tok2").await.unwrap();
        assert!(repo.get_by_token("tok1").await.unwrap().is_none());
        assert!(repo.get_by_token("tok2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_account_conflicts() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);
        let account = Account::parse("13800000000").unwrap();

        repo.create(&account, "hash", "a").await.unwrap();
        let err = repo.create(&account, "hash", "b").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_search_and_status() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);
        let a = repo
            .create(&Account::parse("bob@example.com").unwrap(), "h", "t1")
            .await
            .unwrap();
        repo.create(&Account::parse("13900000000").unwrap(), "h", "t2")
            .await
            .unwrap();

        repo.set_status(a.id, UserStatus::Disabled).await.unwrap();
        assert_eq!(repo.count(None).await.unwrap(), 2);
        assert_eq!(repo.count(Some(UserStatus::Disabled)).await.unwrap(), 1);

        let page = repo
            .search(Some("BOB"), None, PageRequest::new(0, 20))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, a.id);

        let page = repo
            .search(None, Some(UserStatus::Active), PageRequest::new(0, 20))
            .await
            .unwrap();
        assert_eq!(page.items[0].phone.as_deref(), Some("13900000000"));
    }
}
