use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    Duplicate,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for user accounts. Implementations must reject a second
/// insert for an email that is already stored, even under concurrent inserts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users, oldest first.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Exact, case-sensitive email match.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(code: Option<&str>) -> bool {
    code == Some(UNIQUE_VIOLATION)
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if is_unique_violation(db_err.code().as_deref()) {
            return StoreError::Duplicate;
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, image_path, places, created_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, image_path, places, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, image_path, places)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, image_path, places, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.image_path)
        .bind(&user.places)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    #[test]
    fn non_database_errors_stay_database_errors() {
        let err = map_insert_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(sqlx::Error::PoolTimedOut)));
    }

    #[test]
    fn only_unique_violation_code_means_duplicate() {
        assert!(is_unique_violation(Some("23505")));
        assert!(!is_unique_violation(Some("23503")));
        assert!(!is_unique_violation(Some("42P01")));
        assert!(!is_unique_violation(None));
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Alice".into(),
            email: email.into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            image_path: "uploads/images/a.png".into(),
            places: Vec::new(),
        }
    }

    // Needs a reachable Postgres: DATABASE_URL=... cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn second_insert_for_same_email_is_duplicate() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let db = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect");
        sqlx::migrate!("./migrations").run(&db).await.expect("migrate");
        let store = PgUserStore::new(db);

        let email = format!("{}@example.com", Uuid::new_v4());
        let first = store.insert(new_user(&email)).await.expect("first insert");
        assert_eq!(first.email, email);
        assert!(first.places.is_empty());

        let err = store.insert(new_user(&email)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate), "got {err:?}");

        let found = store.find_by_email(&email).await.unwrap().expect("stored user");
        assert_eq!(found.id, first.id);
    }
}
