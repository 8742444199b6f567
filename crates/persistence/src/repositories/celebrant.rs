//! Repository for celebrant account operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::CelebrantEntity;
use crate::metrics::QueryTimer;

/// Repository for celebrant account database operations.
#[derive(Clone)]
pub struct CelebrantRepository {
    pool: PgPool,
}

impl CelebrantRepository {
    /// Creates a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the account for an identity provider subject, creating it on
    /// first sign-in. A known email is kept when the token carries none.
    pub async fn get_or_create_by_subject(
        &self,
        auth_subject: &str,
        email: Option<&str>,
    ) -> Result<CelebrantEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_celebrant_by_subject");
        let result = sqlx::query_as::<_, CelebrantEntity>(
            r#"
            INSERT INTO celebrants (auth_subject, email)
            VALUES ($1, $2)
            ON CONFLICT (auth_subject) DO UPDATE SET
                email = COALESCE(EXCLUDED.email, celebrants.email)
            RETURNING id, auth_subject, email, created_at
            "#,
        )
        .bind(auth_subject)
        .bind(email)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Finds an account by its internal id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CelebrantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_celebrant_by_id");
        let result = sqlx::query_as::<_, CelebrantEntity>(
            r#"
            SELECT id, auth_subject, email, created_at
            FROM celebrants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
