//! Repository for celebrant settings operations.

use domain::models::CelebrantSettings;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::entities::CelebrantSettingsEntity;
use crate::metrics::QueryTimer;

/// Attempts at picking an unused share id before giving up.
const SHARE_ID_ATTEMPTS: usize = 5;

const SETTINGS_COLUMNS: &str = "celebrant_id, public_id, name, age, profile_image, \
     background_image, wishlist_title, wishlist_description, enable_wine_selection, \
     enable_flowers, enable_money_gift, updated_at";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Repository for celebrant settings database operations.
#[derive(Clone)]
pub struct CelebrantSettingsRepository {
    pool: PgPool,
}

impl CelebrantSettingsRepository {
    /// Creates a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets settings for an account.
    /// Returns None if settings don't exist yet.
    pub async fn find_by_celebrant(
        &self,
        celebrant_id: Uuid,
    ) -> Result<Option<CelebrantSettingsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_settings_by_celebrant");
        let result = sqlx::query_as::<_, CelebrantSettingsEntity>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM celebrant_settings WHERE celebrant_id = $1"
        ))
        .bind(celebrant_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Resolves a public share id through the unique index.
    pub async fn find_by_public_id(
        &self,
        public_id: &str,
    ) -> Result<Option<CelebrantSettingsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_settings_by_public_id");
        let result = sqlx::query_as::<_, CelebrantSettingsEntity>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM celebrant_settings WHERE public_id = $1"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Gets settings for an account, creating defaults if they don't exist.
    pub async fn get_or_create(
        &self,
        celebrant_id: Uuid,
    ) -> Result<CelebrantSettingsEntity, sqlx::Error> {
        if let Some(settings) = self.find_by_celebrant(celebrant_id).await? {
            return Ok(settings);
        }

        let mut last_err = None;
        for _ in 0..SHARE_ID_ATTEMPTS {
            let defaults =
                CelebrantSettings::defaults(celebrant_id, shared::crypto::generate_share_id());
            let timer = QueryTimer::new("create_default_settings");
            let result = sqlx::query_as::<_, CelebrantSettingsEntity>(&format!(
                r#"
                INSERT INTO celebrant_settings (
                    celebrant_id, public_id, enable_wine_selection, enable_flowers,
                    enable_money_gift
                )
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (celebrant_id) DO UPDATE SET celebrant_id = EXCLUDED.celebrant_id
                RETURNING {SETTINGS_COLUMNS}
                "#
            ))
            .bind(celebrant_id)
            .bind(&defaults.public_id)
            .bind(defaults.enable_wine_selection)
            .bind(defaults.enable_flowers)
            .bind(defaults.enable_money_gift)
            .fetch_one(&self.pool)
            .await;
            timer.record();

            match result {
                Ok(settings) => return Ok(settings),
                Err(e) if is_unique_violation(&e) => {
                    warn!(celebrant_id = %celebrant_id, "Share id collision, retrying");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or(sqlx::Error::RowNotFound))
    }

    /// Writes all editable fields. The share id is left untouched.
    pub async fn update(
        &self,
        settings: &CelebrantSettings,
    ) -> Result<CelebrantSettingsEntity, sqlx::Error> {
        let timer = QueryTimer::new("update_settings");
        let result = sqlx::query_as::<_, CelebrantSettingsEntity>(&format!(
            r#"
            UPDATE celebrant_settings SET
                name = $2,
                age = $3,
                profile_image = $4,
                background_image = $5,
                wishlist_title = $6,
                wishlist_description = $7,
                enable_wine_selection = $8,
                enable_flowers = $9,
                enable_money_gift = $10,
                updated_at = NOW()
            WHERE celebrant_id = $1
            RETURNING {SETTINGS_COLUMNS}
            "#
        ))
        .bind(settings.account_id)
        .bind(&settings.name)
        .bind(settings.age)
        .bind(&settings.profile_image)
        .bind(&settings.background_image)
        .bind(&settings.wishlist_title)
        .bind(&settings.wishlist_description)
        .bind(settings.enable_wine_selection)
        .bind(settings.enable_flowers)
        .bind(settings.enable_money_gift)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replaces the public share id with a freshly generated one.
    pub async fn regenerate_public_id(
        &self,
        celebrant_id: Uuid,
    ) -> Result<Option<CelebrantSettingsEntity>, sqlx::Error> {
        let mut last_err = None;
        for _ in 0..SHARE_ID_ATTEMPTS {
            let timer = QueryTimer::new("regenerate_public_id");
            let result = sqlx::query_as::<_, CelebrantSettingsEntity>(&format!(
                r#"
                UPDATE celebrant_settings
                SET public_id = $2, updated_at = NOW()
                WHERE celebrant_id = $1
                RETURNING {SETTINGS_COLUMNS}
                "#
            ))
            .bind(celebrant_id)
            .bind(shared::crypto::generate_share_id())
            .fetch_optional(&self.pool)
            .await;
            timer.record();

            match result {
                Ok(settings) => return Ok(settings),
                Err(e) if is_unique_violation(&e) => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or(sqlx::Error::RowNotFound))
    }
}
