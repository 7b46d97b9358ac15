use async_trait::async_trait;
use gallery_core::{AppError, Asset};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::traits::AssetStore;

// Excludes `seq`, which only orders rows.
const ASSET_COLUMNS: &str =
    "id, owner_id, storage_key, name, content_type, title, description, created_at, updated_at";

/// Repository for asset metadata
#[derive(Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "select", db.record_id = %id))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Asset>, AppError> {
        let asset = sqlx::query_as::<Postgres, Asset>(&format!(
            "SELECT {} FROM assets WHERE id = $1",
            ASSET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(asset)
    }

    /// Owner-scoped lookup; another owner's record is indistinguishable from a missing one
    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "select", db.record_id = %id))]
    pub async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Asset>, AppError> {
        let asset = sqlx::query_as::<Postgres, Asset>(&format!(
            "SELECT {} FROM assets WHERE id = $1 AND owner_id = $2",
            ASSET_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(asset)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "select"))]
    pub async fn find_all_by_owner(&self, owner_id: Uuid) -> Result<Vec<Asset>, AppError> {
        let assets = sqlx::query_as::<Postgres, Asset>(&format!(
            "SELECT {} FROM assets WHERE owner_id = $1 ORDER BY created_at DESC, seq DESC",
            ASSET_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "search"))]
    pub async fn find_all_by_fragment(&self, fragment: &str) -> Result<Vec<Asset>, AppError> {
        let assets = sqlx::query_as::<Postgres, Asset>(&format!(
            r#"
            SELECT {} FROM assets
            WHERE (title ILIKE $1 ESCAPE '\' OR description ILIKE $1 ESCAPE '\')
            ORDER BY created_at DESC, seq DESC
            "#,
            ASSET_COLUMNS
        ))
        .bind(contains_pattern(fragment))
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "search"))]
    pub async fn find_all_by_owner_and_fragment(
        &self,
        owner_id: Uuid,
        fragment: &str,
    ) -> Result<Vec<Asset>, AppError> {
        let assets = sqlx::query_as::<Postgres, Asset>(&format!(
            r#"
            SELECT {} FROM assets
            WHERE owner_id = $1
              AND (title ILIKE $2 ESCAPE '\' OR description ILIKE $2 ESCAPE '\')
            ORDER BY created_at DESC, seq DESC
            "#,
            ASSET_COLUMNS
        ))
        .bind(owner_id)
        .bind(contains_pattern(fragment))
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "select"))]
    pub async fn find_all_ordered(&self) -> Result<Vec<Asset>, AppError> {
        let assets = sqlx::query_as::<Postgres, Asset>(&format!(
            "SELECT {} FROM assets ORDER BY created_at DESC, seq DESC",
            ASSET_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    /// Insert a new record or update the editable fields of an existing one.
    ///
    /// Identity, owner, storage key, name, content type and creation time are never
    /// overwritten.
    #[tracing::instrument(skip(self, asset), fields(db.table = "assets", db.operation = "upsert", db.record_id = %asset.id()))]
    pub async fn save(&self, asset: &Asset) -> Result<Asset, AppError> {
        let saved = sqlx::query_as::<Postgres, Asset>(&format!(
            r#"
            INSERT INTO assets ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title,
                description = EXCLUDED.description,
                updated_at = EXCLUDED.updated_at
            RETURNING {cols}
            "#,
            cols = ASSET_COLUMNS
        ))
        .bind(asset.id())
        .bind(asset.owner_id())
        .bind(asset.storage_key())
        .bind(asset.name())
        .bind(asset.content_type())
        .bind(asset.title())
        .bind(asset.description())
        .bind(asset.created_at())
        .bind(asset.updated_at())
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    /// Update the editable fields of an existing record; a missing record is left missing.
    #[tracing::instrument(skip(self, asset), fields(db.table = "assets", db.operation = "update", db.record_id = %asset.id()))]
    pub async fn update(&self, asset: &Asset) -> Result<Option<Asset>, AppError> {
        let updated = sqlx::query_as::<Postgres, Asset>(&format!(
            r#"
            UPDATE assets
            SET title = $2, description = $3, updated_at = $4
            WHERE id = $1
            RETURNING {}
            "#,
            ASSET_COLUMNS
        ))
        .bind(asset.id())
        .bind(asset.title())
        .bind(asset.description())
        .bind(asset.updated_at())
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let rows_affected = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}

#[async_trait]
impl AssetStore for AssetRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Asset>, AppError> {
        AssetRepository::find_by_id(self, id).await
    }

    async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Asset>, AppError> {
        AssetRepository::find_by_id_and_owner(self, id, owner_id).await
    }

    async fn find_all_by_owner(&self, owner_id: Uuid) -> Result<Vec<Asset>, AppError> {
        AssetRepository::find_all_by_owner(self, owner_id).await
    }

    async fn find_all_by_fragment(&self, fragment: &str) -> Result<Vec<Asset>, AppError> {
        AssetRepository::find_all_by_fragment(self, fragment).await
    }

    async fn find_all_by_owner_and_fragment(
        &self,
        owner_id: Uuid,
        fragment: &str,
    ) -> Result<Vec<Asset>, AppError> {
        AssetRepository::find_all_by_owner_and_fragment(self, owner_id, fragment).await
    }

    async fn find_all_ordered(&self) -> Result<Vec<Asset>, AppError> {
        AssetRepository::find_all_ordered(self).await
    }

    async fn save(&self, asset: &Asset) -> Result<Asset, AppError> {
        AssetRepository::save(self, asset).await
    }

    async fn update(&self, asset: &Asset) -> Result<Option<Asset>, AppError> {
        AssetRepository::update(self, asset).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        AssetRepository::delete(self, id).await
    }
}

/// `%fragment%` with LIKE metacharacters escaped, for use with `ESCAPE '\'`.
fn contains_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_core::{AssetPatch, UploadedFile};

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(contains_pattern("sun"), "%sun%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\x"), "%c:\\\\x%");
        assert_eq!(contains_pattern(""), "%%");
    }

    async fn repository() -> Option<AssetRepository> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = sqlx::PgPool::connect(&url).await.ok()?;
        crate::run_migrations(&pool).await.ok()?;
        Some(AssetRepository::new(pool))
    }

    fn asset(owner: Uuid, title: &str) -> Asset {
        let upload = UploadedFile::new(bytes::Bytes::from_static(b"x"));
        Asset::from_upload(
            owner,
            format!("assets/{}/{}", owner, Uuid::new_v4()),
            &upload,
            Some(title.to_string()),
            None,
        )
    }

    /// Same record with a fixed creation time.
    fn created_at(asset: Asset, at: &str) -> Asset {
        let mut value = serde_json::to_value(asset).unwrap();
        value["created_at"] = serde_json::Value::from(at);
        value["updated_at"] = serde_json::Value::from(at);
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn postgres_ties_list_most_recent_insert_first() {
        let Some(repo) = repository().await else {
            return;
        };
        let owner = Uuid::new_v4();
        let at = "2024-05-01T12:00:00Z";

        let mut inserted = Vec::new();
        for title in ["a", "b", "c"] {
            inserted.push(repo.save(&created_at(asset(owner, title), at)).await.unwrap());
        }

        let listed: Vec<Uuid> = repo
            .find_all_by_owner(owner)
            .await
            .unwrap()
            .iter()
            .map(Asset::id)
            .collect();
        let expected: Vec<Uuid> = inserted.iter().rev().map(Asset::id).collect();
        assert_eq!(listed, expected);

        for asset in &inserted {
            repo.delete(asset.id()).await.unwrap();
        }
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn postgres_round_trip_and_scoping() {
        let Some(repo) = repository().await else {
            return;
        };
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let first = repo.save(&asset(owner, "Sunset 100% real")).await.unwrap();
        let second = repo.save(&asset(owner, "Harbour")).await.unwrap();

        assert_eq!(repo.find_by_id(first.id()).await.unwrap(), Some(first.clone()));
        assert!(repo
            .find_by_id_and_owner(first.id(), other)
            .await
            .unwrap()
            .is_none());

        let listed = repo.find_all_by_owner(owner).await.unwrap();
        assert_eq!(
            listed.iter().map(Asset::id).collect::<Vec<_>>(),
            vec![second.id(), first.id()]
        );

        let hits = repo.find_all_by_fragment("100%").await.unwrap();
        assert!(hits.iter().any(|a| a.id() == first.id()));
        assert!(!hits.iter().any(|a| a.id() == second.id()));

        let mut edited = second.clone();
        edited.apply(AssetPatch {
            title: Some(Some("Harbour at night".into())),
            description: None,
        });
        let saved = repo.update(&edited).await.unwrap().unwrap();
        assert_eq!(saved.title(), Some("Harbour at night"));
        assert_eq!(saved.storage_key(), second.storage_key());
        assert_eq!(saved.created_at(), second.created_at());

        assert!(repo.delete(first.id()).await.unwrap());
        assert!(!repo.delete(first.id()).await.unwrap());
        assert!(repo.delete(second.id()).await.unwrap());

        assert_eq!(repo.update(&edited).await.unwrap(), None);
        assert_eq!(repo.find_by_id(second.id()).await.unwrap(), None);
    }
}
