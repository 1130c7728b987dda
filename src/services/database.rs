use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Row};

use crate::models::{DrinkEntry, MenuAnalysis};
use crate::services::store::AnalysisStore;

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("connect to database")?;

        let db = Database { pool };
        db.init_tables().await?;
        Ok(db)
    }

    async fn init_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS menu_analyses (
                analysis_id TEXT PRIMARY KEY,
                drinks JSONB NOT NULL,
                image_excerpt TEXT NOT NULL,
                image_digest TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("create menu_analyses table")?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl AnalysisStore for Database {
    async fn put(&self, analysis: &MenuAnalysis) -> Result<()> {
        // Plain INSERT: a duplicate id violates the primary key and fails.
        sqlx::query(
            r#"
            INSERT INTO menu_analyses (analysis_id, drinks, image_excerpt, image_digest, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&analysis.analysis_id)
        .bind(Json(&analysis.drinks))
        .bind(&analysis.image_excerpt)
        .bind(&analysis.image_digest)
        .bind(analysis.created_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("insert analysis {}", analysis.analysis_id))?;

        Ok(())
    }

    async fn get(&self, analysis_id: &str) -> Result<Option<MenuAnalysis>> {
        let row = sqlx::query(
            r#"
            SELECT analysis_id, drinks, image_excerpt, image_digest, created_at
            FROM menu_analyses WHERE analysis_id = $1
            "#,
        )
        .bind(analysis_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("fetch analysis {}", analysis_id))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let drinks: Json<Vec<DrinkEntry>> = row.try_get("drinks")?;
        Ok(Some(MenuAnalysis {
            analysis_id: row.try_get("analysis_id")?,
            drinks: drinks.0,
            image_excerpt: row.try_get("image_excerpt")?,
            image_digest: row.try_get("image_digest")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}
