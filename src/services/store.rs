use anyhow::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::MenuAnalysis;

/// Persistence for menu analyses. Records are insert-only.
#[async_trait::async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Insert a new record. Fails if `analysis_id` is already taken.
    async fn put(&self, analysis: &MenuAnalysis) -> Result<()>;

    /// Exact-match lookup by id.
    async fn get(&self, analysis_id: &str) -> Result<Option<MenuAnalysis>>;
}

/// Process-local store, used when no DATABASE_URL is configured and in tests.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, MenuAnalysis>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait::async_trait]
impl AnalysisStore for InMemoryStore {
    async fn put(&self, analysis: &MenuAnalysis) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&analysis.analysis_id) {
            anyhow::bail!("analysis {} already exists", analysis.analysis_id);
        }
        records.insert(analysis.analysis_id.clone(), analysis.clone());
        Ok(())
    }

    async fn get(&self, analysis_id: &str) -> Result<Option<MenuAnalysis>> {
        Ok(self.records.read().await.get(analysis_id).cloned())
    }
}
