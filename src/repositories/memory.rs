use crate::entities::{ProcessingStatus, StatusRecord};
use crate::repositories::StatusStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;

/// In-process product-code table with the same semantics as the PostgreSQL
/// one. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStatusRepository {
    items: DashMap<String, StatusRecord>,
}

impl MemoryStatusRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let repo = Self::new();
        for code in codes {
            let record = StatusRecord::not_started(code);
            repo.items.insert(record.product_code.clone(), record);
        }
        repo
    }

    /// Copy of every item, ordered by product code.
    pub fn snapshot(&self) -> Vec<StatusRecord> {
        let mut items: Vec<StatusRecord> =
            self.items.iter().map(|entry| entry.value().clone()).collect();
        items.sort_by(|a, b| a.product_code.cmp(&b.product_code));
        items
    }
}

#[async_trait]
impl StatusStore for MemoryStatusRepository {
    async fn fetch_by_status(
        &self,
        status: ProcessingStatus,
        limit: usize,
    ) -> Result<Vec<StatusRecord>> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|item| item.status == status)
            .take(limit)
            .collect())
    }

    async fn claim_batch(&self, limit: usize) -> Result<Vec<StatusRecord>> {
        let now = Utc::now();
        let mut claimed = Vec::new();

        for candidate in self.snapshot() {
            if claimed.len() >= limit {
                break;
            }
            // Re-checked under the entry lock; another claimer may have won
            if let Some(mut item) = self.items.get_mut(&candidate.product_code)
                && item.status == ProcessingStatus::NotStarted
            {
                item.status = ProcessingStatus::Started;
                item.update_at = Some(now);
                item.create_at.get_or_insert(now);
                claimed.push(item.clone());
            }
        }

        Ok(claimed)
    }

    async fn update_status(
        &self,
        product_code: &str,
        status: ProcessingStatus,
        data: Option<Value>,
    ) -> Result<()> {
        let now = Utc::now();
        let mut item = self
            .items
            .entry(product_code.to_string())
            .or_insert_with(|| StatusRecord::not_started(product_code));

        item.status = status;
        item.update_at = Some(now);
        item.create_at.get_or_insert(now);
        if data.is_some() {
            item.data = data;
        }

        Ok(())
    }

    async fn get(&self, product_code: &str) -> Result<Option<StatusRecord>> {
        Ok(self.items.get(product_code).map(|item| item.value().clone()))
    }

    async fn seed(&self, product_codes: &[String]) -> Result<u64> {
        let mut inserted = 0;
        for code in product_codes {
            if !self.items.contains_key(code) {
                self.items
                    .insert(code.clone(), StatusRecord::not_started(code.clone()));
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn reset_status(&self) -> Result<u64> {
        let mut changed = 0;
        for mut item in self.items.iter_mut() {
            if item.status != ProcessingStatus::NotStarted {
                item.status = ProcessingStatus::NotStarted;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn reset_data(&self) -> Result<u64> {
        let mut changed = 0;
        for mut item in self.items.iter_mut() {
            if item.update_at.is_some() {
                item.create_at = None;
                item.data = None;
                item.update_at = None;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn item_count(&self) -> Result<u64> {
        Ok(self.items.len() as u64)
    }
}
