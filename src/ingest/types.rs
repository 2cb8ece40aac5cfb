// src/ingest/types.rs
use anyhow::Result;

use crate::category::Category;
use crate::news::NewsItem;

/// One branch of the fan-out: produces items for a single category.
///
/// Errors are allowed here; the aggregator turns them (and timeouts) into an
/// empty branch so one failing category never wipes the others.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self, category: Category) -> Result<Vec<NewsItem>>;
    fn name(&self) -> &'static str;
}
