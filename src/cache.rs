use std::future::Future;

use anyhow::Result;
use tracing::debug;

/// One script link on the IMSDb "all scripts" listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: String,
    pub href: String,
}

/// The listing page is fetched at most once per run. The owner passes it
/// by `&mut` to whatever needs it; nothing is shared behind a global.
#[derive(Debug, Default)]
pub enum ListingCache {
    #[default]
    Empty,
    Populated(Vec<ListingEntry>),
}

impl ListingCache {
    pub fn new() -> Self {
        ListingCache::Empty
    }

    pub fn is_populated(&self) -> bool {
        matches!(self, ListingCache::Populated(_))
    }

    /// Entries, fetching them with `fetch` on first use. A failed fetch
    /// leaves the cache empty so a later call can retry.
    pub async fn get_or_fetch<F, Fut>(&mut self, fetch: F) -> Result<&[ListingEntry]>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ListingEntry>>>,
    {
        if let ListingCache::Empty = self {
            let entries = fetch().await?;
            debug!(entries = entries.len(), "listing cache populated");
            *self = ListingCache::Populated(entries);
        }
        Ok(self.entries())
    }

    pub fn entries(&self) -> &[ListingEntry] {
        match self {
            ListingCache::Populated(entries) => entries,
            ListingCache::Empty => &[],
        }
    }
}

// ── Tests ──
