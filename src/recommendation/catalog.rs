//! Content Catalog
//!
//! Immutable collection of validated content plus lookup indices by id,
//! eligible week and topic. The index is built lazily, exactly once per
//! catalog instance, even when the first lookups race from several threads.
//! After that every read is lock-free.

use once_cell::sync::OnceCell;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::content::ContentItem;
use crate::error::{Error, Result};

/// Curriculum length; weeks outside 1..=MAX_WEEK are never queried
pub const MAX_WEEK: u32 = 30;

/// Lookup tables holding positions into the catalog's item list
#[derive(Debug, Default)]
pub struct CatalogIndex {
    by_id: HashMap<String, usize>,
    by_week: HashMap<u32, Vec<usize>>,
    by_topic: HashMap<String, Vec<usize>>,
}

impl CatalogIndex {
    fn build(items: &[ContentItem]) -> Self {
        let mut index = CatalogIndex::default();

        for (pos, item) in items.iter().enumerate() {
            index.by_id.insert(item.id.clone(), pos);

            let first = item.eligible_weeks.start.max(1);
            let last = item.eligible_weeks.end.min(MAX_WEEK);
            for week in first..=last {
                index.by_week.entry(week).or_default().push(pos);
            }

            for topic in &item.topics {
                index.by_topic.entry(topic.to_lowercase()).or_default().push(pos);
            }
        }

        debug!(
            "Built catalog index: {} ids, {} weeks, {} topics",
            index.by_id.len(),
            index.week_count(),
            index.topic_count()
        );
        index
    }

    pub fn week_count(&self) -> usize {
        self.by_week.len()
    }

    pub fn topic_count(&self) -> usize {
        self.by_topic.len()
    }
}

/// Read-only catalog shared by every recommendation call
#[derive(Debug)]
pub struct ContentCatalog {
    items: Vec<ContentItem>,
    index: OnceCell<CatalogIndex>,
}

impl ContentCatalog {
    /// Validate every item and take ownership of the list
    ///
    /// Fails on the first item that breaks an invariant or reuses an id.
    pub fn new(items: Vec<ContentItem>) -> Result<Self> {
        let mut ids = HashSet::with_capacity(items.len());
        let mut validated = Vec::with_capacity(items.len());

        for item in items {
            let item = item.validated()?;
            if !ids.insert(item.id.clone()) {
                return Err(Error::DuplicateContentId { id: item.id });
            }
            validated.push(item);
        }

        info!("📚 Content catalog loaded with {} items", validated.len());

        Ok(Self {
            items: validated,
            index: OnceCell::new(),
        })
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            index: OnceCell::new(),
        }
    }

    /// Build the lookup index if it does not exist yet
    ///
    /// Repeated and concurrent calls return the same index; the build
    /// closure runs at most once.
    pub fn build_index(&self) -> &CatalogIndex {
        self.index.get_or_init(|| CatalogIndex::build(&self.items))
    }

    pub fn is_indexed(&self) -> bool {
        self.index.get().is_some()
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ContentItem> {
        self.build_index()
            .by_id
            .get(id)
            .map(|&pos| &self.items[pos])
    }

    /// Items indexed for `week`, or the whole catalog when the week has no entry
    pub fn candidates_for_week(&self, week: u32) -> Vec<&ContentItem> {
        match self.build_index().by_week.get(&week) {
            Some(positions) => positions.iter().map(|&pos| &self.items[pos]).collect(),
            None => self.items.iter().collect(),
        }
    }

    pub fn items_for_topic(&self, topic: &str) -> Vec<&ContentItem> {
        self.build_index()
            .by_topic
            .get(&topic.to_lowercase())
            .map(|positions| positions.iter().map(|&pos| &self.items[pos]).collect())
            .unwrap_or_default()
    }

    /// Distinct topics in catalog order
    pub fn topics(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .flat_map(|item| item.topics.iter())
            .filter(|topic| seen.insert(topic.as_str()))
            .cloned()
            .collect()
    }
}
