//! Feed reconciliation: the remote catalog merged with local like state.
//!
//! The reconciler is driven by UI events (search keystroke, scroll, like
//! click) and owns no reactivity of its own: after any mutation the caller
//! re-requests [`FeedReconciler::items`], which re-reads the liked set and
//! counters from the store. State machine: `Loading -> Ready`, with search
//! and like events as self-transitions on `Ready`. There is no error state;
//! a failed fetch lands in `Ready` with an empty result set.

use std::time::Duration;

use url::Url;

use crate::catalog::{CatalogCache, CatalogProvider, Meme};
use crate::engagement::EngagementRecord;
use crate::store::StoreError;
use crate::util::Debouncer;

/// Reconciler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Loading,
    Ready,
}

/// A view-ready feed entry: the catalog meme annotated with local state.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub meme: Meme,
    pub is_liked: bool,
    pub like_count: u64,
    /// Whether the image host is on the configured allow-list. Hosts outside
    /// it are still listed but flagged so the view can skip rendering them.
    pub display_allowed: bool,
}

/// Composes the catalog cache with the engagement record to produce the
/// view-ready meme list, and drives load / search / like operations.
pub struct FeedReconciler {
    provider: CatalogProvider,
    catalog: CatalogCache,
    engagement: EngagementRecord,
    state: FeedState,
    /// Last applied filter result, in catalog order.
    filtered: Vec<Meme>,
    /// Last applied query text.
    query: String,
    /// Keystroke not yet applied; superseded by newer keystrokes.
    pending_query: Option<String>,
    debounce: Debouncer,
    allowed_hosts: Vec<String>,
}

impl FeedReconciler {
    pub fn new(
        provider: CatalogProvider,
        engagement: EngagementRecord,
        search_debounce: Duration,
        allowed_hosts: Vec<String>,
    ) -> Self {
        Self {
            provider,
            catalog: CatalogCache::default(),
            engagement,
            state: FeedState::Loading,
            filtered: Vec::new(),
            query: String::new(),
            pending_query: None,
            debounce: Debouncer::new(search_debounce),
            allowed_hosts,
        }
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    /// Whether the view should offer a "load more" affordance.
    pub fn has_more(&self) -> bool {
        self.catalog.has_more()
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Fetch the catalog and seed both the unfiltered and filtered views.
    ///
    /// A fetch failure is absorbed: the reconciler still transitions to
    /// `Ready`, with empty lists and `has_more` false. The failure is a log
    /// line, never an error the view has to handle.
    pub async fn load_initial(&mut self) {
        match self.catalog.refresh(&self.provider).await {
            Ok(memes) => {
                self.filtered = memes.to_vec();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Catalog fetch failed, serving empty feed");
                self.catalog.mark_exhausted();
                self.filtered.clear();
            }
        }
        self.query.clear();
        self.state = FeedState::Ready;
    }

    /// Client-side "load more". The provider returned its whole catalog in
    /// the initial response, so there is nothing further to fetch: this is a
    /// no-op that reports whether anything new was appended (never).
    ///
    /// Pagination is visually presented upstream, but the underlying data
    /// source has no pages.
    pub fn load_more(&mut self) -> bool {
        tracing::debug!(has_more = self.catalog.has_more(), "load_more: full catalog already held");
        false
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Record a search keystroke. The filter is not evaluated yet: the
    /// debounce window coalesces rapid keystrokes, and only the last query
    /// within the window is applied when [`poll_search`](Self::poll_search)
    /// next observes an elapsed deadline.
    pub fn search(&mut self, query: &str) {
        self.pending_query = Some(query.to_string());
        self.debounce.arm();
    }

    /// Apply the pending query if its debounce window has elapsed. Returns
    /// `true` if a filter was applied. Call from the event-loop tick.
    pub fn poll_search(&mut self) -> bool {
        if !self.debounce.fire() {
            return false;
        }
        if let Some(query) = self.pending_query.take() {
            self.apply_filter(query);
            return true;
        }
        false
    }

    /// Apply a query immediately, discarding any pending debounced one
    /// (explicit submit takes priority over in-flight keystrokes).
    pub fn search_now(&mut self, query: &str) {
        self.debounce.cancel();
        self.pending_query = None;
        self.apply_filter(query.to_string());
    }

    fn apply_filter(&mut self, query: String) {
        self.filtered = self.catalog.apply_search(&query);
        tracing::debug!(query = %query, matches = self.filtered.len(), "Applied search filter");
        self.query = query;
    }

    // ========================================================================
    // Likes
    // ========================================================================

    /// Toggle the liked state for a meme; returns the new membership state.
    /// The rendered list picks the change up on the next [`items`](Self::items)
    /// call; there is no notification mechanism beyond re-reading.
    pub async fn toggle_like(&mut self, meme: &Meme) -> Result<bool, StoreError> {
        self.engagement.toggle_liked(meme).await
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// The view-ready list: each filtered catalog entry merged with its
    /// current local like state. Recomputed from the store on every call.
    pub async fn items(&self) -> Result<Vec<FeedItem>, StoreError> {
        let liked = self.engagement.liked_memes().await?;

        let mut items = Vec::with_capacity(self.filtered.len());
        for meme in &self.filtered {
            items.push(FeedItem {
                is_liked: liked.iter().any(|m| m.id == meme.id),
                like_count: self.engagement.like_count(&meme.id).await?,
                display_allowed: self.host_allowed(&meme.url),
                meme: meme.clone(),
            });
        }
        Ok(items)
    }

    /// Build-time image-domain allow-list check. An empty allow-list permits
    /// everything (useful for tests and self-hosted catalogs).
    fn host_allowed(&self, image_url: &str) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }
        match Url::parse(image_url) {
            Ok(url) => url
                .host_str()
                .map(|host| self.allowed_hosts.iter().any(|allowed| allowed == host))
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}
