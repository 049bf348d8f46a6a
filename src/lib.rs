//! Local engagement store and feed reconciliation engine for a meme gallery.
//!
//! The library reconciles a remotely fetched catalog with locally persisted
//! user actions (likes, comments, uploads, profile edits) and derives
//! aggregate views from a client-side key-value store with no server
//! authority. Rendering, routing, and theming live with the caller; the
//! binary in this crate is just a thin CLI driver.

pub mod caption;
pub mod catalog;
pub mod comments;
pub mod config;
pub mod engagement;
pub mod feed;
pub mod gallery;
pub mod leaderboard;
pub mod profile;
pub mod store;
pub mod util;

pub use caption::CaptionProvider;
pub use catalog::{CatalogCache, CatalogProvider, FetchError, Meme};
pub use comments::CommentLog;
pub use config::Config;
pub use engagement::EngagementRecord;
pub use feed::{FeedItem, FeedReconciler, FeedState};
pub use gallery::{UploadGallery, UploadedMeme};
pub use leaderboard::LeaderboardAggregator;
pub use profile::{Profile, ProfileRecord};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, Store, StoreError};
