//! AniList client library.
//!
//! This library builds GraphQL queries from typed filters, sends them to the
//! AniList API, and keeps responses in a SQLite request cache.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod changes;
pub mod query;

pub use api::{AnilistClient, ApiError};
pub use cache::{CacheEntry, CacheStats, Epoch, RequestCache, SetOutcome};
pub use catalog::Catalog;
pub use changes::{ChangesError, ListEntryChanges, ListEntryChangesBuilder, ListEntryUpdate};
pub use query::{build, BuildOptions, BuiltQuery, Filter, QueryError, Template};
