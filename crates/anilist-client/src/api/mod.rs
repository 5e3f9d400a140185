//! AniList GraphQL API client.
//!
//! Reads go through the request cache; mutations bypass it and advance the
//! mutation epoch.

pub mod client;
pub mod error;
pub mod types;

pub use client::{AnilistClient, ANILIST_URL};
pub use error::ApiError;
pub use types::*;
