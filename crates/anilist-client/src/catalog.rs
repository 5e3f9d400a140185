//! High-level catalog operations.
//!
//! Each operation builds a filter, turns it into a query, runs it through
//! [`AnilistClient`] and maps the payload into domain types.

use crate::api::error::ApiError;
use crate::api::types::{
    GraphQlResponse, MediaData, MediaDetails, MediaListCollectionData, MediaListGroup, MediaSummary,
    PageData, SaveListEntryData, SavedListEntry, SearchResults, Viewer,
};
use crate::api::AnilistClient;
use crate::changes::{ListEntryChanges, ListEntryUpdate};
use crate::query::template::{MEDIA_DETAILS, MEDIA_LIST_COLLECTION, MEDIA_PAGE, SAVE_LIST_ENTRY};
use crate::query::{
    build, BuildOptions, MediaFilter, MediaListFilter, MediaListStatus, MediaSort, MediaStatus,
    MediaType, PageFilter,
};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

/// Catalog facade over the AniList API
pub struct Catalog {
    client: AnilistClient,
    per_page: u32,
}

/// Decode a payload, turning missing data into [`ApiError`]s
fn extract<T: DeserializeOwned>(operation: &str, payload: Option<Value>) -> Result<T> {
    let payload = payload.ok_or_else(|| ApiError::NoData {
        operation: operation.to_string(),
    })?;

    let response: GraphQlResponse<T> = serde_json::from_value(payload)
        .with_context(|| format!("Failed to parse {} response", operation))?;

    match response.data {
        Some(data) => Ok(data),
        None if !response.errors.is_empty() => Err(ApiError::GraphQl {
            operation: operation.to_string(),
            messages: response
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        }
        .into()),
        None => Err(ApiError::NoData {
            operation: operation.to_string(),
        }
        .into()),
    }
}

impl Catalog {
    pub fn new(client: AnilistClient, per_page: u32) -> Self {
        Self { client, per_page }
    }

    pub fn client(&self) -> &AnilistClient {
        &self.client
    }

    fn options(&self) -> BuildOptions {
        BuildOptions {
            authenticated: self.client.is_authenticated(),
        }
    }

    /// Log in with an existing access token
    pub async fn login(&mut self, token: impl Into<String>) -> Result<Option<Viewer>> {
        self.client.login(token).await
    }

    /// One page of media matching `filter`
    pub async fn search(&self, filter: &MediaFilter, page: &PageFilter) -> Result<SearchResults> {
        let built = build(&MEDIA_PAGE, filter, Some(page), self.options())?;
        let data: PageData = extract("search", self.client.query(&built).await?)?;
        let results = SearchResults::from(data);

        info!(results = results.media.len(), "Search complete");
        Ok(results)
    }

    async fn first_page(&self, filter: MediaFilter) -> Result<Vec<MediaSummary>> {
        let page = PageFilter::new(1, self.per_page);
        Ok(self.search(&filter, &page).await?.media)
    }

    /// Currently trending media
    pub async fn trending(&self, media_type: MediaType) -> Result<Vec<MediaSummary>> {
        self.first_page(MediaFilter {
            media_type: Some(media_type),
            sort_by: Some(vec![MediaSort::TrendingDesc]),
            ..Default::default()
        })
        .await
    }

    /// Most popular media of all time
    pub async fn all_time_popular(&self, media_type: MediaType) -> Result<Vec<MediaSummary>> {
        self.first_page(MediaFilter {
            media_type: Some(media_type),
            sort_by: Some(vec![MediaSort::PopularityDesc]),
            ..Default::default()
        })
        .await
    }

    /// Trending media that are currently releasing
    pub async fn seasonal(&self, media_type: MediaType) -> Result<Vec<MediaSummary>> {
        self.first_page(MediaFilter {
            media_type: Some(media_type),
            media_status: Some(MediaStatus::Releasing),
            sort_by: Some(vec![MediaSort::TrendingDesc]),
            ..Default::default()
        })
        .await
    }

    /// Popular media that have not been released yet
    pub async fn upcoming(&self, media_type: MediaType) -> Result<Vec<MediaSummary>> {
        self.first_page(MediaFilter {
            media_type: Some(media_type),
            media_status: Some(MediaStatus::NotYetReleased),
            sort_by: Some(vec![MediaSort::PopularityDesc]),
            ..Default::default()
        })
        .await
    }

    /// Full details of one media
    pub async fn media_details(&self, media_id: i32) -> Result<MediaDetails> {
        let built = build(&MEDIA_DETAILS, &MediaFilter::by_id(media_id), None, self.options())?;
        let data: MediaData = extract("media details", self.client.query(&built).await?)?;
        Ok(MediaDetails::from(data.media))
    }

    /// A user's lists of one media type, restricted to `statuses` when given
    pub async fn media_list(
        &self,
        user_name: &str,
        media_type: MediaType,
        statuses: &[MediaListStatus],
    ) -> Result<Vec<MediaListGroup>> {
        let filter = MediaListFilter {
            user_name: Some(user_name.to_string()),
            media_type: Some(media_type),
            status_in: (!statuses.is_empty()).then(|| statuses.to_vec()),
            sort_by: None,
        };

        let built = build(&MEDIA_LIST_COLLECTION, &filter, None, self.options())?;
        let data: MediaListCollectionData = extract("media list", self.client.query(&built).await?)?;

        info!(user = user_name, lists = data.collection.lists.len(), "Fetched media lists");
        Ok(data.collection.lists)
    }

    /// Apply changes to the logged-in user's list entry for a media
    ///
    /// Creates the entry if the media is not on a list yet.
    pub async fn update_list_entry(
        &mut self,
        media_id: i32,
        changes: &ListEntryChanges,
    ) -> Result<SavedListEntry> {
        if !self.client.is_authenticated() {
            return Err(ApiError::NotAuthenticated("updating a list entry").into());
        }

        let update = ListEntryUpdate { media_id, changes };
        let built = build(&SAVE_LIST_ENTRY, &update, None, BuildOptions::default())?;
        let data: SaveListEntryData = extract("list entry update", self.client.mutate(&built).await?)?;

        info!(media_id, epoch = self.client.epoch(), "List entry updated");
        Ok(data.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ViewerData;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_extract_data() {
        let viewer: ViewerData = extract(
            "viewer",
            Some(json!({ "data": { "Viewer": { "id": 1, "name": "alice" } } })),
        )
        .unwrap();
        assert_eq!(viewer.viewer.name, "alice");
    }

    #[test]
    fn test_extract_missing_payload() {
        let err = extract::<ViewerData>("viewer", None).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ApiError>(),
            Some(&ApiError::NoData {
                operation: "viewer".to_string()
            })
        );
    }

    #[test]
    fn test_extract_graphql_errors() {
        let err = extract::<ViewerData>(
            "viewer",
            Some(json!({ "data": null, "errors": [{ "message": "a" }, { "message": "b" }] })),
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ApiError>(),
            Some(&ApiError::GraphQl {
                operation: "viewer".to_string(),
                messages: "a; b".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_update_requires_login() {
        let client = AnilistClient::new("http://127.0.0.1:9", Duration::from_secs(1), "test", None).unwrap();
        let mut catalog = Catalog::new(client, 50);
        let changes = ListEntryChanges::builder().progress(1).build().unwrap();

        let err = catalog.update_list_entry(1, &changes).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::NotAuthenticated(_))
        ));
        assert_eq!(catalog.client().epoch(), 0);
    }
}
