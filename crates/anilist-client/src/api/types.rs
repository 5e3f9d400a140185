//! AniList response types.
//!
//! These types represent the JSON responses of the queries in
//! [`crate::query::template`], plus the domain shapes they are turned into.

use crate::query::{FuzzyDate, MediaFormat, MediaListStatus, MediaSeason, MediaStatus, MediaType};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// Matches HTML tags in descriptions
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// GraphQL response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub status: Option<u16>,
}

/// Fuzzy date that only counts when all three parts are known
fn fuzzy_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FuzzyDate>::deserialize(deserializer)?.and_then(|date| date.to_date()))
}

/// Scores of 0 mean "not scored"
fn nonzero_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.filter(|score| *score != 0.0))
}

/// Media titles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaTitle {
    pub english: Option<String>,
    pub romaji: Option<String>,
}

impl MediaTitle {
    /// English title, falling back to romaji
    pub fn preferred(&self) -> &str {
        self.english
            .as_deref()
            .or(self.romaji.as_deref())
            .unwrap_or("<untitled>")
    }
}

/// The logged-in user's list entry for a media
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerListEntry {
    pub id: Option<i64>,
    pub status: Option<MediaListStatus>,
    pub progress: Option<u32>,
    #[serde(default, deserialize_with = "nonzero_score")]
    pub score: Option<f64>,
}

/// Pagination metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: Option<u32>,
    pub current_page: Option<u32>,
    pub last_page: Option<u32>,
    pub has_next_page: Option<bool>,
    pub per_page: Option<u32>,
}

/// `Page` query data
#[derive(Debug, Clone, Deserialize)]
pub struct PageData {
    #[serde(rename = "Page")]
    pub page: PageNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNode {
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde(default)]
    pub media: Vec<MediaNode>,
}

/// Media preview as returned by the search query
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaNode {
    pub id: i64,
    #[serde(default)]
    pub title: MediaTitle,
    pub status: Option<MediaStatus>,
    pub popularity: Option<u32>,
    pub average_score: Option<u32>,
    pub episodes: Option<u32>,
    pub chapters: Option<u32>,
    pub volumes: Option<u32>,
    pub format: Option<MediaFormat>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub media_list_entry: Option<ViewerListEntry>,
}

/// Fields every media preview has
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaCommon {
    pub id: i64,
    pub title: MediaTitle,
    pub status: Option<MediaStatus>,
    pub popularity: Option<u32>,
    pub average_score: Option<u32>,
    pub format: Option<MediaFormat>,
    pub list_entry: Option<ViewerListEntry>,
}

/// Media preview, by media type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum MediaSummary {
    Anime {
        #[serde(flatten)]
        common: MediaCommon,
        episodes: Option<u32>,
    },
    Manga {
        #[serde(flatten)]
        common: MediaCommon,
        chapters: Option<u32>,
        volumes: Option<u32>,
    },
}

impl MediaSummary {
    pub fn common(&self) -> &MediaCommon {
        match self {
            MediaSummary::Anime { common, .. } | MediaSummary::Manga { common, .. } => common,
        }
    }

    pub fn id(&self) -> i64 {
        self.common().id
    }

    pub fn title(&self) -> &MediaTitle {
        &self.common().title
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            MediaSummary::Anime { .. } => MediaType::Anime,
            MediaSummary::Manga { .. } => MediaType::Manga,
        }
    }

    pub fn list_entry(&self) -> Option<&ViewerListEntry> {
        self.common().list_entry.as_ref()
    }

    /// Episodes for anime, chapters for manga
    pub fn length(&self) -> Option<u32> {
        match self {
            MediaSummary::Anime { episodes, .. } => *episodes,
            MediaSummary::Manga { chapters, .. } => *chapters,
        }
    }
}

impl From<MediaNode> for MediaSummary {
    fn from(node: MediaNode) -> Self {
        let common = MediaCommon {
            id: node.id,
            title: node.title,
            status: node.status,
            popularity: node.popularity,
            average_score: node.average_score,
            format: node.format,
            list_entry: node.media_list_entry,
        };

        match node.media_type {
            MediaType::Anime => MediaSummary::Anime {
                common,
                episodes: node.episodes,
            },
            MediaType::Manga => MediaSummary::Manga {
                common,
                chapters: node.chapters,
                volumes: node.volumes,
            },
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub media: Vec<MediaSummary>,
    pub page_info: PageInfo,
}

impl From<PageData> for SearchResults {
    fn from(data: PageData) -> Self {
        Self {
            media: data.page.media.into_iter().map(MediaSummary::from).collect(),
            page_info: data.page.page_info,
        }
    }
}

/// `Media` query data
#[derive(Debug, Clone, Deserialize)]
pub struct MediaData {
    #[serde(rename = "Media")]
    pub media: MediaDetailsNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

impl<T> Default for Nodes<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiringEpisode {
    pub airing_at: i64,
    pub episode: u32,
    pub time_until_airing: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRanking {
    pub all_time: Option<bool>,
    pub context: String,
    pub format: Option<MediaFormat>,
    pub rank: u32,
    pub season: Option<MediaSeason>,
    #[serde(rename = "type")]
    pub ranking_type: String,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedMedia {
    pub id: i64,
    #[serde(default)]
    pub title: MediaTitle,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationNode {
    pub rating: Option<i32>,
    pub media_recommendation: Option<RelatedMedia>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub rating: Option<i32>,
    pub media: RelatedMedia,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Studio {
    pub name: String,
    pub is_animation_studio: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTag {
    pub name: String,
    #[serde(default)]
    pub is_general_spoiler: bool,
    #[serde(default)]
    pub is_media_spoiler: bool,
}

/// Media detail as returned by the details query
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDetailsNode {
    pub id: i64,
    pub id_mal: Option<i64>,
    pub next_airing_episode: Option<AiringEpisode>,
    #[serde(default)]
    pub title: MediaTitle,
    pub average_score: Option<u32>,
    pub mean_score: Option<u32>,
    pub chapters: Option<u32>,
    pub volumes: Option<u32>,
    pub episodes: Option<u32>,
    pub duration: Option<u32>,
    pub country_of_origin: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "fuzzy_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "fuzzy_date")]
    pub end_date: Option<NaiveDate>,
    pub favourites: Option<u32>,
    pub format: Option<MediaFormat>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub media_list_entry: Option<ViewerListEntry>,
    pub popularity: Option<u32>,
    #[serde(default)]
    pub rankings: Vec<MediaRanking>,
    #[serde(default)]
    pub relations: Nodes<RelatedMedia>,
    #[serde(default)]
    pub recommendations: Nodes<RecommendationNode>,
    pub season: Option<MediaSeason>,
    pub season_year: Option<i32>,
    pub source: Option<String>,
    pub status: Option<MediaStatus>,
    #[serde(default)]
    pub studios: Nodes<Studio>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub tags: Vec<MediaTag>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}

/// Fields only one media type has
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum MediaVariant {
    Anime {
        episodes: Option<u32>,
        duration: Option<u32>,
        next_airing_episode: Option<AiringEpisode>,
        season: Option<MediaSeason>,
        season_year: Option<i32>,
        studios: Vec<Studio>,
    },
    Manga {
        chapters: Option<u32>,
        volumes: Option<u32>,
    },
}

/// Full media detail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaDetails {
    pub id: i64,
    pub id_mal: Option<i64>,
    pub title: MediaTitle,
    pub status: Option<MediaStatus>,
    pub format: Option<MediaFormat>,
    pub average_score: Option<u32>,
    pub mean_score: Option<u32>,
    pub popularity: Option<u32>,
    pub favourites: Option<u32>,
    pub country_of_origin: Option<String>,
    pub source: Option<String>,
    /// Plain text, HTML tags removed
    pub description: Option<String>,
    /// Upper snake case, e.g. `SLICE_OF_LIFE`
    pub genres: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub synonyms: Vec<String>,
    pub tags: Vec<MediaTag>,
    pub rankings: Vec<MediaRanking>,
    pub relations: Vec<RelatedMedia>,
    pub recommendations: Vec<Recommendation>,
    pub list_entry: Option<ViewerListEntry>,
    #[serde(flatten)]
    pub variant: MediaVariant,
}

impl MediaDetails {
    pub fn media_type(&self) -> MediaType {
        match self.variant {
            MediaVariant::Anime { .. } => MediaType::Anime,
            MediaVariant::Manga { .. } => MediaType::Manga,
        }
    }
}

/// Strip HTML tags
pub fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").into_owned()
}

/// "Slice of Life" -> "SLICE_OF_LIFE", "Sci-Fi" -> "SCI_FI"
pub fn normalize_genre(genre: &str) -> String {
    genre
        .to_uppercase()
        .replace('-', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

impl From<MediaDetailsNode> for MediaDetails {
    fn from(node: MediaDetailsNode) -> Self {
        let variant = match node.media_type {
            MediaType::Anime => MediaVariant::Anime {
                episodes: node.episodes,
                duration: node.duration,
                next_airing_episode: node.next_airing_episode,
                season: node.season,
                season_year: node.season_year,
                studios: node.studios.nodes,
            },
            MediaType::Manga => MediaVariant::Manga {
                chapters: node.chapters,
                volumes: node.volumes,
            },
        };

        Self {
            id: node.id,
            id_mal: node.id_mal,
            title: node.title,
            status: node.status,
            format: node.format,
            average_score: node.average_score,
            mean_score: node.mean_score,
            popularity: node.popularity,
            favourites: node.favourites,
            country_of_origin: node.country_of_origin,
            source: node.source,
            description: node.description.as_deref().map(strip_html),
            genres: node.genres.iter().map(|g| normalize_genre(g)).collect(),
            start_date: node.start_date,
            end_date: node.end_date,
            synonyms: node.synonyms,
            tags: node.tags,
            rankings: node.rankings,
            relations: node.relations.nodes,
            recommendations: node
                .recommendations
                .nodes
                .into_iter()
                .filter_map(|r| {
                    r.media_recommendation.map(|media| Recommendation {
                        rating: r.rating,
                        media,
                    })
                })
                .collect(),
            list_entry: node.media_list_entry,
            variant,
        }
    }
}

/// `MediaListCollection` query data
#[derive(Debug, Clone, Deserialize)]
pub struct MediaListCollectionData {
    #[serde(rename = "MediaListCollection")]
    pub collection: MediaListCollection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaListCollection {
    pub has_next_chunk: Option<bool>,
    #[serde(default)]
    pub lists: Vec<MediaListGroup>,
}

/// One named list of a collection ("Watching", "Completed", custom lists)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaListGroup {
    pub name: String,
    pub status: Option<MediaListStatus>,
    #[serde(default)]
    pub entries: Vec<MediaListEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedMedia {
    pub id: i64,
    #[serde(default)]
    pub title: MediaTitle,
    pub chapters: Option<u32>,
    pub volumes: Option<u32>,
    pub episodes: Option<u32>,
    #[serde(default)]
    pub is_favourite: bool,
    pub status: Option<MediaStatus>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaListEntry {
    pub id: i64,
    pub media_id: i64,
    pub status: Option<MediaListStatus>,
    pub media: ListedMedia,
    #[serde(default, deserialize_with = "fuzzy_date")]
    pub started_at: Option<NaiveDate>,
    #[serde(default, deserialize_with = "fuzzy_date")]
    pub completed_at: Option<NaiveDate>,
    #[serde(default, deserialize_with = "nonzero_score")]
    pub score: Option<f64>,
    pub repeat: Option<u32>,
    pub progress: Option<u32>,
    pub progress_volumes: Option<u32>,
    pub notes: Option<String>,
}

impl MediaListGroup {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `SaveMediaListEntry` mutation data
#[derive(Debug, Clone, Deserialize)]
pub struct SaveListEntryData {
    #[serde(rename = "SaveMediaListEntry")]
    pub entry: SavedListEntry,
}

/// List entry as stored after an update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedListEntry {
    pub id: i64,
    pub media_id: i64,
    pub status: Option<MediaListStatus>,
    #[serde(default, deserialize_with = "nonzero_score")]
    pub score: Option<f64>,
    pub progress: Option<u32>,
    pub progress_volumes: Option<u32>,
    pub repeat: Option<u32>,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "fuzzy_date")]
    pub started_at: Option<NaiveDate>,
    #[serde(default, deserialize_with = "fuzzy_date")]
    pub completed_at: Option<NaiveDate>,
}

/// `Viewer` query data
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerData {
    #[serde(rename = "Viewer")]
    pub viewer: Viewer,
}

/// The logged-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub id: i64,
    pub name: String,
    pub site_url: Option<String>,
    pub avatar: Option<Avatar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    pub large: Option<String>,
}
