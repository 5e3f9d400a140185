//! GraphQL input types and the enums of the AniList schema.
//!
//! Every Rust type that can be bound to a query variable implements
//! [`GraphQlInput`], which fixes its GraphQL type at compile time and knows
//! how to put a value on the wire.

use super::error::{ParseEnumError, QueryError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// GraphQL type of a declared variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphQlType {
    Int,
    Float,
    String,
    Boolean,
    FuzzyDateInput,
    /// Schema enum, by type name
    Enum(&'static str),
    List(Box<GraphQlType>),
}

impl GraphQlType {
    /// Scalar type for a primitive kind name
    fn scalar(kind: &str) -> Option<Self> {
        match kind {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "str" => Some(Self::String),
            "bool" => Some(Self::Boolean),
            "date" => Some(Self::FuzzyDateInput),
            _ => None,
        }
    }

    /// Classify a raw JSON value
    ///
    /// Lists take the type of their first element. Objects are accepted only
    /// when they look like a fuzzy date.
    pub fn classify(field: &str, value: &Value) -> Result<Self, QueryError> {
        let unsupported = |found: &str| QueryError::UnsupportedType {
            field: field.to_string(),
            found: found.to_string(),
        };

        let kind = match value {
            Value::Array(items) => {
                let first = items.first().ok_or_else(|| QueryError::EmptyList {
                    field: field.to_string(),
                })?;
                return match Self::classify(field, first)? {
                    Self::List(_) => Err(unsupported("nested list")),
                    element => Ok(Self::List(Box::new(element))),
                };
            }
            Value::Bool(_) => "bool",
            Value::String(_) => "str",
            Value::Number(n) if n.is_i64() || n.is_u64() => "int",
            Value::Number(_) => "float",
            Value::Object(map) if is_fuzzy_date(map) => "date",
            Value::Object(_) => "object",
            Value::Null => "null",
        };

        Self::scalar(kind).ok_or_else(|| unsupported(kind))
    }
}

fn is_fuzzy_date(map: &serde_json::Map<String, Value>) -> bool {
    !map.is_empty()
        && map.iter().all(|(key, value)| {
            matches!(key.as_str(), "year" | "month" | "day") && (value.is_i64() || value.is_null())
        })
}

impl fmt::Display for GraphQlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphQlType::Int => write!(f, "Int"),
            GraphQlType::Float => write!(f, "Float"),
            GraphQlType::String => write!(f, "String"),
            GraphQlType::Boolean => write!(f, "Boolean"),
            GraphQlType::FuzzyDateInput => write!(f, "FuzzyDateInput"),
            GraphQlType::Enum(name) => write!(f, "{}", name),
            GraphQlType::List(inner) => write!(f, "[{}]", inner),
        }
    }
}

/// A Rust type that can be bound to a GraphQL variable
pub trait GraphQlInput {
    /// Declared GraphQL type
    fn graphql_type() -> GraphQlType;

    /// Wire representation of the value
    fn to_variable(&self) -> Value;

    /// True for lists with no elements
    fn is_empty_list(&self) -> bool {
        false
    }
}

impl GraphQlInput for i32 {
    fn graphql_type() -> GraphQlType {
        GraphQlType::Int
    }

    fn to_variable(&self) -> Value {
        json!(self)
    }
}

impl GraphQlInput for u32 {
    fn graphql_type() -> GraphQlType {
        GraphQlType::Int
    }

    fn to_variable(&self) -> Value {
        json!(self)
    }
}

impl GraphQlInput for f64 {
    fn graphql_type() -> GraphQlType {
        GraphQlType::Float
    }

    fn to_variable(&self) -> Value {
        json!(self)
    }
}

impl GraphQlInput for bool {
    fn graphql_type() -> GraphQlType {
        GraphQlType::Boolean
    }

    fn to_variable(&self) -> Value {
        Value::Bool(*self)
    }
}

impl GraphQlInput for String {
    fn graphql_type() -> GraphQlType {
        GraphQlType::String
    }

    fn to_variable(&self) -> Value {
        Value::String(self.clone())
    }
}

impl GraphQlInput for NaiveDate {
    fn graphql_type() -> GraphQlType {
        GraphQlType::FuzzyDateInput
    }

    fn to_variable(&self) -> Value {
        json!({ "year": self.year(), "month": self.month(), "day": self.day() })
    }
}

impl<T: GraphQlInput> GraphQlInput for Vec<T> {
    fn graphql_type() -> GraphQlType {
        GraphQlType::List(Box::new(T::graphql_type()))
    }

    fn to_variable(&self) -> Value {
        Value::Array(self.iter().map(GraphQlInput::to_variable).collect())
    }

    fn is_empty_list(&self) -> bool {
        self.is_empty()
    }
}

/// Partial date as used by the API (`FuzzyDate` / `FuzzyDateInput`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl FuzzyDate {
    /// Calendar date, when all three parts are known and valid
    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)
    }
}

impl From<NaiveDate> for FuzzyDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: Some(date.year()),
            month: Some(date.month()),
            day: Some(date.day()),
        }
    }
}

/// Declares a schema enum: the Rust enum, its wire names, and its
/// [`GraphQlInput`] impl whose type name is the enum's own name.
macro_rules! graphql_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Symbolic name used on the wire
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| ParseEnumError {
                        type_name: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }

        impl GraphQlInput for $name {
            fn graphql_type() -> GraphQlType {
                GraphQlType::Enum(stringify!($name))
            }

            fn to_variable(&self) -> Value {
                Value::String(self.as_str().to_string())
            }
        }
    };
}

graphql_enum! {
    /// Anime or manga
    MediaType {
        Anime => "ANIME",
        Manga => "MANGA",
    }
}

graphql_enum! {
    MediaSeason {
        Winter => "WINTER",
        Spring => "SPRING",
        Summer => "SUMMER",
        Fall => "FALL",
    }
}

graphql_enum! {
    MediaFormat {
        Tv => "TV",
        TvShort => "TV_SHORT",
        Movie => "MOVIE",
        Special => "SPECIAL",
        Ova => "OVA",
        Ona => "ONA",
        Music => "MUSIC",
        Manga => "MANGA",
        Novel => "NOVEL",
        OneShot => "ONE_SHOT",
    }
}

graphql_enum! {
    /// Release status of a media
    MediaStatus {
        Finished => "FINISHED",
        Releasing => "RELEASING",
        NotYetReleased => "NOT_YET_RELEASED",
        Cancelled => "CANCELLED",
        Hiatus => "HIATUS",
    }
}

graphql_enum! {
    /// Status of a media on a user's list
    MediaListStatus {
        Current => "CURRENT",
        Planning => "PLANNING",
        Completed => "COMPLETED",
        Dropped => "DROPPED",
        Paused => "PAUSED",
        Repeating => "REPEATING",
    }
}

graphql_enum! {
    /// Sort orders for media searches
    MediaSort {
        Id => "ID",
        IdDesc => "ID_DESC",
        TitleRomaji => "TITLE_ROMAJI",
        TitleRomajiDesc => "TITLE_ROMAJI_DESC",
        TitleEnglish => "TITLE_ENGLISH",
        TitleEnglishDesc => "TITLE_ENGLISH_DESC",
        Type => "TYPE",
        TypeDesc => "TYPE_DESC",
        Format => "FORMAT",
        FormatDesc => "FORMAT_DESC",
        StartDate => "START_DATE",
        StartDateDesc => "START_DATE_DESC",
        EndDate => "END_DATE",
        EndDateDesc => "END_DATE_DESC",
        Score => "SCORE",
        ScoreDesc => "SCORE_DESC",
        Popularity => "POPULARITY",
        PopularityDesc => "POPULARITY_DESC",
        Trending => "TRENDING",
        TrendingDesc => "TRENDING_DESC",
        Episodes => "EPISODES",
        EpisodesDesc => "EPISODES_DESC",
        Duration => "DURATION",
        DurationDesc => "DURATION_DESC",
        Status => "STATUS",
        StatusDesc => "STATUS_DESC",
        Chapters => "CHAPTERS",
        ChaptersDesc => "CHAPTERS_DESC",
        Volumes => "VOLUMES",
        VolumesDesc => "VOLUMES_DESC",
        UpdatedAt => "UPDATED_AT",
        UpdatedAtDesc => "UPDATED_AT_DESC",
        SearchMatch => "SEARCH_MATCH",
        Favourites => "FAVOURITES",
        FavouritesDesc => "FAVOURITES_DESC",
    }
}

graphql_enum! {
    /// Sort orders for list collections
    MediaListSort {
        MediaId => "MEDIA_ID",
        MediaIdDesc => "MEDIA_ID_DESC",
        Score => "SCORE",
        ScoreDesc => "SCORE_DESC",
        Status => "STATUS",
        StatusDesc => "STATUS_DESC",
        Progress => "PROGRESS",
        ProgressDesc => "PROGRESS_DESC",
        UpdatedTime => "UPDATED_TIME",
        UpdatedTimeDesc => "UPDATED_TIME_DESC",
        AddedTime => "ADDED_TIME",
        AddedTimeDesc => "ADDED_TIME_DESC",
        StartedOn => "STARTED_ON",
        StartedOnDesc => "STARTED_ON_DESC",
        FinishedOn => "FINISHED_ON",
        FinishedOnDesc => "FINISHED_ON_DESC",
        MediaTitleRomaji => "MEDIA_TITLE_ROMAJI",
        MediaTitleRomajiDesc => "MEDIA_TITLE_ROMAJI_DESC",
        MediaTitleEnglish => "MEDIA_TITLE_ENGLISH",
        MediaTitleEnglishDesc => "MEDIA_TITLE_ENGLISH_DESC",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_map() {
        assert_eq!(GraphQlType::scalar("int"), Some(GraphQlType::Int));
        assert_eq!(GraphQlType::scalar("float"), Some(GraphQlType::Float));
        assert_eq!(GraphQlType::scalar("str"), Some(GraphQlType::String));
        assert_eq!(GraphQlType::scalar("bool"), Some(GraphQlType::Boolean));
        assert_eq!(GraphQlType::scalar("date"), Some(GraphQlType::FuzzyDateInput));
        assert_eq!(GraphQlType::scalar("bytes"), None);
    }

    #[test]
    fn test_static_types() {
        assert_eq!(i32::graphql_type().to_string(), "Int");
        assert_eq!(NaiveDate::graphql_type().to_string(), "FuzzyDateInput");
        assert_eq!(MediaType::graphql_type().to_string(), "MediaType");
        assert_eq!(Vec::<MediaSort>::graphql_type().to_string(), "[MediaSort]");
        assert_eq!(Vec::<String>::graphql_type().to_string(), "[String]");
    }

    #[test]
    fn test_wire_values() {
        assert_eq!(MediaStatus::NotYetReleased.to_variable(), json!("NOT_YET_RELEASED"));
        assert_eq!(
            vec![MediaSort::TrendingDesc, MediaSort::FavouritesDesc].to_variable(),
            json!(["TRENDING_DESC", "FAVOURITES_DESC"])
        );

        let date = NaiveDate::from_ymd_opt(2023, 4, 9).unwrap();
        assert_eq!(date.to_variable(), json!({ "year": 2023, "month": 4, "day": 9 }));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("anime".parse::<MediaType>().unwrap(), MediaType::Anime);
        assert_eq!("not-yet-released".parse::<MediaStatus>().unwrap(), MediaStatus::NotYetReleased);
        assert_eq!("TRENDING_DESC".parse::<MediaSort>().unwrap(), MediaSort::TrendingDesc);

        let err = "novel".parse::<MediaType>().unwrap_err();
        assert_eq!(err.type_name, "MediaType");
    }

    #[test]
    fn test_classify_json() {
        assert_eq!(GraphQlType::classify("id", &json!(5)).unwrap(), GraphQlType::Int);
        assert_eq!(GraphQlType::classify("score", &json!(80.5)).unwrap(), GraphQlType::Float);
        assert_eq!(GraphQlType::classify("onList", &json!(true)).unwrap(), GraphQlType::Boolean);
        assert_eq!(
            GraphQlType::classify("genre_in", &json!(["Action", "Drama"])).unwrap().to_string(),
            "[String]"
        );
        assert_eq!(
            GraphQlType::classify("startedAt", &json!({ "year": 2020, "month": 1, "day": null }))
                .unwrap(),
            GraphQlType::FuzzyDateInput
        );
    }

    #[test]
    fn test_classify_rejects() {
        assert!(matches!(
            GraphQlType::classify("genre_in", &json!([])),
            Err(QueryError::EmptyList { .. })
        ));
        assert!(matches!(
            GraphQlType::classify("x", &json!({ "name": "a" })),
            Err(QueryError::UnsupportedType { .. })
        ));
        assert!(matches!(
            GraphQlType::classify("x", &json!([[1]])),
            Err(QueryError::UnsupportedType { .. })
        ));
        assert!(matches!(
            GraphQlType::classify("x", &Value::Null),
            Err(QueryError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_fuzzy_date() {
        let full = FuzzyDate {
            year: Some(2021),
            month: Some(10),
            day: Some(3),
        };
        assert_eq!(full.to_date(), NaiveDate::from_ymd_opt(2021, 10, 3));

        let partial = FuzzyDate {
            year: Some(2021),
            month: None,
            day: None,
        };
        assert_eq!(partial.to_date(), None);

        let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        assert_eq!(FuzzyDate::from(date).to_date(), Some(date));
    }
}
