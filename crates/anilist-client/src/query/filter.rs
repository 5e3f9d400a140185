//! Filters: sparse sets of typed query parameters.
//!
//! A filter lists its populated fields, in declaration order, as
//! [`Binding`]s. Each field carries its internal name, its wire name, and a
//! GraphQL type fixed by the field's Rust type.

use super::error::QueryError;
use super::types::{
    GraphQlInput, GraphQlType, MediaFormat, MediaListSort, MediaListStatus, MediaSeason, MediaSort,
    MediaStatus, MediaType,
};
use serde_json::{Map, Value};

/// A populated filter field bound to a GraphQL variable
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Field name on the Rust side
    pub field: String,
    /// Name in the remote schema, also used as the variable name
    pub name: String,
    pub graphql_type: GraphQlType,
    pub value: Value,
}

/// Ordered collection of bindings with unique variable names
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    bindings: Vec<Binding>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a field if it is populated
    pub fn push<T: GraphQlInput>(
        &mut self,
        field: &str,
        wire_name: &str,
        value: Option<&T>,
    ) -> Result<&mut Self, QueryError> {
        let Some(value) = value else {
            return Ok(self);
        };

        if value.is_empty_list() {
            return Err(QueryError::EmptyList {
                field: field.to_string(),
            });
        }

        self.insert(Binding {
            field: field.to_string(),
            name: wire_name.to_string(),
            graphql_type: T::graphql_type(),
            value: value.to_variable(),
        })?;

        Ok(self)
    }

    /// Add an already classified binding
    pub fn insert(&mut self, binding: Binding) -> Result<(), QueryError> {
        if self.bindings.iter().any(|b| b.name == binding.name) {
            return Err(QueryError::DuplicateVariable { name: binding.name });
        }
        self.bindings.push(binding);
        Ok(())
    }

    /// Append every binding of `other`, keeping names unique
    pub fn extend(&mut self, other: FieldSet) -> Result<(), QueryError> {
        for binding in other.bindings {
            self.insert(binding)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn into_bindings(self) -> Vec<Binding> {
        self.bindings
    }
}

/// Anything that can supply query variables
pub trait Filter {
    /// Populated fields, in declaration order
    fn fields(&self) -> Result<FieldSet, QueryError>;

    /// Media type the filter is restricted to, if any
    fn media_type(&self) -> Option<MediaType> {
        None
    }
}

/// Media search filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaFilter {
    pub media_id: Option<i32>,
    pub season: Option<MediaSeason>,
    pub season_year: Option<i32>,
    pub media_type: Option<MediaType>,
    pub media_format: Option<MediaFormat>,
    pub media_status: Option<MediaStatus>,
    pub episodes: Option<i32>,
    pub duration: Option<i32>,
    pub chapters: Option<i32>,
    pub volumes: Option<i32>,
    pub on_list: Option<bool>,
    pub average_score: Option<i32>,
    pub popularity: Option<i32>,
    pub search_string: Option<String>,
    pub genre_in: Option<Vec<String>>,
    pub genre_not_in: Option<Vec<String>>,
    pub tag_in: Option<Vec<String>>,
    pub tag_not_in: Option<Vec<String>>,
    pub sort_by: Option<Vec<MediaSort>>,
}

impl MediaFilter {
    /// Filter selecting a single media by id
    pub fn by_id(media_id: i32) -> Self {
        Self {
            media_id: Some(media_id),
            ..Default::default()
        }
    }
}

impl Filter for MediaFilter {
    fn fields(&self) -> Result<FieldSet, QueryError> {
        let mut fields = FieldSet::new();
        fields
            .push("media_id", "id", self.media_id.as_ref())?
            .push("season", "season", self.season.as_ref())?
            .push("season_year", "seasonYear", self.season_year.as_ref())?
            .push("media_type", "type", self.media_type.as_ref())?
            .push("media_format", "format", self.media_format.as_ref())?
            .push("media_status", "status", self.media_status.as_ref())?
            .push("episodes", "episodes", self.episodes.as_ref())?
            .push("duration", "duration", self.duration.as_ref())?
            .push("chapters", "chapters", self.chapters.as_ref())?
            .push("volumes", "volumes", self.volumes.as_ref())?
            .push("on_list", "onList", self.on_list.as_ref())?
            .push("average_score", "averageScore", self.average_score.as_ref())?
            .push("popularity", "popularity", self.popularity.as_ref())?
            .push("search_string", "search", self.search_string.as_ref())?
            .push("genre_in", "genre_in", self.genre_in.as_ref())?
            .push("genre_not_in", "genre_not_in", self.genre_not_in.as_ref())?
            .push("tag_in", "tag_in", self.tag_in.as_ref())?
            .push("tag_not_in", "tag_not_in", self.tag_not_in.as_ref())?
            .push("sort_by", "sort", self.sort_by.as_ref())?;
        Ok(fields)
    }

    fn media_type(&self) -> Option<MediaType> {
        self.media_type
    }
}

/// Filter for a user's list collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaListFilter {
    pub user_name: Option<String>,
    pub media_type: Option<MediaType>,
    pub status_in: Option<Vec<MediaListStatus>>,
    pub sort_by: Option<Vec<MediaListSort>>,
}

impl Filter for MediaListFilter {
    fn fields(&self) -> Result<FieldSet, QueryError> {
        let mut fields = FieldSet::new();
        fields
            .push("user_name", "userName", self.user_name.as_ref())?
            .push("media_type", "type", self.media_type.as_ref())?
            .push("status_in", "status_in", self.status_in.as_ref())?
            .push("sort_by", "sort", self.sort_by.as_ref())?;
        Ok(fields)
    }

    fn media_type(&self) -> Option<MediaType> {
        self.media_type
    }
}

/// Pagination parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFilter {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Default for PageFilter {
    fn default() -> Self {
        Self {
            page: Some(1),
            per_page: Some(50),
        }
    }
}

impl PageFilter {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }
}

impl Filter for PageFilter {
    fn fields(&self) -> Result<FieldSet, QueryError> {
        let mut fields = FieldSet::new();
        fields
            .push("page", "page", self.page.as_ref())?
            .push("per_page", "perPage", self.per_page.as_ref())?;
        Ok(fields)
    }
}

/// Filter over raw JSON values, classified at build time
///
/// Values may carry an explicit type (needed for enums, which look like
/// plain strings in JSON). Nulls count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFilter {
    entries: Vec<(String, Value, Option<GraphQlType>)>,
}

impl RawFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value whose type is inferred from its JSON shape
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.entries.push((name.into(), value, None));
        self
    }

    /// Add a value with a declared type
    pub fn insert_typed(
        &mut self,
        name: impl Into<String>,
        graphql_type: GraphQlType,
        value: Value,
    ) -> &mut Self {
        self.entries.push((name.into(), value, Some(graphql_type)));
        self
    }
}

impl From<Map<String, Value>> for RawFilter {
    fn from(map: Map<String, Value>) -> Self {
        let mut filter = RawFilter::new();
        for (name, value) in map {
            filter.insert(name, value);
        }
        filter
    }
}

impl Filter for RawFilter {
    fn fields(&self) -> Result<FieldSet, QueryError> {
        let mut fields = FieldSet::new();
        for (name, value, declared) in &self.entries {
            if value.is_null() {
                continue;
            }
            if value.as_array().is_some_and(|items| items.is_empty()) {
                return Err(QueryError::EmptyList { field: name.clone() });
            }
            let graphql_type = match declared {
                Some(graphql_type) => graphql_type.clone(),
                None => GraphQlType::classify(name, value)?,
            };
            fields.insert(Binding {
                field: name.clone(),
                name: name.clone(),
                graphql_type,
                value: value.clone(),
            })?;
        }
        Ok(fields)
    }
}
