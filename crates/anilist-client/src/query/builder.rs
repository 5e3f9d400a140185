//! Filter-to-query translation.

use super::error::QueryError;
use super::filter::{Binding, Filter, PageFilter};
use super::template::{self, Template};
use super::types::MediaType;
use serde_json::{Map, Value};
use tracing::debug;

/// Options that change the shape of the selection set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Include the viewer's list-entry fragment
    pub authenticated: bool,
}

/// A rendered query and the variables it declares
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub query: String,
    /// Keys are sorted, so serializing this map is canonical
    pub variables: Map<String, Value>,
    /// `$name : Type` clause
    pub declarations: String,
    /// `wireName : $name` clause for the filter
    pub arguments: String,
    /// `wireName : $name` clause for pagination
    pub page_arguments: String,
}

/// Fields that are always empty for the other media type
fn absent_fields(media_type: MediaType) -> &'static [&'static str] {
    match media_type {
        MediaType::Anime => &["chapters", "volumes"],
        MediaType::Manga => &["episodes", "duration"],
    }
}

/// Variable-declaration clause: `$a : Int, $b : [MediaSort]`
pub fn declaration_clause(bindings: &[Binding]) -> String {
    bindings
        .iter()
        .map(|b| format!("${} : {}", b.name, b.graphql_type))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Argument-assignment clause: `a : $a, b : $b`
pub fn argument_clause(bindings: &[Binding]) -> String {
    bindings
        .iter()
        .map(|b| format!("{} : ${}", b.name, b.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build a query from a template and a filter
///
/// Pagination variables share the filter's namespace. They are only bound
/// when the template has a `{page}` slot.
pub fn build(
    template: &Template<'_>,
    filter: &dyn Filter,
    page: Option<&PageFilter>,
    options: BuildOptions,
) -> Result<BuiltQuery, QueryError> {
    let filter_fields = filter.fields()?;
    let filter_len = filter_fields.bindings().len();

    let mut fields = filter_fields;
    match page {
        Some(page) if template.has_slot(template::PAGE) => fields.extend(page.fields()?)?,
        Some(_) => {
            debug!(template = template.name(), "Template has no page slot, ignoring pagination");
        }
        None => {}
    }

    let bindings = fields.into_bindings();
    let (filter_bindings, page_bindings) = bindings.split_at(filter_len);

    let declarations = declaration_clause(&bindings);
    let arguments = argument_clause(filter_bindings);
    let page_arguments = argument_clause(page_bindings);

    let list_entry = if options.authenticated {
        template::LIST_ENTRY_FRAGMENT
    } else {
        ""
    };

    let mut query = template.render(&[
        (template::ARGS, declarations.as_str()),
        (template::FILTERS, arguments.as_str()),
        (template::PAGE, page_arguments.as_str()),
        (template::LIST_ENTRY, list_entry),
    ])?;

    if let Some(media_type) = filter.media_type() {
        query = prune_fields(&query, absent_fields(media_type));
    }

    let variables = bindings
        .into_iter()
        .map(|b| (b.name, b.value))
        .collect::<Map<String, Value>>();

    debug!(
        template = template.name(),
        variables = variables.len(),
        authenticated = options.authenticated,
        "Built query"
    );

    Ok(BuiltQuery {
        query,
        variables,
        declarations,
        arguments,
        page_arguments,
    })
}

/// Remove selection lines consisting solely of one of `fields`
fn prune_fields(query: &str, fields: &[&str]) -> String {
    query
        .lines()
        .filter(|line| !fields.contains(&line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::{MediaFilter, MediaListFilter, RawFilter};
    use crate::query::template::{MEDIA_DETAILS, MEDIA_LIST_COLLECTION, MEDIA_PAGE, VIEWER};
    use crate::query::types::{MediaListStatus, MediaSort, MediaStatus};
    use serde_json::json;

    fn trending(media_type: MediaType) -> MediaFilter {
        MediaFilter {
            media_type: Some(media_type),
            sort_by: Some(vec![MediaSort::TrendingDesc]),
            ..Default::default()
        }
    }

    #[test]
    fn test_trending_anime() {
        let built = build(&MEDIA_PAGE, &trending(MediaType::Anime), None, BuildOptions::default()).unwrap();

        assert_eq!(built.declarations, "$type : MediaType, $sort : [MediaSort]");
        assert_eq!(built.arguments, "type : $type, sort : $sort");
        assert_eq!(
            Value::Object(built.variables),
            json!({ "type": "ANIME", "sort": ["TRENDING_DESC"] })
        );
        assert!(built.query.starts_with("query ($type : MediaType, $sort : [MediaSort]) {"));
        assert!(built.query.contains("media(type : $type, sort : $sort) {"));
    }

    #[test]
    fn test_empty_filter() {
        let built = build(&MEDIA_PAGE, &MediaFilter::default(), None, BuildOptions::default()).unwrap();

        assert_eq!(built.declarations, "");
        assert_eq!(built.arguments, "");
        assert!(built.variables.is_empty());
        for slot in ["{args}", "{filters}", "{page}", "{list_entry}"] {
            assert!(!built.query.contains(slot), "unresolved {}", slot);
        }
        assert!(!built.query.contains("()"));
        assert!(built.query.contains("    media {"));
    }

    #[test]
    fn test_page_filter_merged() {
        let built = build(
            &MEDIA_PAGE,
            &trending(MediaType::Manga),
            Some(&PageFilter::new(2, 25)),
            BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(
            built.declarations,
            "$type : MediaType, $sort : [MediaSort], $page : Int, $perPage : Int"
        );
        assert_eq!(built.page_arguments, "page : $page, perPage : $perPage");
        assert!(built.query.contains("Page(page : $page, perPage : $perPage) {"));
        assert_eq!(built.variables["perPage"], json!(25));
    }

    #[test]
    fn test_page_filter_ignored_without_slot() {
        let built = build(
            &MEDIA_DETAILS,
            &MediaFilter::by_id(1),
            Some(&PageFilter::default()),
            BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(built.declarations, "$id : Int");
        assert!(!built.variables.contains_key("page"));
    }

    #[test]
    fn test_list_entry_fragment() {
        let anonymous = build(&MEDIA_PAGE, &trending(MediaType::Anime), None, BuildOptions::default()).unwrap();
        assert!(!anonymous.query.contains("mediaListEntry"));

        let viewer = build(
            &MEDIA_PAGE,
            &trending(MediaType::Anime),
            None,
            BuildOptions { authenticated: true },
        )
        .unwrap();
        assert!(viewer.query.contains("mediaListEntry {"));
    }

    #[test]
    fn test_fields_pruned_by_media_type() {
        let anime = build(&MEDIA_PAGE, &trending(MediaType::Anime), None, BuildOptions::default()).unwrap();
        let lines: Vec<&str> = anime.query.lines().map(str::trim).collect();
        assert!(lines.contains(&"episodes"));
        assert!(!lines.contains(&"chapters"));
        assert!(!lines.contains(&"volumes"));

        let manga = build(&MEDIA_PAGE, &trending(MediaType::Manga), None, BuildOptions::default()).unwrap();
        let lines: Vec<&str> = manga.query.lines().map(str::trim).collect();
        assert!(lines.contains(&"chapters"));
        assert!(!lines.contains(&"episodes"));

        let untyped = build(&MEDIA_DETAILS, &MediaFilter::by_id(1), None, BuildOptions::default()).unwrap();
        let lines: Vec<&str> = untyped.query.lines().map(str::trim).collect();
        assert!(lines.contains(&"chapters"));
        assert!(lines.contains(&"episodes"));
        // nested `episode` is not a pruned field
        assert!(lines.contains(&"episode"));
    }

    #[test]
    fn test_enum_list_order_preserved() {
        let filter = MediaListFilter {
            user_name: Some("alice".to_string()),
            media_type: Some(MediaType::Anime),
            status_in: Some(vec![
                MediaListStatus::Repeating,
                MediaListStatus::Current,
                MediaListStatus::Completed,
            ]),
            sort_by: None,
        };

        let built = build(&MEDIA_LIST_COLLECTION, &filter, None, BuildOptions::default()).unwrap();
        assert_eq!(
            built.declarations,
            "$userName : String, $type : MediaType, $status_in : [MediaListStatus]"
        );
        assert_eq!(built.variables["status_in"], json!(["REPEATING", "CURRENT", "COMPLETED"]));
    }

    #[test]
    fn test_template_without_slots() {
        let built = build(&VIEWER, &MediaFilter::default(), None, BuildOptions { authenticated: true }).unwrap();
        assert_eq!(built.query, VIEWER.text().replace("{{", "{").replace("}}", "}"));
    }

    #[test]
    fn test_template_mismatch() {
        let template = Template::new("broken", "query ({args}) {{ Media({0}) {{ id }} }}");
        let err = build(&template, &MediaFilter::by_id(1), None, BuildOptions::default()).unwrap_err();
        assert!(matches!(err, QueryError::TemplateMismatch(_)));
    }

    #[test]
    fn test_extra_placeholder_left_empty() {
        let template = Template::new("t", "query ({args}) {{ Media({filters}) {{ id {extra} }} }}");
        let built = build(&template, &MediaFilter::by_id(1), None, BuildOptions::default()).unwrap();
        assert_eq!(built.query, "query ($id : Int) { Media(id : $id) { id  } }");
        assert_eq!(Value::Object(built.variables), json!({ "id": 1 }));
    }

    #[test]
    fn test_unsupported_raw_value() {
        let mut filter = RawFilter::new();
        filter.insert("status", json!(MediaStatus::Releasing.as_str())).insert("x", json!({ "a": 1 }));

        let err = build(&MEDIA_PAGE, &filter, None, BuildOptions::default()).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedType { .. }));
    }
}
