//! Errors raised while turning filters and templates into a query.

use thiserror::Error;

/// Failure to build a query from a filter and a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A runtime value has no GraphQL type
    #[error("unsupported value type for `{field}`: {found}")]
    UnsupportedType { field: String, found: String },

    /// List element type cannot be taken from an empty list
    #[error("`{field}` is an empty list, its element type cannot be declared")]
    EmptyList { field: String },

    /// The template asks for something the builder cannot supply
    #[error("template mismatch: {0}")]
    TemplateMismatch(String),

    /// Two fields bind the same GraphQL variable
    #[error("variable `${name}` is bound more than once")]
    DuplicateVariable { name: String },
}

/// Unknown symbolic name for a GraphQL enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{value}` is not a {type_name} value")]
pub struct ParseEnumError {
    pub type_name: &'static str,
    pub value: String,
}
