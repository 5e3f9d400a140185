//! Query building: filters, templates, and their translation into a
//! GraphQL document plus variables.

pub mod builder;
pub mod error;
pub mod filter;
pub mod template;
pub mod types;

pub use builder::{build, BuildOptions, BuiltQuery};
pub use error::{ParseEnumError, QueryError};
pub use filter::{Binding, FieldSet, Filter, MediaFilter, MediaListFilter, PageFilter, RawFilter};
pub use template::Template;
pub use types::{
    FuzzyDate, GraphQlInput, GraphQlType, MediaFormat, MediaListSort, MediaListStatus, MediaSeason,
    MediaSort, MediaStatus, MediaType,
};
