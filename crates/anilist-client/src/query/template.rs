//! Query templates with named slots.
//!
//! Templates use `{name}` for slots and `{{` / `}}` for literal braces, so
//! GraphQL selection sets are written with doubled braces.

use super::error::QueryError;
use tracing::debug;

/// Slot receiving the variable-declaration clause
pub const ARGS: &str = "args";
/// Slot receiving the filter's argument-assignment clause
pub const FILTERS: &str = "filters";
/// Slot receiving the pagination argument-assignment clause
pub const PAGE: &str = "page";
/// Slot receiving the viewer's list-entry fragment
pub const LIST_ENTRY: &str = "list_entry";

/// A named query template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template<'a> {
    name: &'a str,
    text: &'a str,
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Brace(char),
    Slot(&'a str),
}

impl<'a> Template<'a> {
    pub const fn new(name: &'a str, text: &'a str) -> Self {
        Self { name, text }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Slot names in order of appearance
    pub fn slots(&self) -> Result<Vec<&'a str>, QueryError> {
        Ok(self
            .segments()?
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Slot(name) => Some(name),
                _ => None,
            })
            .collect())
    }

    pub fn has_slot(&self, slot: &str) -> bool {
        self.slots()
            .map(|slots| slots.contains(&slot))
            .unwrap_or(false)
    }

    /// Substitute slots
    ///
    /// Slots without a value in `values` render as the empty string. An
    /// empty slot written directly inside parentheses, as in `Media({filters})`,
    /// takes the parentheses with it. Values for slots the template does not
    /// have are ignored.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String, QueryError> {
        let mut out = String::with_capacity(self.text.len());
        let segments = self.segments()?;
        let mut skip_close = false;

        for (index, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Text(text) => {
                    let text: &str = if skip_close { &text[1..] } else { text };
                    skip_close = false;
                    out.push_str(text);
                }
                Segment::Brace(c) => out.push(*c),
                Segment::Slot(name) => {
                    let value = match values.iter().find(|(slot, _)| slot == name) {
                        Some((_, value)) => *value,
                        None => {
                            debug!(template = self.name, slot = *name, "Slot has no value, leaving it empty");
                            ""
                        }
                    };

                    let closes = matches!(
                        segments.get(index + 1),
                        Some(Segment::Text(next)) if next.starts_with(')')
                    );
                    if value.is_empty() && closes && out.ends_with('(') {
                        out.pop();
                        skip_close = true;
                    }
                    out.push_str(value);
                }
            }
        }

        Ok(out)
    }

    fn segments(&self) -> Result<Vec<Segment<'a>>, QueryError> {
        let text = self.text;
        let bytes = text.as_bytes();
        let mut segments = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'{' | b'}' if bytes.get(i + 1) == Some(&bytes[i]) => {
                    if start < i {
                        segments.push(Segment::Text(&text[start..i]));
                    }
                    segments.push(Segment::Brace(bytes[i] as char));
                    i += 2;
                    start = i;
                }
                b'{' => {
                    let close = text[i + 1..].find('}').map(|offset| i + 1 + offset).ok_or_else(|| {
                        self.mismatch(format!("unclosed `{{` at byte {}", i))
                    })?;
                    let name = &text[i + 1..close];
                    if name.is_empty() || name.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(self.mismatch(format!(
                            "positional placeholder `{{{}}}` cannot be supplied",
                            name
                        )));
                    }
                    if !is_identifier(name) {
                        return Err(self.mismatch(format!("malformed placeholder `{{{}}}`", name)));
                    }
                    if start < i {
                        segments.push(Segment::Text(&text[start..i]));
                    }
                    segments.push(Segment::Slot(name));
                    i = close + 1;
                    start = i;
                }
                b'}' => {
                    return Err(self.mismatch(format!("unmatched `}}` at byte {}", i)));
                }
                _ => i += 1,
            }
        }

        if start < bytes.len() {
            segments.push(Segment::Text(&text[start..]));
        }

        Ok(segments)
    }

    fn mismatch(&self, detail: String) -> QueryError {
        QueryError::TemplateMismatch(format!("template `{}`: {}", self.name, detail))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Current user
pub const VIEWER: Template<'static> = Template::new(
    "viewer",
    r#"query {{
  Viewer {{
    id
    name
    siteUrl
    avatar {{
      large
    }}
  }}
}}"#,
);

/// One page of media previews
pub const MEDIA_PAGE: Template<'static> = Template::new(
    "media_page",
    r#"query ({args}) {{
  Page({page}) {{
    pageInfo {{
      total
      currentPage
      lastPage
      hasNextPage
      perPage
    }}
    media({filters}) {{
      id
      title {{
        english
        romaji
      }}
      status
      popularity
      averageScore
      chapters
      volumes
      episodes
      format
      type
      {list_entry}
    }}
  }}
}}"#,
);

/// Everything shown on a media's detail page
pub const MEDIA_DETAILS: Template<'static> = Template::new(
    "media_details",
    r#"query ({args}) {{
  Media({filters}) {{
    id
    idMal
    nextAiringEpisode {{
      airingAt
      episode
      timeUntilAiring
    }}
    title {{
      english
      romaji
    }}
    averageScore
    chapters
    countryOfOrigin
    description
    duration
    endDate {{
      day
      month
      year
    }}
    episodes
    favourites
    format
    genres
    meanScore
    {list_entry}
    popularity
    rankings {{
      allTime
      context
      format
      rank
      season
      type
      year
    }}
    relations {{
      nodes {{
        id
        title {{
          english
          romaji
        }}
      }}
    }}
    recommendations {{
      nodes {{
        rating
        mediaRecommendation {{
          id
          title {{
            english
            romaji
          }}
        }}
      }}
    }}
    season
    seasonYear
    source
    startDate {{
      day
      month
      year
    }}
    status
    studios {{
      nodes {{
        isAnimationStudio
        name
      }}
    }}
    synonyms
    tags {{
      name
      isGeneralSpoiler
      isMediaSpoiler
    }}
    type
    volumes
  }}
}}"#,
);

/// A user's lists, grouped by status
pub const MEDIA_LIST_COLLECTION: Template<'static> = Template::new(
    "media_list_collection",
    r#"query ({args}) {{
  MediaListCollection({filters}) {{
    hasNextChunk
    lists {{
      name
      status
      entries {{
        id
        mediaId
        status
        media {{
          id
          title {{
            english
            romaji
          }}
          chapters
          volumes
          episodes
          isFavourite
          status
          type
        }}
        startedAt {{
          day
          month
          year
        }}
        completedAt {{
          day
          month
          year
        }}
        score
        repeat
        progress
        progressVolumes
        notes
      }}
    }}
  }}
}}"#,
);

/// Create or update the viewer's list entry for a media
pub const SAVE_LIST_ENTRY: Template<'static> = Template::new(
    "save_list_entry",
    r#"mutation ({args}) {{
  SaveMediaListEntry({filters}) {{
    id
    mediaId
    status
    score
    progress
    progressVolumes
    repeat
    notes
    startedAt {{
      day
      month
      year
    }}
    completedAt {{
      day
      month
      year
    }}
  }}
}}"#,
);

/// Viewer's list entry, spliced into media selections when logged in
pub const LIST_ENTRY_FRAGMENT: &str = "mediaListEntry { id progress status score }";
