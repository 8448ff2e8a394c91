//! Defines the [`Post`] type, the typed record built from a post source
//! file's frontmatter and body. The frontmatter arrives as a loosely-typed
//! [`Metadata`] mapping; [`Post::from_document`] validates it into named
//! fields so nothing downstream has to guess at types or missing keys.

use std::path::PathBuf;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use log::warn;
use pulldown_cmark::{Event, Parser, Tag};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

use crate::frontmatter::Metadata;

/// Marks the end of a post's excerpt in the body.
const FOLD_TAG: &str = "<!-- more -->";

/// One post. Built fresh on every listing and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Post {
    /// Derived from the source file name; unique within a listing. A `slug`
    /// key in the frontmatter is discarded.
    pub slug: String,

    /// The `title` key. Required.
    pub title: String,

    /// The `author` key. Defaults to `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// The `createdAt` key as seconds since the epoch. Required. Also accepts
    /// `YYYY-MM-DD` or RFC 3339 date strings, taken as UTC.
    #[serde(rename = "createdAt")]
    pub created_at: i64,

    /// The `tags` key, as authored. Defaults to empty; a bare string is
    /// taken as a single tag.
    pub tags: Vec<String>,

    /// The `teaser` key. Defaults to `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teaser: Option<String>,

    /// Every other frontmatter key, untouched.
    #[serde(skip_serializing_if = "Mapping::is_empty")]
    pub extra: Mapping,

    /// The markdown following the frontmatter block.
    pub body: String,

    /// The file this post was read from.
    #[serde(skip)]
    pub path: PathBuf,
}

impl Post {
    /// Validates `metadata` into a [`Post`]. Fails if a required field is
    /// missing or any known field has the wrong type.
    pub fn from_document(
        slug: String,
        path: PathBuf,
        mut metadata: Metadata,
        body: String,
    ) -> Result<Post, serde_yaml::Error> {
        if metadata.remove(&Value::String("slug".to_owned())).is_some() {
            warn!(
                "ignoring `slug` in the frontmatter of `{}`; using `{}`",
                path.display(),
                slug
            );
        }

        let frontmatter: Frontmatter = serde_yaml::from_value(Value::Mapping(metadata))?;
        Ok(Post {
            slug,
            title: frontmatter.title,
            author: frontmatter.author,
            created_at: frontmatter.created_at,
            tags: frontmatter.tags,
            teaser: frontmatter.teaser,
            extra: frontmatter.extra,
            body,
            path,
        })
    }

    /// Rebuilds a [`Metadata`] mapping from the typed fields: `title`,
    /// `author`, `createdAt`, `tags` and `teaser` first, then the extra keys.
    /// Fields left at their default are omitted.
    pub fn to_metadata(&self) -> Metadata {
        fn key(k: &str) -> Value {
            Value::String(k.to_owned())
        }

        let mut metadata = Metadata::new();
        metadata.insert(key("title"), Value::String(self.title.clone()));
        if let Some(author) = &self.author {
            metadata.insert(key("author"), Value::String(author.clone()));
        }
        metadata.insert(key("createdAt"), Value::Number(self.created_at.into()));
        if !self.tags.is_empty() {
            metadata.insert(
                key("tags"),
                Value::Sequence(self.tags.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(teaser) = &self.teaser {
            metadata.insert(key("teaser"), Value::String(teaser.clone()));
        }
        for (k, v) in &self.extra {
            metadata.insert(k.clone(), v.clone());
        }
        metadata
    }

    /// The body up to the fold marker (`<!-- more -->`), or the whole body.
    pub fn excerpt(&self) -> &str {
        match self.body.find(FOLD_TAG) {
            Some(i) => &self.body[..i],
            None => &self.body,
        }
    }

    /// The teaser if the author wrote one, otherwise the plain text of the
    /// body's first paragraph.
    pub fn summary(&self) -> String {
        match &self.teaser {
            Some(teaser) => teaser.clone(),
            None => first_paragraph(&self.body),
        }
    }

    /// `created_at` as a UTC timestamp; `None` if it's out of range.
    pub fn created_date(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.created_at, 0).single()
    }

    /// `created_at` formatted for list views, e.g. `September 13th, 2020`.
    pub fn display_date(&self) -> String {
        match self.created_date() {
            Some(date) => format!(
                "{} {}{}, {}",
                date.format("%B"),
                date.day(),
                ordinal_suffix(date.day()),
                date.year()
            ),
            None => self.created_at.to_string(),
        }
    }

    /// The tags in lexicographic order.
    pub fn sorted_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

/// Sorts oldest first. Ties are broken by slug so the order doesn't depend
/// on how the directory was enumerated.
pub fn sort_by_created_at(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.slug.cmp(&b.slug))
    });
}

/// Sorts by title, then slug.
pub fn sort_by_title(posts: &mut [Post]) {
    posts.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.slug.cmp(&b.slug)));
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn first_paragraph(markdown: &str) -> String {
    let mut text = String::new();
    let mut in_paragraph = false;
    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Paragraph) => in_paragraph = true,
            Event::End(Tag::Paragraph) => break,
            Event::Text(t) | Event::Code(t) if in_paragraph => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak if in_paragraph => text.push(' '),
            _ => {}
        }
    }
    text
}

#[derive(Deserialize)]
struct Frontmatter {
    title: String,

    #[serde(default)]
    author: Option<String>,

    #[serde(rename = "createdAt", deserialize_with = "deserialize_timestamp")]
    created_at: i64,

    #[serde(default, deserialize_with = "deserialize_tags")]
    tags: Vec<String>,

    #[serde(default)]
    teaser: Option<String>,

    #[serde(flatten)]
    extra: Mapping,
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    fn scalar(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(values) => values
            .into_iter()
            .map(|v| scalar(v).ok_or_else(|| D::Error::custom("`tags` entries must be strings")))
            .collect(),
        value => scalar(value)
            .map(|tag| vec![tag])
            .ok_or_else(|| D::Error::custom("`tags` must be a string or a list of strings")),
    }
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().ok_or_else(|| {
            D::Error::custom(format!(
                "`createdAt` must be whole seconds since the epoch, got {}",
                n
            ))
        }),
        Value::String(s) => parse_date(&s)
            .ok_or_else(|| D::Error::custom(format!("unrecognized `createdAt` date `{}`", s))),
        other => Err(D::Error::custom(format!(
            "`createdAt` must be a number or a date, got {:?}",
            other
        ))),
    }
}

fn parse_date(s: &str) -> Option<i64> {
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.timestamp());
    }
    let midnight = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).timestamp())
}
