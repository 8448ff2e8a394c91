//! Splits a leading YAML frontmatter block from the body of a post source
//! file, and stitches the two back together again. The block is fenced by
//! `---` lines:
//!
//! ```md
//! ---
//! title: Hello, world!
//! createdAt: 1600000000
//! tags: [Go, Testing]
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! Files without a block are valid; they parse as empty [`Metadata`] and the
//! whole input as the body. See [`parse`] and [`render`].

use std::fmt;

use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// The loosely-typed metadata of a post, exactly as authored.
pub type Metadata = Mapping;

const FENCE: &str = "---";
const END_FENCES: [&str; 2] = ["---", "..."];
const BOM: char = '\u{feff}';

/// Splits `input` into its [`Metadata`] and body. The body is returned
/// byte-for-byte as it appears after the closing fence's line terminator.
///
/// Returns empty metadata and the full `input` if `input` doesn't open with a
/// fence line. Fails if the block is opened but never closed, if it isn't
/// valid YAML, or if the YAML isn't a mapping.
pub fn parse(input: &str) -> Result<(Metadata, &str)> {
    match block_indices(input)? {
        None => Ok((Metadata::new(), input)),
        Some((yaml_start, yaml_stop, body_start)) => Ok((
            parse_metadata(&input[yaml_start..yaml_stop])?,
            &input[body_start..],
        )),
    }
}

/// Renders `metadata` and `body` back into a document that [`parse`] splits
/// into an equal mapping and the identical body. Fails with
/// [`Error::Unfaithful`] rather than return a document that wouldn't.
pub fn render(metadata: &Metadata, body: &str) -> Result<String> {
    let mut yaml = String::new();
    if !metadata.is_empty() {
        let emitted = serde_yaml::to_string(metadata)?;
        // A leading document marker would read as our closing fence.
        yaml.push_str(emitted.strip_prefix("---\n").unwrap_or(&emitted));
        if !yaml.ends_with('\n') {
            yaml.push('\n');
        }
    }
    if parse_metadata(&yaml)? != *metadata {
        return Err(Error::Unfaithful);
    }

    let mut out = String::with_capacity(yaml.len() + body.len() + 8);
    out.push_str(FENCE);
    out.push('\n');
    out.push_str(&yaml);
    out.push_str(FENCE);
    out.push('\n');
    out.push_str(body);
    Ok(out)
}

/// Returns `(yaml_start, yaml_stop, body_start)` for the frontmatter block,
/// or `None` if `input` has no block.
fn block_indices(input: &str) -> Result<Option<(usize, usize, usize)>> {
    let start = if input.starts_with(BOM) {
        BOM.len_utf8()
    } else {
        0
    };

    let mut lines = input[start..].split_inclusive('\n');
    match lines.next() {
        Some(first) if first.ends_with('\n') && is_fence(first, &[FENCE]) => {
            let yaml_start = start + first.len();
            let mut offset = yaml_start;
            for line in lines {
                if is_fence(line, &END_FENCES) {
                    return Ok(Some((yaml_start, offset, offset + line.len())));
                }
                offset += line.len();
            }
            Err(Error::Unterminated)
        }
        _ => Ok(None),
    }
}

fn is_fence(line: &str, fences: &[&str]) -> bool {
    let trimmed = line.trim_end_matches(|c| matches!(c, '\n' | '\r' | ' ' | '\t'));
    fences.contains(&trimmed)
}

fn parse_metadata(yaml: &str) -> Result<Metadata> {
    let blank = yaml.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    });
    if blank {
        return Ok(Metadata::new());
    }

    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Metadata::new()),
        _ => Err(Error::NotAMapping),
    }
}

/// An owned, parsed document. [`fmt::Display`] renders it with [`render`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub metadata: Metadata,
    pub body: String,
}

impl Document {
    pub fn parse(input: &str) -> Result<Document> {
        let (metadata, body) = parse(input)?;
        Ok(Document {
            metadata,
            body: body.to_owned(),
        })
    }

    /// True if the document had no metadata block or an empty one.
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rendered = render(&self.metadata, &self.body).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// The result of a frontmatter operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a malformed frontmatter block.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the opening `---` fence was found but the closing one
    /// was missing.
    #[error("missing closing `---` for frontmatter block")]
    Unterminated,

    /// Returned when the block isn't valid YAML, or when the metadata can't
    /// be serialized back into YAML.
    #[error("invalid YAML in frontmatter block")]
    Yaml(#[from] serde_yaml::Error),

    /// Returned when the block is valid YAML but not a mapping, e.g. a bare
    /// list.
    #[error("frontmatter block must be a YAML mapping")]
    NotAMapping,

    /// Returned by [`render`] when the emitted YAML would read back as
    /// different metadata.
    #[error("metadata does not survive rendering as YAML")]
    Unfaithful,
}

#[cfg(test)]
mod test {
    use super::*;

    fn key(k: &str) -> Value {
        Value::String(k.to_owned())
    }

    #[test]
    fn test_parse_without_block() -> Result<()> {
        let input = "# Just markdown\n\nNo metadata here.\n";
        let (metadata, body) = parse(input)?;
        assert!(metadata.is_empty());
        assert_eq!(input, body);
        Ok(())
    }

    #[test]
    fn test_parse_thematic_break_is_not_a_block() -> Result<()> {
        let input = "----\ntext\n";
        let (metadata, body) = parse(input)?;
        assert!(metadata.is_empty());
        assert_eq!(input, body);
        Ok(())
    }

    #[test]
    fn test_parse_block() -> Result<()> {
        let input = "---\ntitle: Hello World\ntags: [Go, Testing]\ncreatedAt: 1600000000\n---\n# Hello\n\nWorld\n";
        let (metadata, body) = parse(input)?;
        assert_eq!(
            Some(&Value::String("Hello World".to_owned())),
            metadata.get(&key("title"))
        );
        assert_eq!(
            Some(1600000000),
            metadata.get(&key("createdAt")).and_then(Value::as_i64)
        );
        assert_eq!("# Hello\n\nWorld\n", body);
        Ok(())
    }

    #[test]
    fn test_parse_crlf_and_bom() -> Result<()> {
        let input = "\u{feff}---\r\ntitle: x\r\n---\r\nbody\r\n";
        let (metadata, body) = parse(input)?;
        assert_eq!(1, metadata.len());
        assert_eq!("body\r\n", body);
        Ok(())
    }

    #[test]
    fn test_parse_closing_fence_at_end_of_input() -> Result<()> {
        let (metadata, body) = parse("---\ntitle: x\n---")?;
        assert_eq!(1, metadata.len());
        assert_eq!("", body);
        Ok(())
    }

    #[test]
    fn test_parse_yaml_document_end_marker() -> Result<()> {
        let (metadata, body) = parse("---\ntitle: x\n...\nbody")?;
        assert_eq!(1, metadata.len());
        assert_eq!("body", body);
        Ok(())
    }

    #[test]
    fn test_parse_empty_block() -> Result<()> {
        let (metadata, body) = parse("---\n---\nbody")?;
        assert!(metadata.is_empty());
        assert_eq!("body", body);

        let (metadata, _) = parse("---\n# only a comment\n\n---\nbody")?;
        assert!(metadata.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_unterminated() {
        match parse("---\ntitle: x\n\nbody without a closing fence\n") {
            Err(Error::Unterminated) => {}
            other => panic!("wanted Unterminated, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid_yaml() {
        match parse("---\ntitle: [unclosed\n---\nbody") {
            Err(Error::Yaml(_)) => {}
            other => panic!("wanted Yaml, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_not_a_mapping() {
        match parse("---\n- just\n- a list\n---\nbody") {
            Err(Error::NotAMapping) => {}
            other => panic!("wanted NotAMapping, got {:?}", other),
        }
    }

    #[test]
    fn test_render_round_trip() -> Result<()> {
        let input = "---\ntitle: \"Hello: World\"\nauthor: Steven\ntags:\n  - Go\n  - Testing\ncreatedAt: 1600000000\nextra:\n  nested: true\n---\n\nSome *body* text\n---\nwith a rule above.\n";
        let (metadata, body) = parse(input)?;
        let rendered = render(&metadata, body)?;
        let (reparsed, rebody) = parse(&rendered)?;
        assert_eq!(metadata, reparsed);
        assert_eq!(body, rebody);
        Ok(())
    }

    #[test]
    fn test_render_round_trip_ambiguous_scalars() -> Result<()> {
        let scalars = [
            "0o17",
            "0x1F",
            ".inf",
            "-.inf",
            ".nan",
            "1e3",
            "42",
            "true",
            "null",
            "~",
            "---",
            "...",
            "first\n---\nsecond",
            "trailing newline\n",
            "key: value",
            "- item",
            "# not a comment",
            " padded ",
            "",
        ];
        for scalar in scalars.iter() {
            let mut metadata = Metadata::new();
            metadata.insert(key("title"), Value::String((*scalar).to_owned()));
            metadata.insert(
                key("tags"),
                Value::Sequence(vec![Value::String((*scalar).to_owned())]),
            );

            let rendered = render(&metadata, "body\n---\n")?;
            let (reparsed, body) = parse(&rendered)?;
            assert_eq!(metadata, reparsed, "scalar {:?} rendered as {:?}", scalar, rendered);
            assert_eq!("body\n---\n", body);
        }
        Ok(())
    }

    #[test]
    fn test_render_empty_metadata() -> Result<()> {
        let rendered = render(&Metadata::new(), "body\n")?;
        assert_eq!("---\n---\nbody\n", rendered);
        Ok(())
    }

    #[test]
    fn test_document() -> Result<()> {
        let doc = Document::parse("just a body")?;
        assert!(doc.is_empty());

        let doc = Document::parse("---\ntitle: x\n---\nbody")?;
        assert!(!doc.is_empty());
        assert_eq!(doc, Document::parse(&doc.to_string())?);
        Ok(())
    }
}
