//! Defines the [`Repository`], which reads [`Post`]s from a directory of
//! source files, and its [`Error`] type.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::frontmatter;
use crate::post::Post;

/// The extensions treated as post sources unless configured otherwise.
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// The file name stem of a post bundle's source file.
const BUNDLE_INDEX: &str = "index";

/// Reads [`Post`]s from one directory. Nothing is cached: each call reads
/// the directory afresh.
#[derive(Clone, Debug)]
pub struct Repository {
    /// The directory holding the post sources. Only its immediate entries
    /// are considered.
    directory: PathBuf,

    /// File extensions (without the dot) of post sources.
    extensions: Vec<String>,
}

impl Repository {
    /// Constructs a repository over `directory` using the
    /// [`DEFAULT_EXTENSIONS`].
    pub fn new(directory: impl Into<PathBuf>) -> Repository {
        Repository::with_extensions(directory, DEFAULT_EXTENSIONS.iter().copied())
    }

    pub fn with_extensions<I, S>(directory: impl Into<PathBuf>, extensions: I) -> Repository
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Repository {
            directory: directory.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Reads every post in the directory. Each source must be structured as
    /// follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with `title`, `createdAt`, and optionally
    ///    `author`, `tags`, `teaser` and any other keys
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// Sources are either `{slug}.md` files or `{slug}/index.md` bundles
    /// (any configured extension works in place of `md`). Entries are
    /// visited in file name order and the posts come back in that order;
    /// sorting by date or title is up to the caller.
    ///
    /// Any failure aborts the whole listing: a missing directory, two sources
    /// sharing a slug, an unreadable file, or malformed frontmatter.
    pub fn list_all(&self) -> Result<Vec<Post>> {
        if !self.directory.is_dir() {
            return Err(Error::DirectoryNotFound(self.directory.clone()));
        }

        let mut posts = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        for result in WalkDir::new(&self.directory)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = result?;
            let (slug, source) = match self.source(&entry)? {
                Some(found) => found,
                None => continue,
            };

            if let Some(first) = seen.insert(slug.clone(), source.clone()) {
                return Err(Error::DuplicateSlug {
                    slug,
                    first,
                    second: source,
                });
            }
            posts.push(read_post(slug, source)?);
        }

        debug!(
            "read {} posts from `{}`",
            posts.len(),
            self.directory.display()
        );
        Ok(posts)
    }

    /// Reads the post whose slug is `slug`, if there is one. The whole
    /// directory is still read, so slug collisions are still reported.
    pub fn get(&self, slug: &str) -> Result<Option<Post>> {
        Ok(self.list_all()?.into_iter().find(|post| post.slug == slug))
    }

    /// The slug of every post, in listing order.
    pub fn slugs(&self) -> Result<Vec<String>> {
        Ok(self.list_all()?.into_iter().map(|post| post.slug).collect())
    }

    /// Returns the slug and source file for `entry`, or `None` if `entry`
    /// isn't a post.
    fn source(&self, entry: &DirEntry) -> Result<Option<(String, PathBuf)>> {
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            trace!("skipping hidden entry `{}`", path.display());
            return Ok(None);
        }

        if entry.file_type().is_dir() {
            let mut indices = self.bundle_indices(path)?;
            if indices.len() > 1 {
                let second = indices.swap_remove(1);
                return Err(Error::DuplicateSlug {
                    slug: file_name(path)?.to_owned(),
                    first: indices.swap_remove(0),
                    second,
                });
            }
            return match indices.pop() {
                Some(index) => Ok(Some((file_name(path)?.to_owned(), index))),
                None => {
                    debug!("skipping directory without an index `{}`", path.display());
                    Ok(None)
                }
            };
        }

        if entry.file_type().is_file() && self.has_post_extension(path) {
            let stem = path
                .file_stem()
                .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?
                .to_str()
                .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?;
            return Ok(Some((stem.to_owned(), path.to_owned())));
        }

        if entry.file_type().is_file() {
            warn!("skipping non-post file `{}`", path.display());
        } else {
            debug!("skipping non-post entry `{}`", path.display());
        }
        Ok(None)
    }

    /// Extensions match regardless of ASCII case, so `B.MD` is a post.
    fn has_post_extension(&self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    /// The `index.<ext>` files directly inside `dir`, sorted by file name.
    fn bundle_indices(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let io_error = |err| Error::Io {
            path: dir.to_owned(),
            err,
        };
        let mut indices = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            let stem = path.file_stem().and_then(|stem| stem.to_str());
            if stem == Some(BUNDLE_INDEX) && path.is_file() && self.has_post_extension(&path) {
                indices.push(path);
            }
        }
        indices.sort();
        Ok(indices)
    }
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::InvalidFileName(path.to_owned()))
}

fn read_post(slug: String, path: PathBuf) -> Result<Post> {
    trace!("parsing post `{}` from `{}`", slug, path.display());
    let contents = fs::read_to_string(&path).map_err(|err| Error::Io {
        path: path.clone(),
        err,
    })?;
    let (metadata, body) = frontmatter::parse(&contents).map_err(|err| Error::Parse {
        path: path.clone(),
        err,
    })?;
    let body = body.to_owned();
    Post::from_document(slug, path.clone(), metadata, body)
        .map_err(|err| Error::Metadata { path, err })
}

/// The result of a [`Repository`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading posts. Every variant names the offending
/// path or slug.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the posts directory doesn't exist or isn't a directory.
    #[error("posts directory `{}` does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Returned when two sources derive the same slug, e.g. `foo.md` and
    /// `foo.markdown`, or `foo.md` and `foo/index.md`.
    #[error(
        "`{}` and `{}` both have the slug `{slug}`",
        .first.display(),
        .second.display()
    )]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Returned when a source's frontmatter block is malformed.
    #[error("parsing frontmatter of `{}`", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        err: frontmatter::Error,
    },

    /// Returned when the frontmatter is well-formed but a field is missing or
    /// has the wrong type.
    #[error("invalid frontmatter in `{}`", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },

    /// Returned when a source's name isn't valid UTF-8.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(PathBuf),

    /// Returned when a source can't be read.
    #[error("reading `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when the directory can't be listed.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
}
