//! Loads the site's [`Config`] from a `siteconfig.yaml` project file:
//!
//! ```yaml
//! title: Steven Leiva
//! description: My home on the internet.
//! posts_directory: posts      # default, relative to this file
//! extensions: [md, markdown]  # default
//! ```

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::{Repository, DEFAULT_EXTENSIONS};

/// The name of the project file.
pub const PROJECT_FILE: &str = "siteconfig.yaml";

#[derive(Deserialize)]
struct PostsDirectory(PathBuf);
impl Default for PostsDirectory {
    fn default() -> Self {
        PostsDirectory(PathBuf::from("posts"))
    }
}

#[derive(Deserialize)]
struct Extensions(Vec<String>);
impl Default for Extensions {
    fn default() -> Self {
        Extensions(DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_owned()).collect())
    }
}

#[derive(Deserialize)]
struct Project {
    title: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    posts_directory: PostsDirectory,

    #[serde(default)]
    extensions: Extensions,
}

/// The site-level settings handed through to whatever renders the pages.
/// Reading posts doesn't depend on them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub site: SiteConfig,

    /// The directory holding post sources, resolved against the directory
    /// containing the project file.
    pub posts_source_directory: PathBuf,

    /// Post source file extensions.
    pub extensions: Vec<String>,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a project file and
    /// loads the first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        for ancestor in dir.ancestors() {
            let path = ancestor.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path);
            }
        }
        Err(Error::NotFound(dir.to_owned()))
    }

    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Yaml {
            path: path.to_owned(),
            err,
        })?;

        let project_root = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Config {
            site: SiteConfig {
                title: project.title,
                description: project.description,
            },
            posts_source_directory: project_root.join(project.posts_directory.0),
            extensions: project.extensions.0,
        })
    }

    /// A [`Repository`] over the configured posts directory.
    pub fn repository(&self) -> Repository {
        Repository::with_extensions(&self.posts_source_directory, self.extensions.iter().cloned())
    }
}

/// The result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Config`].
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when no project file exists in the directory or any of its
    /// ancestors.
    #[error(
        "could not find `siteconfig.yaml` in `{}` or any parent directory",
        .0.display()
    )]
    NotFound(PathBuf),

    /// Returned when the project file can't be opened.
    #[error("opening project file `{}`", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when the project file isn't valid YAML or lacks a `title`.
    #[error("loading project file `{}`", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },
}
