//! Exports [`Site`], the snapshot of everything one site build reads: the
//! site settings from the [`Config`] and the posts from its
//! [`crate::repository::Repository`]. Whatever renders the pages consumes a
//! [`Site`] and treats it as read-only.

use std::path::Path;

use log::{info, warn};
use thiserror::Error;

use crate::config::{Config, Error as ConfigError, SiteConfig};
use crate::post::{sort_by_created_at, Post};
use crate::repository::Error as RepositoryError;
use crate::tag::TagIndex;

/// The posts and settings for one build.
#[derive(Clone, Debug)]
pub struct Site {
    pub config: SiteConfig,
    pub posts: Vec<Post>,
}

impl Site {
    /// Finds the [`Config`] for the project containing `dir` and loads the
    /// site from it.
    pub fn from_directory(dir: &Path) -> Result<Site> {
        let config = Config::from_directory(dir)?;
        Site::load(&config)
    }

    /// Reads every post from the configured directory. Tag normalization
    /// collisions are logged but don't fail the build; any other problem does.
    pub fn load(config: &Config) -> Result<Site> {
        let posts = config.repository().list_all()?;
        info!(
            "loaded {} posts from `{}`",
            posts.len(),
            config.posts_source_directory.display()
        );

        for collision in TagIndex::new(&posts).collisions() {
            warn!("{}; the `{}` tag lists posts for all of them", collision, collision.id);
        }

        Ok(Site {
            config: config.site.clone(),
            posts,
        })
    }

    pub fn tags(&self) -> TagIndex<'_> {
        TagIndex::new(&self.posts)
    }

    pub fn post(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|post| post.slug == slug)
    }

    /// The posts for the home page: newest first.
    pub fn posts_newest_first(&self) -> Vec<Post> {
        let mut posts = self.posts.clone();
        sort_by_created_at(&mut posts);
        posts.reverse();
        posts
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for loading a [`Site`].
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for errors loading the configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Returned for errors reading posts.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
