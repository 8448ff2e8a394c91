//! The library code for `folio`, the post pipeline behind a static blog. It
//! reads a directory of markdown posts and hands whatever renders the site a
//! read-only snapshot of them. The pipeline runs once per build, in order:
//!
//! 1. Splitting each source file's YAML frontmatter from its body
//!    ([`crate::frontmatter`])
//! 2. Validating the frontmatter into typed posts ([`crate::post`]) and
//!    deriving each post's slug from its file name ([`crate::repository`])
//! 3. Answering tag queries over the posts ([`crate::tag`])
//!
//! [`crate::build::Site`] ties these together with the site settings loaded
//! by [`crate::config`].
//!
//! Tags are identified by their normalized form ([`crate::tag::normalize`]),
//! so `Go` and `go` share a tag page. The display name for that page is the
//! first spelling found in listing order, and the listing is in file name
//! order, so the choice is stable between builds of the same directory.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod frontmatter;
pub mod post;
pub mod repository;
pub mod tag;
