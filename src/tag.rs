//! Tag normalization and the [`TagIndex`], the derived tag views over one
//! listing of [`Post`]s.
//!
//! Tags have no identity beyond their string value. A tag is displayed as
//! authored (e.g. `Web Development`) and identified by its normalized form
//! (e.g. `web-development`), which is what tag page URLs carry. [`normalize`]
//! is the only bridge between the two, so every lookup goes through it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::post::Post;

/// Normalizes an authored tag into its identifier: lowercase, ASCII, with
/// runs of anything else collapsed into single hyphens. Pure and total, so
/// `macOS` and `MacOS` always resolve to the same value.
pub fn normalize(tag: &str) -> String {
    slug::slugify(tag)
}

/// Two or more distinct authored tags that normalize to the same identifier.
/// Reported, never fatal: the tag page still gets built, with its display
/// name picked by [`TagIndex::display_name`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collision {
    /// The shared identifier.
    pub id: String,

    /// The authored tags, sorted.
    pub variants: Vec<String>,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "tags {} all normalize to `{}`",
            self.variants
                .iter()
                .map(|v| format!("`{}`", v))
                .collect::<Vec<_>>()
                .join(", "),
            self.id
        )
    }
}

/// Derived tag queries over a borrowed listing. The listing isn't copied or
/// reordered; results that return posts keep the listing's order.
#[derive(Clone, Copy, Debug)]
pub struct TagIndex<'a> {
    posts: &'a [Post],
}

impl<'a> TagIndex<'a> {
    pub fn new(posts: &'a [Post]) -> TagIndex<'a> {
        TagIndex { posts }
    }

    fn tags(&self) -> impl Iterator<Item = &'a str> + 'a {
        let posts = self.posts;
        posts
            .iter()
            .flat_map(|post| post.tags.iter().map(String::as_str))
    }

    /// Every distinct tag as authored. Case is preserved, so `Go` and `go`
    /// are both present. Callers shouldn't depend on the ordering.
    pub fn unique_tags(&self) -> BTreeSet<&'a str> {
        self.tags().collect()
    }

    /// The posts with at least one tag that normalizes to `id`. An unknown
    /// or empty `id` yields an empty vector.
    pub fn posts_for_tag(&self, id: &str) -> Vec<&'a Post> {
        if id.is_empty() {
            return Vec::new();
        }
        self.posts
            .iter()
            .filter(|post| post.tags.iter().any(|tag| normalize(tag) == id))
            .collect()
    }

    /// The authored form to display for `id`: the first matching tag of the
    /// first matching post. When several spellings collide (see
    /// [`TagIndex::collisions`]) this depends on listing order.
    pub fn display_name(&self, id: &str) -> Option<&'a str> {
        if id.is_empty() {
            return None;
        }
        self.posts
            .iter()
            .find_map(|post| post.tags.iter().find(|tag| normalize(tag) == id))
            .map(String::as_str)
    }

    /// The identifiers of every tag, i.e. the set of tag pages. Tags that
    /// normalize to nothing (e.g. `!!!`) have no page.
    pub fn tag_ids(&self) -> BTreeSet<String> {
        self.unique_tags()
            .into_iter()
            .map(normalize)
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Every identifier reached from more than one authored spelling. Tags
    /// that normalize to nothing never collide.
    pub fn collisions(&self) -> Vec<Collision> {
        let mut by_id: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for tag in self.unique_tags() {
            let id = normalize(tag);
            if !id.is_empty() {
                by_id.entry(id).or_default().push(tag);
            }
        }

        by_id
            .into_iter()
            .filter(|(_, variants)| variants.len() > 1)
            .map(|(id, variants)| Collision {
                id,
                variants: variants.into_iter().map(str::to_owned).collect(),
            })
            .collect()
    }

    /// Unique tags grouped by their uppercased first character, each group
    /// sorted. Empty tags are left out.
    pub fn sections(&self) -> BTreeMap<char, Vec<&'a str>> {
        let mut sections: BTreeMap<char, Vec<&'a str>> = BTreeMap::new();
        for tag in self.unique_tags() {
            if let Some(first) = tag.chars().next() {
                let key = first.to_uppercase().next().unwrap_or(first);
                sections.entry(key).or_default().push(tag);
            }
        }
        sections
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_yaml::Mapping;
    use std::path::PathBuf;

    fn post(slug: &str, created_at: i64, tags: &[&str]) -> Post {
        Post {
            slug: slug.to_owned(),
            title: slug.to_owned(),
            author: None,
            created_at,
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            teaser: None,
            extra: Mapping::new(),
            body: String::new(),
            path: PathBuf::from(format!("posts/{}.md", slug)),
        }
    }

    fn slugs(posts: &[&Post]) -> Vec<String> {
        posts.iter().map(|p| p.slug.clone()).collect()
    }

    fn scenario() -> Vec<Post> {
        vec![
            post("hello-world", 1600000000, &["Go", "Testing"]),
            post("second", 1600000100, &["go"]),
        ]
    }

    #[test]
    fn test_normalize() {
        assert_eq!("go", normalize("Go"));
        assert_eq!("web-development", normalize("Web Development"));
        assert_eq!("hello-world", normalize("  Hello,   World! "));
        assert_eq!("macos", normalize("macOS"));
        assert_eq!("cafe", normalize("Café"));
        assert_eq!(normalize("MacOS"), normalize("macOS"));
    }

    #[test]
    fn test_unique_tags() {
        let posts = scenario();
        let index = TagIndex::new(&posts);
        let wanted: BTreeSet<&str> = ["Go", "Testing", "go"].iter().copied().collect();
        assert_eq!(wanted, index.unique_tags());
        assert_eq!(index.unique_tags(), index.unique_tags());
    }

    #[test]
    fn test_unique_tags_ignores_untagged_posts() {
        let posts = vec![post("a", 0, &[]), post("b", 0, &["Rust", "Rust"])];
        let wanted: BTreeSet<&str> = ["Rust"].iter().copied().collect();
        assert_eq!(wanted, TagIndex::new(&posts).unique_tags());
        assert!(TagIndex::new(&[]).unique_tags().is_empty());
    }

    #[test]
    fn test_unique_tags_is_order_independent() {
        fn owned(posts: &[Post]) -> BTreeSet<String> {
            TagIndex::new(posts)
                .unique_tags()
                .into_iter()
                .map(str::to_owned)
                .collect()
        }

        let mut posts = scenario();
        let forward = owned(&posts);
        posts.reverse();
        assert_eq!(forward, owned(&posts));
    }

    #[test]
    fn test_posts_for_tag() {
        let posts = scenario();
        let index = TagIndex::new(&posts);
        assert_eq!(vec!["hello-world", "second"], slugs(&index.posts_for_tag("go")));
        assert_eq!(vec!["hello-world"], slugs(&index.posts_for_tag("testing")));
        assert!(index.posts_for_tag("nonexistent-tag").is_empty());
        assert!(index.posts_for_tag("Go").is_empty());
    }

    #[test]
    fn test_posts_for_tag_matches_exactly_normalized_tags() {
        let posts = vec![
            post("a", 0, &["Web Development", "Rust"]),
            post("b", 1, &["web-development"]),
            post("c", 2, &["Rust"]),
            post("d", 3, &[]),
        ];
        let index = TagIndex::new(&posts);
        for tag in index.unique_tags() {
            let id = normalize(tag);
            let wanted: Vec<String> = posts
                .iter()
                .filter(|p| p.tags.iter().any(|t| normalize(t) == id))
                .map(|p| p.slug.clone())
                .collect();
            assert_eq!(wanted, slugs(&index.posts_for_tag(&id)), "tag {}", tag);
        }
    }

    #[test]
    fn test_display_name() {
        let posts = scenario();
        let index = TagIndex::new(&posts);
        assert_eq!(Some("Go"), index.display_name("go"));
        assert_eq!(Some("Testing"), index.display_name("testing"));
        assert_eq!(None, index.display_name("nonexistent-tag"));

        // First post wins, so the answer follows the listing order.
        let mut posts = scenario();
        posts.reverse();
        assert_eq!(Some("go"), TagIndex::new(&posts).display_name("go"));
    }

    #[test]
    fn test_tag_ids() {
        let posts = vec![post("a", 0, &["Go", "go", "Web Development", "!!!"])];
        let wanted: BTreeSet<String> = ["go", "web-development"]
            .iter()
            .map(|s| (*s).to_owned())
            .collect();
        assert_eq!(wanted, TagIndex::new(&posts).tag_ids());
    }

    #[test]
    fn test_collisions() {
        let posts = scenario();
        let collisions = TagIndex::new(&posts).collisions();
        assert_eq!(
            vec![Collision {
                id: "go".to_owned(),
                variants: vec!["Go".to_owned(), "go".to_owned()],
            }],
            collisions
        );
        assert_eq!("tags `Go`, `go` all normalize to `go`", collisions[0].to_string());

        let posts = vec![post("a", 0, &["Rust"]), post("b", 0, &["Rust"])];
        assert!(TagIndex::new(&posts).collisions().is_empty());
    }

    #[test]
    fn test_tags_without_an_id() {
        let posts = vec![post("a", 0, &["!!!", "???", ""]), post("b", 0, &["Rust"])];
        let index = TagIndex::new(&posts);
        assert!(index.posts_for_tag("").is_empty());
        assert_eq!(None, index.display_name(""));
        assert!(index.collisions().is_empty());
        assert_eq!(vec!["b"], slugs(&index.posts_for_tag("rust")));
    }

    #[test]
    fn test_sections() {
        let posts = vec![
            post("a", 0, &["go", "Go", "rust", "Testing", ""]),
            post("b", 0, &["react"]),
        ];
        let sections = TagIndex::new(&posts).sections();
        assert_eq!(vec!['G', 'R', 'T'], sections.keys().copied().collect::<Vec<_>>());
        assert_eq!(vec!["Go", "go"], sections[&'G']);
        assert_eq!(vec!["react", "rust"], sections[&'R']);
        assert_eq!(vec!["Testing"], sections[&'T']);
    }
}
