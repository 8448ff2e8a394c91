use std::path::Path;

use anyhow::{anyhow, Result};
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use serde::Serialize;

use folio::build::Site;
use folio::frontmatter;
use folio::post::{sort_by_created_at, Post};
use folio::tag::normalize;

/// A post as it appears in list views.
#[derive(Serialize)]
struct Preview<'a> {
    slug: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
    #[serde(rename = "createdAt")]
    created_at: i64,
    date: String,
    tags: Vec<&'a str>,
    summary: String,
}

impl<'a> From<&'a Post> for Preview<'a> {
    fn from(post: &'a Post) -> Preview<'a> {
        Preview {
            slug: &post.slug,
            title: &post.title,
            author: post.author.as_deref(),
            created_at: post.created_at,
            date: post.display_date(),
            tags: post.sorted_tags(),
            summary: post.summary(),
        }
    }
}

#[derive(Serialize)]
struct TagPage<'a> {
    id: String,
    display: String,
    posts: Vec<Preview<'a>>,
}

#[derive(Clone, Copy, PartialEq)]
enum Format {
    Text,
    Yaml,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let matches = App::new("folio")
        .version(crate_version!())
        .about("Inspects the posts and tags of a blog")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("project")
                .long("project")
                .short("p")
                .takes_value(true)
                .default_value(".")
                .help("Directory to search upward from for `siteconfig.yaml`"),
        )
        .arg(
            Arg::with_name("format")
                .long("format")
                .short("f")
                .takes_value(true)
                .possible_values(&["text", "yaml"])
                .default_value("text")
                .help("Output format"),
        )
        .subcommand(SubCommand::with_name("list").about("Lists all posts, newest first"))
        .subcommand(SubCommand::with_name("tags").about("Lists all tags by first letter"))
        .subcommand(
            SubCommand::with_name("tag")
                .about("Lists the posts for a tag, oldest first")
                .arg(Arg::with_name("ID").required(true).help("The tag or its identifier")),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("Prints a single post")
                .arg(Arg::with_name("SLUG").required(true).help("The post's slug")),
        )
        .get_matches();

    // `project` and `format` have defaults, so they're always present.
    let project = Path::new(matches.value_of("project").unwrap_or("."));
    let format = match matches.value_of("format") {
        Some("yaml") => Format::Yaml,
        _ => Format::Text,
    };

    let site = Site::from_directory(project)?;
    match matches.subcommand() {
        ("list", _) => list(&site, format),
        ("tags", _) => tags(&site, format),
        ("tag", Some(sub)) => tag(&site, format, sub),
        ("show", Some(sub)) => show(&site, format, sub),
        (other, _) => Err(anyhow!("unknown command `{}`", other)),
    }
}

fn print_yaml<T: Serialize>(value: &T) -> Result<()> {
    print!("{}", serde_yaml::to_string(value)?);
    Ok(())
}

fn list(site: &Site, format: Format) -> Result<()> {
    let posts = site.posts_newest_first();
    let previews: Vec<Preview> = posts.iter().map(Preview::from).collect();
    if format == Format::Yaml {
        return print_yaml(&previews);
    }

    println!("{}", site.config.title);
    for preview in &previews {
        println!("{}  {}  {}", preview.date, preview.slug, preview.title);
        if !preview.tags.is_empty() {
            println!("    tags: {}", preview.tags.join(", "));
        }
    }
    Ok(())
}

fn tags(site: &Site, format: Format) -> Result<()> {
    let sections = site.tags().sections();
    if format == Format::Yaml {
        return print_yaml(&sections);
    }

    for (letter, tags) in &sections {
        println!("{}", letter);
        for tag in tags {
            println!("    {} ({})", tag, normalize(tag));
        }
    }
    Ok(())
}

fn tag(site: &Site, format: Format, matches: &ArgMatches) -> Result<()> {
    let id = normalize(matches.value_of("ID").unwrap_or_default());
    let index = site.tags();
    let mut posts: Vec<Post> = index.posts_for_tag(&id).into_iter().cloned().collect();
    sort_by_created_at(&mut posts);

    let page = TagPage {
        display: index.display_name(&id).unwrap_or(&id).to_owned(),
        id,
        posts: posts.iter().map(Preview::from).collect(),
    };
    if format == Format::Yaml {
        return print_yaml(&page);
    }

    println!("{} Articles", page.display);
    if page.posts.is_empty() {
        println!("Zero Posts!");
    }
    for preview in &page.posts {
        println!("{}  {}", preview.date, preview.title);
        println!("    {}", preview.summary);
    }
    Ok(())
}

fn show(site: &Site, format: Format, matches: &ArgMatches) -> Result<()> {
    let slug = matches.value_of("SLUG").unwrap_or_default();
    let post = site
        .post(slug)
        .ok_or_else(|| anyhow!("no post with the slug `{}`", slug))?;
    if format == Format::Yaml {
        return print_yaml(post);
    }

    print!("{}", frontmatter::render(&post.to_metadata(), &post.body)?);
    Ok(())
}
