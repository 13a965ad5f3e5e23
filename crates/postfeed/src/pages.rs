use crate::error::{FeedError, IoContext, Result};
use crate::index::{CategoryGroup, PostIndex};
use crate::types::{FeedConfig, OutputMode};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const RSS_FILE: &str = "rss.xml";
pub const ATOM_FILE: &str = "atom.xml";
pub const JSON_FILE: &str = "feed.json";
pub const HTML_FILE: &str = "feed.html";
const GLOBAL_FILES: [&str; 4] = [RSS_FILE, ATOM_FILE, JSON_FILE, HTML_FILE];

const SOURCE_FEEDS_DIR: &str = "_static/feeds";
const SOURCE_PAGES_DIR: &str = "categories";
const INDEX_STEM: &str = "categories";

/// Lower-cases and turns spaces into hyphens. Punctuation and non-ASCII pass through.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

pub fn validate_slug(slug: &str, category: &str) -> Result<()> {
    let unusable = slug.is_empty()
        || slug == "."
        || slug == ".."
        || slug.contains(['/', '\\'])
        || slug.chars().any(char::is_control);

    if unusable {
        return Err(FeedError::InvalidSlug {
            category: category.to_string(),
            reason: "not a valid file name".to_string(),
        });
    }

    Ok(())
}

pub fn title_case(name: &str) -> String {
    let mut output = String::with_capacity(name.len());
    let mut at_word_start = true;

    for character in name.chars() {
        if at_word_start {
            output.extend(character.to_uppercase());
        } else {
            output.extend(character.to_lowercase());
        }
        at_word_start = character.is_whitespace() || character == '-';
    }

    output
}

/// Where feeds and pages go, and how pages refer to them.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub mode: OutputMode,
    pub feeds_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub index_path: PathBuf,
    feeds_url: String,
    extension: String,
}

impl OutputLayout {
    pub fn from_config(config: &FeedConfig) -> Self {
        let extension = config.markup_extension.trim_start_matches('.').to_string();
        let index_name = format!("{INDEX_STEM}.{extension}");

        let (feeds_dir, pages_dir, index_path) = match config.mode {
            OutputMode::Build => (
                config.output_dir.clone(),
                config.output_dir.clone(),
                config.output_dir.join(&index_name),
            ),
            OutputMode::Source => (
                config.source_root.join(SOURCE_FEEDS_DIR),
                config.source_root.join(SOURCE_PAGES_DIR),
                config.source_root.join(&index_name),
            ),
        };

        Self {
            mode: config.mode,
            feeds_dir,
            pages_dir,
            index_path,
            feeds_url: config.feeds_url(),
            extension,
        }
    }

    pub fn feed_path(&self, file_name: &str) -> PathBuf {
        self.feeds_dir.join(file_name)
    }

    pub fn category_feed_path(&self, slug: &str) -> PathBuf {
        self.feed_path(&format!("{slug}.xml"))
    }

    pub fn page_path(&self, slug: &str) -> PathBuf {
        self.pages_dir.join(format!("{slug}.{}", self.extension))
    }

    pub fn feed_link(&self, slug: &str) -> String {
        match self.mode {
            OutputMode::Build => format!("[RSS feed]({}/{slug}.xml)", self.feeds_url),
            OutputMode::Source => {
                let up = "../".repeat(Path::new(SOURCE_PAGES_DIR).components().count());
                format!("{{download}}`RSS feed <{up}{SOURCE_FEEDS_DIR}/{slug}.xml>`")
            }
        }
    }

    /// Fails when a category would write over a global document, the index, or
    /// another category's files.
    pub fn check_collisions(&self, groups: &[CategoryGroup]) -> Result<()> {
        let mut owners: HashMap<PathBuf, Option<&str>> = GLOBAL_FILES
            .iter()
            .map(|name| (self.feed_path(name), None))
            .collect();
        owners.insert(self.index_path.clone(), None);

        for group in groups {
            validate_slug(&group.slug, &group.display_name)?;

            for path in [self.category_feed_path(&group.slug), self.page_path(&group.slug)] {
                let reason = format!("{} is already generated", path.display());
                match owners.insert(path, Some(&group.display_name)) {
                    None => {}
                    Some(Some(existing)) if existing != group.display_name => {
                        return Err(FeedError::DuplicateSlug {
                            slug: group.slug.clone(),
                            category: group.display_name.clone(),
                            existing: existing.to_string(),
                        });
                    }
                    Some(_) => {
                        return Err(FeedError::InvalidSlug {
                            category: group.display_name.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    pub fn toctree_entry(&self, slug: &str) -> String {
        match self.mode {
            OutputMode::Build => slug.to_string(),
            OutputMode::Source => format!("{SOURCE_PAGES_DIR}/{slug}"),
        }
    }
}

pub fn category_page(group: &CategoryGroup, index: &PostIndex, feed_link: &str) -> String {
    let mut page = format!("# {}\n\n{}\n\n", title_case(&group.display_name), feed_link);

    for post in group.posts(index) {
        page.push_str(&format!(
            "- [{}]({})\n",
            escape_link_text(&post.title),
            post.canonical_url
        ));
    }

    page
}

fn escape_link_text(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for character in text.chars() {
        if matches!(character, '\\' | '[' | ']' | '`') {
            output.push('\\');
        }
        output.push(character);
    }
    output
}

pub fn categories_index<'a>(entries: impl IntoIterator<Item = &'a str>) -> String {
    let mut page = String::from("# Categories\n\n```{toctree}\n:maxdepth: 1\n\n");

    for entry in entries {
        page.push_str(entry);
        page.push('\n');
    }

    page.push_str("```\n");
    page
}

pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).write_context(parent)?;
    }
    fs::write(path, contents).write_context(path)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

pub struct SitePageWriter<'a> {
    layout: &'a OutputLayout,
}

impl<'a> SitePageWriter<'a> {
    pub fn new(layout: &'a OutputLayout) -> Self {
        Self { layout }
    }

    pub fn write_category(&self, group: &CategoryGroup, index: &PostIndex) -> Result<PathBuf> {
        validate_slug(&group.slug, &group.display_name)?;

        let path = self.layout.page_path(&group.slug);
        let page = category_page(group, index, &self.layout.feed_link(&group.slug));
        write_output(&path, &page)?;

        Ok(path)
    }

    pub fn write_index(&self, groups: &[CategoryGroup]) -> Result<PathBuf> {
        let entries: Vec<String> = groups
            .iter()
            .map(|group| self.layout.toctree_entry(&group.slug))
            .collect();

        let path = self.layout.index_path.clone();
        write_output(&path, &categories_index(entries.iter().map(String::as_str)))?;

        Ok(path)
    }
}
