use crate::error::Result;
use crate::index::CategoryGroup;
use crate::types::{FeedConfig, Post};
use crate::xml::escape;
use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Global,
    Category { display_name: String, slug: String },
}

impl Scope {
    pub fn category(group: &CategoryGroup) -> Self {
        Scope::Category {
            display_name: group.display_name.clone(),
            slug: group.slug.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub rss_self: String,
    pub atom_self: Option<String>,
}

impl Channel {
    pub fn for_scope(scope: &Scope, config: &FeedConfig) -> Self {
        let base_url = config.base_url();
        let feeds_url = config.feeds_url();

        match scope {
            Scope::Global => Self {
                id: base_url.to_string(),
                title: config.title.clone(),
                link: base_url.to_string(),
                description: config.description.clone(),
                language: config.language.clone(),
                rss_self: format!("{feeds_url}/rss.xml"),
                atom_self: Some(format!("{feeds_url}/atom.xml")),
            },
            Scope::Category { display_name, slug } => {
                let link = format!("{base_url}/categories/{slug}/");
                Self {
                    id: link.clone(),
                    title: format!("{} - {}", config.title, display_name),
                    link,
                    description: format!("{} ({})", config.description, display_name),
                    language: config.language.clone(),
                    rss_self: format!("{feeds_url}/{slug}.xml"),
                    atom_self: None,
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    id: String,
    title: String,
    link: String,
    author: String,
    published: DateTime<FixedOffset>,
    description: String,
    terms: Vec<String>,
}

/// One feed document under construction. Each scope owns its own instance.
#[derive(Debug, Clone)]
pub struct Feed {
    channel: Channel,
    entries: Vec<Entry>,
}

impl Feed {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, post: &Post) {
        self.entries.push(Entry {
            id: post.canonical_url.clone(),
            title: post.title.clone(),
            link: post.canonical_url.clone(),
            author: post.author.clone(),
            published: post.publication_date,
            description: post.content_html.clone(),
            terms: post.terms().map(String::from).collect(),
        });
    }

    pub fn extend<'a>(&mut self, posts: impl IntoIterator<Item = &'a Post>) {
        for post in posts {
            self.push(post);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn newest(&self) -> Option<DateTime<FixedOffset>> {
        self.entries.iter().map(|entry| entry.published).max()
    }

    pub fn to_rss(&self) -> String {
        let channel = &self.channel;

        let mut items = String::new();
        for entry in &self.entries {
            let categories: String = entry
                .terms
                .iter()
                .map(|term| format!("      <category>{}</category>\n", escape(term)))
                .collect();

            items.push_str(&format!(
                r#"    <item>
      <title>{}</title>
      <link>{}</link>
      <guid isPermaLink="true">{}</guid>
      <dc:creator>{}</dc:creator>
      <pubDate>{}</pubDate>
      <description>{}</description>
{}    </item>
"#,
                escape(&entry.title),
                escape(&entry.link),
                escape(&entry.id),
                escape(&entry.author),
                entry.published.to_rfc2822(),
                escape(&entry.description),
                categories
            ));
        }

        let last_build = self
            .newest()
            .map(|date| format!("    <lastBuildDate>{}</lastBuildDate>\n", date.to_rfc2822()))
            .unwrap_or_default();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>{}</title>
    <link>{}</link>
    <description>{}</description>
    <language>{}</language>
{}    <atom:link href="{}" rel="self" type="application/rss+xml"/>
{}  </channel>
</rss>
"#,
            escape(&channel.title),
            escape(&channel.link),
            escape(&channel.description),
            escape(&channel.language),
            last_build,
            escape(&channel.rss_self),
            items
        )
    }

    pub fn to_atom(&self) -> String {
        let channel = &self.channel;

        let updated = self
            .newest()
            .unwrap_or_default()
            .to_rfc3339();

        let mut entries = String::new();
        for entry in &self.entries {
            let categories: String = entry
                .terms
                .iter()
                .map(|term| format!("    <category term=\"{}\"/>\n", escape(term)))
                .collect();

            entries.push_str(&format!(
                r#"  <entry>
    <id>{id}</id>
    <title>{title}</title>
    <link href="{link}" rel="alternate"/>
    <author>
      <name>{author}</name>
    </author>
    <published>{published}</published>
    <updated>{published}</updated>
    <content type="html">{content}</content>
{categories}  </entry>
"#,
                id = escape(&entry.id),
                title = escape(&entry.title),
                link = escape(&entry.link),
                author = escape(&entry.author),
                published = entry.published.to_rfc3339(),
                content = escape(&entry.description),
                categories = categories,
            ));
        }

        let self_link = channel
            .atom_self
            .as_deref()
            .map(|href| format!("  <link href=\"{}\" rel=\"self\"/>\n", escape(href)))
            .unwrap_or_default();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="{language}">
  <id>{id}</id>
  <title>{title}</title>
  <subtitle>{description}</subtitle>
  <link href="{link}" rel="alternate"/>
{self_link}  <updated>{updated}</updated>
{entries}</feed>
"#,
            language = escape(&channel.language),
            id = escape(&channel.id),
            title = escape(&channel.title),
            description = escape(&channel.description),
            link = escape(&channel.link),
            self_link = self_link,
            updated = updated,
            entries = entries,
        )
    }
}

pub fn render_json(posts: &[Post]) -> Result<String> {
    let mut json = serde_json::to_string_pretty(posts)?;
    json.push('\n');
    Ok(json)
}

pub fn render_html(posts: &[Post], config: &FeedConfig) -> String {
    let title = escape(&config.title);

    let items: String = posts
        .iter()
        .map(|post| {
            format!(
                "<li><a href='{}'>{}</a> &ndash; {}</li>",
                escape(&post.canonical_url),
                escape(&post.title),
                post.publication_date.to_rfc3339()
            )
        })
        .collect();

    format!(
        "<html><head><title>{title}</title></head><body><h1>{title}</h1><ul>{items}</ul></body></html>\n"
    )
}
