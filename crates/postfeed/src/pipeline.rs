use crate::error::Result;
use crate::feeds::{Channel, Feed, Scope, render_html, render_json};
use crate::index::PostIndex;
use crate::loader::PostLoader;
use crate::pages::{
    ATOM_FILE, HTML_FILE, JSON_FILE, OutputLayout, RSS_FILE, SitePageWriter, write_output,
};
use crate::types::FeedConfig;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub posts: usize,
    pub categories: usize,
    pub feeds_dir: PathBuf,
    pub written: Vec<PathBuf>,
}

pub struct Pipeline {
    config: FeedConfig,
    layout: OutputLayout,
}

impl Pipeline {
    pub fn new(config: FeedConfig) -> Self {
        let layout = OutputLayout::from_config(&config);
        Self { config, layout }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn run(&self) -> Result<BuildSummary> {
        let loader = PostLoader::new(&self.config);
        let index = PostIndex::build(loader.load(&self.config.posts_dir)?)?;

        self.layout.check_collisions(index.groups())?;

        let mut written = Vec::new();

        let mut global = Feed::new(Channel::for_scope(&Scope::Global, &self.config));
        global.extend(index.posts());
        let documents = [
            (RSS_FILE, global.to_rss()),
            (ATOM_FILE, global.to_atom()),
            (JSON_FILE, render_json(index.posts())?),
            (HTML_FILE, render_html(index.posts(), &self.config)),
        ];
        for (file_name, contents) in &documents {
            let path = self.layout.feed_path(file_name);
            write_output(&path, contents)?;
            written.push(path);
        }

        let writer = SitePageWriter::new(&self.layout);
        for group in index.groups() {
            let mut feed = Feed::new(Channel::for_scope(&Scope::category(group), &self.config));
            feed.extend(group.posts(&index));

            let path = self.layout.category_feed_path(&group.slug);
            write_output(&path, &feed.to_rss())?;
            written.push(path);
            written.push(writer.write_category(group, &index)?);
        }
        written.push(writer.write_index(index.groups())?);

        log::info!(
            "Feeds written to: {} ({} posts, {} categories)",
            self.layout.feeds_dir.display(),
            index.posts().len(),
            index.groups().len()
        );

        Ok(BuildSummary {
            posts: index.posts().len(),
            categories: index.groups().len(),
            feeds_dir: self.layout.feeds_dir.clone(),
            written,
        })
    }
}
