use postfeed::{FeedConfig, OutputMode, Pipeline};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct Overrides {
    pub posts: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub mode: Option<OutputMode>,
    pub base_url: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut FeedConfig) {
        if let Some(posts) = self.posts {
            config.posts_dir = posts;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(url) = self.base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
    }
}

pub fn init_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err(format!("{} already exists", path.display()).into());
    }

    fs::write(path, FeedConfig::default().to_toml()?)?;
    println!("Created {}", path.display());

    Ok(())
}

pub fn build_feeds(
    config_path: &Path,
    overrides: Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = FeedConfig::load_or_default(config_path)?;
    overrides.apply(&mut config);

    log::debug!("Output mode: {}", config.mode);
    let start = Instant::now();

    let summary = Pipeline::new(config).run()?;

    println!(
        "Built {} posts in {} categories to {} in {:.2?}",
        summary.posts,
        summary.categories,
        summary.feeds_dir.display(),
        start.elapsed()
    );

    Ok(())
}
