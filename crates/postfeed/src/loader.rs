use crate::error::{FeedError, IoContext, Result};
use crate::parsing::{
    MarkdownRenderer, extract_frontmatter, normalize_date, normalize_terms, scalar_field,
};
use crate::types::{FeedConfig, Post, canonical_url};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct PostLoader {
    base_url: String,
    default_author: String,
    renderer: MarkdownRenderer,
}

impl PostLoader {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            default_author: config.author.clone(),
            renderer: MarkdownRenderer::new(),
        }
    }

    /// Lazily yields one post per `*.md` file directly inside `dir`, in file-name order.
    pub fn load<'a>(&'a self, dir: &Path) -> Result<impl Iterator<Item = Result<Post>> + use<'a>> {
        let metadata = fs::metadata(dir).read_context(dir)?;
        if !metadata.is_dir() {
            return Err(FeedError::Filesystem {
                path: dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotADirectory,
                    "posts path is not a directory",
                ),
            });
        }

        let root = dir.to_path_buf();
        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter();

        Ok(entries.filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    let path = error
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.clone());
                    return Some(Err(FeedError::Filesystem {
                        path,
                        source: error.into(),
                    }));
                }
            };

            let path = entry.path();
            // Follows symlinks so linked posts count as files.
            if !path.is_file() || !is_markdown(path) {
                return None;
            }

            Some(self.parse_post(path))
        }))
    }

    pub fn parse_post(&self, path: &Path) -> Result<Post> {
        log::info!("Processing: {}", path.display());

        let file_content = fs::read_to_string(path).read_context(path)?;
        let (frontmatter, body) = extract_frontmatter(&file_content, path)?;

        let stem = file_stem(path);
        let title = scalar_field(&frontmatter, "title", path)?.unwrap_or_else(|| stem.clone());
        let author = scalar_field(&frontmatter, "author", path)?
            .unwrap_or_else(|| self.default_author.clone());
        let publication_date = normalize_date(frontmatter.get("date"), path)?;
        let tags = normalize_terms(&frontmatter, "tags", path)?;
        let categories = normalize_terms(&frontmatter, "categories", path)?;

        Ok(Post {
            title,
            author,
            publication_date,
            tags,
            categories,
            canonical_url: canonical_url(&self.base_url, &stem),
            content_html: self.renderer.render(&body),
            source_path: PathBuf::from(path),
        })
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension == "md")
        .unwrap_or(false)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use tempfile::TempDir;

    fn config() -> FeedConfig {
        FeedConfig {
            base_url: "https://example.com/blog".to_string(),
            author: "Default Author".to_string(),
            ..FeedConfig::default()
        }
    }

    fn load_all(dir: &Path) -> Result<Vec<Post>> {
        let config = config();
        let loader = PostLoader::new(&config);
        loader.load(dir)?.collect()
    }

    #[test]
    fn test_loads_markdown_files_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "---\ntitle: A\ndate: 2024-01-01\n---\nBody").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a post").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested/b.md"),
            "---\ntitle: B\ndate: 2024-01-01\n---\nBody",
        )
        .unwrap();

        let posts = load_all(dir.path()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "A");
    }

    #[test]
    fn test_fallbacks_from_stem_and_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("untitled-post.md"), "---\ndate: 2024-02-02\n---\n*hi*").unwrap();

        let posts = load_all(dir.path()).unwrap();
        let post = &posts[0];
        assert_eq!(post.title, "untitled-post");
        assert_eq!(post.author, "Default Author");
        assert_eq!(post.canonical_url, "https://example.com/blog/untitled-post/");
        assert!(post.content_html.contains("<em>hi</em>"));
        assert!(post.tags.is_empty());
        assert!(post.categories.is_empty());
        assert_eq!(post.publication_date.day(), 2);
    }

    #[test]
    fn test_metadata_fields() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("full.md"),
            "---\ntitle: Full\nauthor: Ada\ndate: 2024-05-05T09:00:00+01:00\ntags: [x, y]\ncategories: Notes\n---\nBody",
        )
        .unwrap();

        let posts = load_all(dir.path()).unwrap();
        let post = &posts[0];
        assert_eq!(post.author, "Ada");
        assert_eq!(post.tags, vec!["x", "y"]);
        assert_eq!(post.categories, vec!["Notes"]);
        assert_eq!(post.publication_date.offset().local_minus_utc(), 3600);
        assert_eq!(post.source_path, dir.path().join("full.md"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_post_is_loaded() {
        let dir = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        let target = shared.path().join("shared.md");
        fs::write(&target, "---\ntitle: Shared\ndate: 2024-01-01\n---\nBody").unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("linked.md")).unwrap();
        std::os::unix::fs::symlink(shared.path(), dir.path().join("linked-dir.md")).unwrap();

        let posts = load_all(dir.path()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Shared");
        assert_eq!(posts[0].canonical_url, "https://example.com/blog/linked/");
    }

    #[test]
    fn test_list_title_is_invalid_field() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("listy.md"),
            "---\ntitle: [a, b]\ndate: 2024-01-01\n---\nBody",
        )
        .unwrap();

        let error = load_all(dir.path()).unwrap_err();
        assert!(matches!(error, FeedError::InvalidField { ref field, .. } if field == "title"));
        assert!(error.to_string().contains("listy.md"));
    }

    #[test]
    fn test_mapping_author_is_invalid_field() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("mapped.md"),
            "---\nauthor:\n  name: Ada\ndate: 2024-01-01\n---\nBody",
        )
        .unwrap();

        let error = load_all(dir.path()).unwrap_err();
        assert!(matches!(error, FeedError::InvalidField { ref field, .. } if field == "author"));
    }

    #[test]
    fn test_missing_directory_is_filesystem_error() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let loader = PostLoader::new(&config);
        let result = loader.load(&dir.path().join("missing"));
        assert!(matches!(result, Err(FeedError::Filesystem { .. })));
    }

    #[test]
    fn test_bad_date_aborts_with_file_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.md"), "---\ndate: the other day\n---\nBody").unwrap();

        let error = load_all(dir.path()).unwrap_err();
        assert!(matches!(error, FeedError::DateParse { .. }));
        assert!(error.to_string().contains("bad.md"));
    }

    #[test]
    fn test_malformed_file_aborts_whole_load() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a-good.md"), "---\ndate: 2024-01-01\n---\nBody").unwrap();
        fs::write(dir.path().join("b-bad.md"), "no front matter here").unwrap();

        let error = load_all(dir.path()).unwrap_err();
        assert!(matches!(error, FeedError::MalformedFrontMatter { .. }));
    }

    #[test]
    fn test_canonical_url_needs_only_stem() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hello.md"), "---\ndate: 2024-01-01\n---\nlong body").unwrap();

        let posts = load_all(dir.path()).unwrap();
        assert_eq!(
            posts[0].canonical_url,
            canonical_url(&config().base_url, "hello")
        );
    }
}
