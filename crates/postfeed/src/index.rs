use crate::error::Result;
use crate::pages::slugify;
use crate::types::Post;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CategoryGroup {
    pub key: String,
    pub display_name: String,
    pub slug: String,
    members: Vec<usize>,
}

impl CategoryGroup {
    /// Posts in this category, newest first.
    pub fn posts<'a>(&'a self, index: &'a PostIndex) -> impl Iterator<Item = &'a Post> + 'a {
        self.members.iter().map(|&position| &index.posts[position])
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostIndex {
    posts: Vec<Post>,
    groups: Vec<CategoryGroup>,
    positions: HashMap<String, usize>,
}

impl PostIndex {
    /// Materializes the posts, newest first. Equal dates keep encounter order.
    pub fn build(posts: impl IntoIterator<Item = Result<Post>>) -> Result<Self> {
        let mut posts = posts.into_iter().collect::<Result<Vec<_>>>()?;
        posts.sort_by(|a, b| b.publication_date.cmp(&a.publication_date));

        let mut index = Self {
            posts,
            ..Self::default()
        };
        index.group_by_category();

        Ok(index)
    }

    fn group_by_category(&mut self) {
        for (position, post) in self.posts.iter().enumerate() {
            for category in &post.categories {
                let key = category.to_lowercase();
                let slot = match self.positions.get(&key) {
                    Some(&slot) => slot,
                    None => {
                        self.groups.push(CategoryGroup {
                            slug: slugify(category),
                            display_name: category.clone(),
                            key: key.clone(),
                            members: Vec::new(),
                        });
                        self.positions.insert(key, self.groups.len() - 1);
                        self.groups.len() - 1
                    }
                };

                let members = &mut self.groups[slot].members;
                if members.last() != Some(&position) {
                    members.push(position);
                }
            }
        }

        for group in &self.groups {
            log::debug!("Category '{}': {} posts", group.key, group.len());
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Groups in the order their category was first encountered.
    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    pub fn group(&self, key: &str) -> Option<&CategoryGroup> {
        self.positions
            .get(&key.to_lowercase())
            .map(|&slot| &self.groups[slot])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::parsing::parse_date;
    use std::path::PathBuf;

    fn post(title: &str, date: &str, categories: &[&str]) -> Post {
        Post {
            title: title.to_string(),
            author: "pfd".to_string(),
            publication_date: parse_date(date).unwrap(),
            tags: vec![],
            categories: categories.iter().map(|c| c.to_string()).collect(),
            canonical_url: format!("https://example.com/{}/", title.to_lowercase()),
            content_html: String::new(),
            source_path: PathBuf::from(format!("{}.md", title.to_lowercase())),
        }
    }

    fn titles<'a>(posts: impl Iterator<Item = &'a Post>) -> Vec<&'a str> {
        posts.map(|post| post.title.as_str()).collect()
    }

    #[test]
    fn test_sorted_newest_first() {
        let index = PostIndex::build(vec![
            Ok(post("Hello", "2024-01-01", &["Notes"])),
            Ok(post("World", "2024-06-01", &["Notes"])),
        ])
        .unwrap();

        assert_eq!(titles(index.posts().iter()), vec!["World", "Hello"]);
        let notes = index.group("notes").unwrap();
        assert_eq!(titles(notes.posts(&index)), vec!["World", "Hello"]);
        assert_eq!(index.groups().len(), 1);
    }

    #[test]
    fn test_equal_dates_keep_encounter_order() {
        let index = PostIndex::build(vec![
            Ok(post("First", "2024-03-03", &[])),
            Ok(post("Second", "2024-03-03", &[])),
            Ok(post("Newest", "2024-04-04", &[])),
            Ok(post("Third", "2024-03-03", &[])),
        ])
        .unwrap();

        assert_eq!(
            titles(index.posts().iter()),
            vec!["Newest", "First", "Second", "Third"]
        );
    }

    #[test]
    fn test_post_in_every_category_bucket() {
        let index = PostIndex::build(vec![Ok(post("Both", "2024-01-01", &["A", "B"]))]).unwrap();

        assert_eq!(index.posts().len(), 1);
        assert_eq!(index.group("a").unwrap().len(), 1);
        assert_eq!(index.group("b").unwrap().len(), 1);
    }

    #[test]
    fn test_case_insensitive_grouping_keeps_first_spelling() {
        let index = PostIndex::build(vec![
            Ok(post("Old", "2024-01-01", &["rust tips"])),
            Ok(post("New", "2024-02-01", &["Rust Tips"])),
        ])
        .unwrap();

        let group = index.group("RUST TIPS").unwrap();
        assert_eq!(group.display_name, "Rust Tips");
        assert_eq!(group.slug, "rust-tips");
        assert_eq!(titles(group.posts(&index)), vec!["New", "Old"]);
    }

    #[test]
    fn test_repeated_category_counts_once() {
        let index =
            PostIndex::build(vec![Ok(post("Twice", "2024-01-01", &["Notes", "notes"]))]).unwrap();
        assert_eq!(index.group("notes").unwrap().len(), 1);
    }

    #[test]
    fn test_groups_in_first_encountered_order() {
        let index = PostIndex::build(vec![
            Ok(post("Older", "2024-01-01", &["Zebra"])),
            Ok(post("Newer", "2024-02-01", &["Yak", "Aardvark"])),
        ])
        .unwrap();

        let keys: Vec<&str> = index.groups().iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["yak", "aardvark", "zebra"]);
    }

    #[test]
    fn test_uncategorized_post_only_in_master() {
        let index = PostIndex::build(vec![Ok(post("Loose", "2024-01-01", &[]))]).unwrap();
        assert_eq!(index.posts().len(), 1);
        assert!(index.groups().is_empty());
    }

    #[test]
    fn test_first_error_propagates() {
        let result = PostIndex::build(vec![
            Ok(post("Fine", "2024-01-01", &[])),
            Err(FeedError::DateParse {
                path: PathBuf::from("bad.md"),
                value: "soon".to_string(),
            }),
        ]);
        assert!(matches!(result, Err(FeedError::DateParse { .. })));
    }
}
