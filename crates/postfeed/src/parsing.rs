use crate::error::{FeedError, Result};
use crate::types::Frontmatter;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%B %d, %Y %H:%M",
    "%B %d %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%a, %d %B %Y",
    "%A, %B %d, %Y",
];

pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    pub fn render(&self, content: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        let parser = Parser::new_ext(content, options);
        let mut html_output = String::new();
        let mut in_code_block = false;
        let mut code_block_lang: Option<String> = None;
        let mut code_block_content = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(lang) => lang
                            .split_whitespace()
                            .next()
                            .map(|token| token.to_string()),
                        CodeBlockKind::Indented => None,
                    };
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    html_output.push_str(
                        &self.render_code_block(code_block_lang.as_deref(), &code_block_content),
                    );
                    in_code_block = false;
                    code_block_lang = None;
                }
                Event::Text(text) if in_code_block => {
                    code_block_content.push_str(&text);
                }
                other => {
                    pulldown_cmark::html::push_html(&mut html_output, std::iter::once(other));
                }
            }
        }

        html_output
    }

    fn render_code_block(&self, lang: Option<&str>, code: &str) -> String {
        let Some(lang) = lang else {
            return format!("<pre><code>{}</code></pre>\n", escape_html(code));
        };

        let theme = &self.theme_set.themes["base16-ocean.dark"];

        self.syntax_set
            .find_syntax_by_token(lang)
            .and_then(|syntax| {
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
            })
            .unwrap_or_else(|| {
                format!(
                    "<pre><code class=\"language-{}\">{}</code></pre>\n",
                    escape_html(lang),
                    escape_html(code)
                )
            })
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn parse_markdown(content: &str) -> String {
    let renderer = MarkdownRenderer::new();
    renderer.render(content)
}

/// Splits a post into its metadata block and body. The block is mandatory.
pub fn extract_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let content = content.replace("\r\n", "\n");
    let content = content.trim_start_matches('\u{feff}').trim_start();

    if content.starts_with("+++") {
        parse_toml_frontmatter(content, path)
    } else if content.starts_with("---") {
        parse_yaml_frontmatter(content, path)
    } else {
        Err(malformed(path, "no front matter block found"))
    }
}

fn parse_toml_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let (frontmatter_str, body) = split_block(&content[3..], "+++", path)?;

    let raw: HashMap<String, Value> = toml::from_str(frontmatter_str)
        .map_err(|error| malformed(path, &error.to_string()))?;

    Ok((Frontmatter { raw }, body))
}

fn parse_yaml_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let (frontmatter_str, body) = split_block(&content[3..], "---", path)?;

    if frontmatter_str.trim().is_empty() {
        return Ok((Frontmatter::default(), body));
    }

    let raw: HashMap<String, Value> = serde_yaml::from_str(frontmatter_str)
        .map_err(|error| malformed(path, &error.to_string()))?;

    Ok((Frontmatter { raw }, body))
}

fn split_block<'a>(rest: &'a str, delimiter: &str, path: &Path) -> Result<(&'a str, String)> {
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let end_index = find_closing_delimiter(rest, delimiter).ok_or_else(|| {
        malformed(path, &format!("missing closing '{delimiter}' delimiter"))
    })?;

    let block = &rest[..end_index];
    let body = rest[end_index..]
        .strip_prefix(delimiter)
        .unwrap_or_default();

    Ok((block, body.trim().to_string()))
}

fn find_closing_delimiter(content: &str, delimiter: &str) -> Option<usize> {
    let mut position = 0;

    for line in content.lines() {
        if line.trim_end() == delimiter {
            return Some(position);
        }
        position += line.len() + 1;
    }

    None
}

fn malformed(path: &Path, message: &str) -> FeedError {
    FeedError::MalformedFrontMatter {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Resolves a post date. Absent dates fall back to now; offset-less values are UTC.
pub fn normalize_date(value: Option<&Value>, path: &Path) -> Result<DateTime<FixedOffset>> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(Utc::now().fixed_offset()),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Object(map)) => match map.get(TOML_DATETIME_KEY) {
            Some(Value::String(text)) if map.len() == 1 => text.clone(),
            _ => value.map(Value::to_string).unwrap_or_default(),
        },
        Some(other) => other.to_string(),
    };

    parse_date(&raw).ok_or_else(|| FeedError::DateParse {
        path: path.to_path_buf(),
        value: raw,
    })
}

pub fn parse_date(input: &str) -> Option<DateTime<FixedOffset>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date);
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(input) {
        return Some(date);
    }

    let upper = input.to_ascii_uppercase();
    if let Some(naive) = upper.strip_suffix('Z') {
        if let Some(date) = parse_naive(naive.trim_end()) {
            return Some(date);
        }
    }

    if let Some(date) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(input, format).ok())
    {
        return Some(date);
    }

    parse_naive(input)
}

fn parse_naive(input: &str) -> Option<DateTime<FixedOffset>> {
    if input.len() == 8 && input.bytes().all(|byte| byte.is_ascii_digit()) {
        let year = input[..4].parse().ok()?;
        let month = input[4..6].parse().ok()?;
        let day = input[6..].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        return Some(assume_utc(date.and_time(NaiveTime::MIN)));
    }

    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
    {
        return Some(assume_utc(naive));
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .map(|date| assume_utc(date.and_time(NaiveTime::MIN)))
}

fn assume_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    naive.and_utc().fixed_offset()
}

/// Coerces `tags`/`categories` into a list. A bare string becomes one element.
/// Reads a single-valued field. Scalars become strings; lists and mappings fail.
pub fn scalar_field(frontmatter: &Frontmatter, field: &str, path: &Path) -> Result<Option<String>> {
    if frontmatter.get(field).is_none() {
        return Ok(None);
    }

    match frontmatter.get_string(field) {
        Some(text) => Ok(Some(text)),
        None => Err(FeedError::InvalidField {
            path: path.to_path_buf(),
            field: field.to_string(),
            message: "expected a single value".to_string(),
        }),
    }
}

pub fn normalize_terms(frontmatter: &Frontmatter, field: &str, path: &Path) -> Result<Vec<String>> {
    let invalid = |message: &str| FeedError::InvalidField {
        path: path.to_path_buf(),
        field: field.to_string(),
        message: message.to_string(),
    };

    match frontmatter.get(field) {
        None => Ok(Vec::new()),
        Some(Value::String(term)) => Ok(vec![term.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| match item {
                Value::String(term) => Ok(term.clone()),
                Value::Number(number) => Ok(number.to_string()),
                Value::Bool(flag) => Ok(flag.to_string()),
                _ => Err(invalid("list entries must be plain strings")),
            })
            .collect(),
        Some(Value::Object(_)) => Err(invalid("expected a string or a list, found a mapping")),
        Some(_) => Err(invalid("expected a string or a list")),
    }
}
