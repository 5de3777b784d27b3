//! Rich content model for draft bodies.
//!
//! Draft content is the HTML serialised by the authoring editor. Placeholder nodes are
//! `<div data-type="…-placeholder">` elements; everything else is kept as opaque markup so
//! that a parse followed by a render reproduces the original string exactly.

mod markup;

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::placeholders::{parse_marker, MarkerClass};

pub use markup::escape_html;
pub(crate) use markup::{decode_entities, strip_tags};

const DEFAULT_RESEARCH_TEXT: &str = "[RESEARCH NEEDED: Research]";
const DEFAULT_IMAGE_TEXT: &str = "[IMAGE NEEDED: Image]";
const DEFAULT_MAP_TEXT: &str = "[MAPBOX MAP NEEDED: Interactive map]";
const DEFAULT_PULL_QUOTE_TEXT: &str = "[PULL QUOTE NEEDED: Quote]";

fn div_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)<(/?)div\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("div pattern compiles")
    })
}

/// Structured placeholder embedded in draft content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaceholderNode {
    Research {
        placeholder_text: String,
    },
    Image {
        placeholder_text: String,
        image_url: Option<String>,
        caption: Option<String>,
        photo_credit: Option<String>,
    },
    Map {
        placeholder_text: String,
        city: Option<String>,
    },
    PullQuote {
        placeholder_text: String,
        quote: Option<String>,
        source: Option<String>,
    },
}

impl PlaceholderNode {
    pub fn class(&self) -> MarkerClass {
        match self {
            Self::Research { .. } => MarkerClass::Research,
            Self::Image { .. } => MarkerClass::Image,
            Self::Map { .. } => MarkerClass::Map,
            Self::PullQuote { .. } => MarkerClass::PullQuote,
        }
    }

    pub fn placeholder_text(&self) -> &str {
        match self {
            Self::Research { placeholder_text }
            | Self::Image {
                placeholder_text, ..
            }
            | Self::Map {
                placeholder_text, ..
            }
            | Self::PullQuote {
                placeholder_text, ..
            } => placeholder_text,
        }
    }

    /// The marker string this node stands for. Falls back to the trimmed placeholder text
    /// when it does not embed a recognised tag.
    pub fn marker(&self) -> &str {
        let text = self.placeholder_text();
        super::placeholders::first_marker(text).unwrap_or_else(|| text.trim())
    }

    /// Free-text hint carried by the node, e.g. the image search query.
    pub fn hint(&self) -> String {
        match parse_marker(self.marker()) {
            Some((_, hint)) => hint,
            None => self.marker().to_string(),
        }
    }

    /// Whether the node's own fields resolve it. Map nodes never resolve from content.
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Research { .. } | Self::Map { .. } => false,
            Self::Image { image_url, .. } => non_blank(image_url.as_deref()),
            Self::PullQuote { quote, .. } => non_blank(quote.as_deref()),
        }
    }

    fn data_type(&self) -> &'static str {
        match self {
            Self::Research { .. } => "research-placeholder",
            Self::Image { .. } => "image-placeholder",
            Self::Map { .. } => "map-placeholder",
            Self::PullQuote { .. } => "pull-quote-placeholder",
        }
    }

    fn from_element(data_type: &str, attrs: &BTreeMap<String, String>, inner: &str) -> Option<Self> {
        let attr = |name: &str| {
            attrs
                .get(name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        let text = |default: &str| {
            attr("data-placeholder-text")
                .or_else(|| {
                    let inner_text = strip_tags(inner);
                    let trimmed = inner_text.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                })
                .unwrap_or_else(|| default.to_string())
        };

        let node = match data_type {
            "research-placeholder" => Self::Research {
                placeholder_text: text(DEFAULT_RESEARCH_TEXT),
            },
            "image-placeholder" => Self::Image {
                placeholder_text: text(DEFAULT_IMAGE_TEXT),
                image_url: attr("data-image-url"),
                caption: attr("data-caption"),
                photo_credit: attr("data-photo-credit"),
            },
            "map-placeholder" | "mapbox-placeholder" => {
                let placeholder_text = text(DEFAULT_MAP_TEXT);
                let city = attr("data-city").or_else(|| city_hint(&placeholder_text));
                Self::Map {
                    placeholder_text,
                    city,
                }
            }
            "pull-quote-placeholder" => Self::PullQuote {
                placeholder_text: text(DEFAULT_PULL_QUOTE_TEXT),
                quote: attr("data-quote"),
                source: attr("data-source"),
            },
            _ => return None,
        };
        Some(node)
    }

    /// Render the node as editor markup.
    pub fn render(&self) -> String {
        let mut html = String::new();
        let text = escape_html(self.placeholder_text());
        let data_type = self.data_type();

        match self {
            Self::Research { .. } => {
                let _ = write!(
                    html,
                    r#"<div data-type="{data_type}" data-placeholder-text="{text}"></div>"#
                );
            }
            Self::Map { city, .. } => {
                let city = escape_html(city.as_deref().unwrap_or_default());
                let _ = write!(
                    html,
                    r#"<div data-type="{data_type}" data-city="{city}" data-placeholder-text="{text}"></div>"#
                );
            }
            Self::Image {
                image_url: Some(url),
                caption,
                photo_credit,
                ..
            } => {
                let url = escape_html(url);
                let _ = write!(
                    html,
                    r#"<div data-type="{data_type}" data-placeholder-text="{text}" data-image-url="{url}""#
                );
                push_optional_attr(&mut html, "data-caption", caption.as_deref());
                push_optional_attr(&mut html, "data-photo-credit", photo_credit.as_deref());
                let _ = write!(html, r#"><img src="{url}" alt="{text}">"#);
                let caption_line = match (caption.as_deref(), photo_credit.as_deref()) {
                    (Some(caption), Some(credit)) => Some(format!("{caption}. {credit}")),
                    (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
                    (None, None) => None,
                };
                if let Some(line) = caption_line {
                    let _ = write!(html, r#"<p class="image-caption">{}</p>"#, escape_html(&line));
                }
                html.push_str("</div>");
            }
            Self::PullQuote {
                quote: Some(quote),
                source,
                ..
            } => {
                let _ = write!(
                    html,
                    r#"<div data-type="{data_type}" data-placeholder-text="{text}" data-quote="{}""#,
                    escape_html(quote)
                );
                push_optional_attr(&mut html, "data-source", source.as_deref());
                let _ = write!(
                    html,
                    r#"><div class="pull-quote-rule"></div><blockquote class="pull-quote-text">{}</blockquote>"#,
                    escape_html(quote)
                );
                if let Some(source) = source {
                    let _ = write!(
                        html,
                        r#"<div class="pull-quote-attribution">{}</div>"#,
                        escape_html(source)
                    );
                }
                html.push_str("</div>");
            }
            Self::Image { .. } | Self::PullQuote { .. } => {
                let _ = write!(
                    html,
                    r#"<div data-type="{data_type}" data-placeholder-text="{text}"></div>"#
                );
            }
        }

        html
    }
}

fn push_optional_attr(html: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
        let _ = write!(html, r#" {name}="{}""#, escape_html(value));
    }
}

fn non_blank(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}

fn city_hint(placeholder_text: &str) -> Option<String> {
    let hint = match parse_marker(placeholder_text.trim()) {
        Some((_, hint)) => hint,
        None => return None,
    };
    let city = hint.split('|').next().unwrap_or_default().trim();
    (!city.is_empty()).then(|| city.to_string())
}

/// One piece of parsed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Markup(String),
    Placeholder {
        node: PlaceholderNode,
        /// Original markup of an untouched node; `None` once the node has been edited.
        source: Option<String>,
    },
}

/// Fields supplied when an image placeholder is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageResolution {
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub photo_credit: Option<String>,
}

/// Fields supplied when a pull-quote placeholder is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuoteResolution {
    pub quote: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("no unresolved placeholder matches '{0}'")]
    MarkerNotFound(String),
    #[error("{0} must not be empty when resolving a placeholder")]
    EmptyResolution(&'static str),
}

/// Parsed draft content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentDocument {
    blocks: Vec<ContentBlock>,
}

struct OpenNode {
    start: usize,
    inner_start: usize,
    data_type: String,
    attrs: BTreeMap<String, String>,
    depth: usize,
}

impl ContentDocument {
    /// Split `content` into markup and placeholder nodes. Never fails: an unterminated
    /// placeholder element is kept as markup.
    pub fn parse(content: &str) -> Self {
        let mut blocks = Vec::new();
        let mut cursor = 0;
        let mut open: Option<OpenNode> = None;

        for tag in div_tag_pattern().find_iter(content) {
            let closing = tag.as_str().starts_with("</");
            match open.as_mut() {
                None if !closing => {
                    let attrs = markup::parse_attributes(tag.as_str());
                    let data_type = match attrs.get("data-type") {
                        Some(kind) if kind.ends_with("-placeholder") => kind.clone(),
                        _ => continue,
                    };
                    let node = OpenNode {
                        start: tag.start(),
                        inner_start: tag.end(),
                        data_type,
                        attrs,
                        depth: 1,
                    };
                    if tag.as_str().ends_with("/>") {
                        cursor = Self::close(&mut blocks, content, cursor, node, tag.end(), tag.end());
                    } else {
                        open = Some(node);
                    }
                }
                None => {}
                Some(node) if closing => {
                    node.depth -= 1;
                    if node.depth == 0 {
                        if let Some(node) = open.take() {
                            cursor =
                                Self::close(&mut blocks, content, cursor, node, tag.start(), tag.end());
                        }
                    }
                }
                Some(node) => node.depth += 1,
            }
        }

        if cursor < content.len() {
            blocks.push(ContentBlock::Markup(content[cursor..].to_string()));
        }

        Self { blocks }
    }

    fn close(
        blocks: &mut Vec<ContentBlock>,
        content: &str,
        cursor: usize,
        node: OpenNode,
        inner_end: usize,
        end: usize,
    ) -> usize {
        let inner = &content[node.inner_start..inner_end.max(node.inner_start)];
        match PlaceholderNode::from_element(&node.data_type, &node.attrs, inner) {
            Some(parsed) => {
                if cursor < node.start {
                    blocks.push(ContentBlock::Markup(content[cursor..node.start].to_string()));
                }
                blocks.push(ContentBlock::Placeholder {
                    node: parsed,
                    source: Some(content[node.start..end].to_string()),
                });
                end
            }
            // Unknown placeholder kinds stay in the surrounding markup.
            None => cursor,
        }
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &PlaceholderNode> {
        self.blocks.iter().filter_map(|block| match block {
            ContentBlock::Placeholder { node, .. } => Some(node),
            ContentBlock::Markup(_) => None,
        })
    }

    pub fn render(&self) -> String {
        let mut html = String::new();
        for block in &self.blocks {
            match block {
                ContentBlock::Markup(markup) => html.push_str(markup),
                ContentBlock::Placeholder {
                    source: Some(source),
                    ..
                } => html.push_str(source),
                ContentBlock::Placeholder { node, source: None } => html.push_str(&node.render()),
            }
        }
        html
    }

    /// Reader-visible text of every markup block; placeholder nodes become line breaks.
    pub fn flattened_text(&self) -> String {
        let mut text = String::new();
        for block in &self.blocks {
            match block {
                ContentBlock::Markup(markup) => text.push_str(&strip_tags(markup)),
                ContentBlock::Placeholder { .. } => text.push('\n'),
            }
        }
        text
    }

    /// Attach an image to every image placeholder standing for `marker`, including raw
    /// marker text that has not been converted to a node yet. Returns the number of
    /// occurrences resolved, or `MarkerNotFound` when there were none.
    pub fn resolve_image(
        &mut self,
        marker: &str,
        resolution: &ImageResolution,
    ) -> Result<usize, ContentError> {
        let image_url = resolution.image_url.trim();
        if image_url.is_empty() {
            return Err(ContentError::EmptyResolution("image_url"));
        }
        let caption = trimmed(resolution.caption.as_deref());
        let photo_credit = trimmed(resolution.photo_credit.as_deref());

        self.resolve(marker, MarkerClass::Image, |placeholder_text| {
            PlaceholderNode::Image {
                placeholder_text,
                image_url: Some(image_url.to_string()),
                caption: caption.clone(),
                photo_credit: photo_credit.clone(),
            }
        })
    }

    /// Fill in the quote of every pull-quote placeholder standing for `marker`.
    pub fn resolve_quote(
        &mut self,
        marker: &str,
        resolution: &QuoteResolution,
    ) -> Result<usize, ContentError> {
        let quote = resolution.quote.trim();
        if quote.is_empty() {
            return Err(ContentError::EmptyResolution("quote"));
        }
        let source = trimmed(resolution.source.as_deref());

        self.resolve(marker, MarkerClass::PullQuote, |placeholder_text| {
            PlaceholderNode::PullQuote {
                placeholder_text,
                quote: Some(quote.to_string()),
                source: source.clone(),
            }
        })
    }

    fn resolve<F>(&mut self, marker: &str, class: MarkerClass, build: F) -> Result<usize, ContentError>
    where
        F: Fn(String) -> PlaceholderNode,
    {
        let marker = marker.trim();
        let not_found = || ContentError::MarkerNotFound(marker.to_string());
        if marker.is_empty() || parse_marker(marker).is_some_and(|(tagged, _)| tagged != class) {
            return Err(not_found());
        }

        let mut needles = vec![marker.to_string()];
        let escaped = marker
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        if escaped != marker {
            needles.push(escaped);
        }
        let replacement = build(marker.to_string()).render();

        let mut resolved = 0;
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for block in self.blocks.drain(..) {
            match block {
                ContentBlock::Placeholder { node, .. }
                    if node.class() == class && !node.is_resolved() && node.marker() == marker =>
                {
                    resolved += 1;
                    blocks.push(ContentBlock::Placeholder {
                        node: build(node.placeholder_text().to_string()),
                        source: None,
                    });
                }
                ContentBlock::Markup(markup) => {
                    let (mut rewritten, mut count) =
                        markup::replace_in_text(&markup, &needles, &replacement);
                    if count == 0 {
                        // Markers split by inline tags only show up in the visible text.
                        (rewritten, count) =
                            markup::replace_in_visible_text(&markup, marker, &replacement);
                    }
                    resolved += count;
                    if count == 0 {
                        blocks.push(ContentBlock::Markup(markup));
                    } else {
                        // Re-parse so the new nodes become structured blocks.
                        blocks.extend(ContentDocument::parse(&rewritten).blocks);
                    }
                }
                other => blocks.push(other),
            }
        }
        self.blocks = blocks;
        match resolved {
            0 => Err(not_found()),
            count => Ok(count),
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
