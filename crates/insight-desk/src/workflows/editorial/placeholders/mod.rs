//! Placeholder scanning.
//!
//! Authors leave bracketed markers such as `[IMAGE NEEDED: campus gate]` wherever material
//! is still missing. The scanner finds every distinct unresolved marker in a draft's
//! content and image list. It is pure: the only outside input is [`ScanOptions`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::content::{decode_entities, ContentBlock, ContentDocument};

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"\[(RESEARCH NEEDED|IMAGE NEEDED|MAPBOX MAP NEEDED|MAP|PULL QUOTE NEEDED):([^\[\]<>]*)\]",
        )
        .expect("marker pattern compiles")
    })
}

/// Kind of missing material a marker stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerClass {
    Research,
    Image,
    Map,
    PullQuote,
}

impl MarkerClass {
    pub fn label(self) -> &'static str {
        match self {
            Self::Research => "Research",
            Self::Image => "Image",
            Self::Map => "Map",
            Self::PullQuote => "Pull quote",
        }
    }

    /// Canonical tag authors type for this class.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Research => "RESEARCH NEEDED",
            Self::Image => "IMAGE NEEDED",
            Self::Map => "MAPBOX MAP NEEDED",
            Self::PullQuote => "PULL QUOTE NEEDED",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "RESEARCH NEEDED" => Some(Self::Research),
            "IMAGE NEEDED" => Some(Self::Image),
            "MAPBOX MAP NEEDED" | "MAP" => Some(Self::Map),
            "PULL QUOTE NEEDED" => Some(Self::PullQuote),
            _ => None,
        }
    }

    pub fn ordered() -> [Self; 4] {
        [Self::Research, Self::Image, Self::Map, Self::PullQuote]
    }
}

/// Where a marker was first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerOrigin {
    Node,
    Text,
    ImageList { index: usize },
}

/// One distinct unresolved marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub class: MarkerClass,
    pub hint: String,
    pub raw: String,
    pub origin: MarkerOrigin,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class.label(), self.hint)
    }
}

/// Whether the running environment can back map placeholders with a live map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapAvailability {
    #[default]
    Unconfigured,
    Configured,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    pub maps: MapAvailability,
}

impl ScanOptions {
    pub fn with_maps(maps: MapAvailability) -> Self {
        Self { maps }
    }
}

/// Result of a scan: distinct unresolved markers in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    unresolved: usize,
    markers: Vec<Marker>,
    excused_maps: usize,
}

impl ScanReport {
    pub fn count(&self) -> usize {
        self.unresolved
    }

    pub fn is_clear(&self) -> bool {
        self.unresolved == 0
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Map markers that were not counted because maps are configured.
    pub fn excused_maps(&self) -> usize {
        self.excused_maps
    }

    pub fn by_class(&self) -> BTreeMap<MarkerClass, usize> {
        let mut tally = BTreeMap::new();
        for marker in &self.markers {
            *tally.entry(marker.class).or_insert(0) += 1;
        }
        tally
    }
}

/// Split a single marker string into its class and trimmed hint.
pub fn parse_marker(raw: &str) -> Option<(MarkerClass, String)> {
    let caps = marker_pattern().captures(raw.trim())?;
    let whole = caps.get(0)?;
    if whole.as_str().len() != raw.trim().len() {
        return None;
    }
    let class = MarkerClass::from_tag(&caps[1])?;
    Some((class, caps[2].trim().to_string()))
}

/// First marker embedded anywhere in `text`.
pub(crate) fn first_marker(text: &str) -> Option<&str> {
    marker_pattern().find(text).map(|found| found.as_str())
}

/// Scan with default options: map markers always count.
pub fn scan(content: &str, images: &[String]) -> ScanReport {
    scan_with(content, images, &ScanOptions::default())
}

pub fn scan_with(content: &str, images: &[String], options: &ScanOptions) -> ScanReport {
    let document = ContentDocument::parse(content);
    scan_document(&document, images, options)
}

fn scan_document(
    document: &ContentDocument,
    images: &[String],
    options: &ScanOptions,
) -> ScanReport {
    let mut collector = Collector::new(options);

    for node in document.placeholders() {
        if node.is_resolved() {
            continue;
        }
        collector.push(node.class(), node.hint(), node.marker(), MarkerOrigin::Node);
    }

    for block in document.blocks() {
        if let ContentBlock::Markup(markup) = block {
            collector.push_all(&decode_entities(markup), MarkerOrigin::Text);
        }
    }
    collector.push_all(&document.flattened_text(), MarkerOrigin::Text);

    for (index, entry) in images.iter().enumerate() {
        collector.push_all(entry, MarkerOrigin::ImageList { index });
    }

    collector.finish()
}

struct Collector<'a> {
    options: &'a ScanOptions,
    seen: HashSet<String>,
    markers: Vec<Marker>,
    excused_maps: usize,
}

impl<'a> Collector<'a> {
    fn new(options: &'a ScanOptions) -> Self {
        Self {
            options,
            seen: HashSet::new(),
            markers: Vec::new(),
            excused_maps: 0,
        }
    }

    fn push_all(&mut self, text: &str, origin: MarkerOrigin) {
        for caps in marker_pattern().captures_iter(text) {
            let Some(class) = MarkerClass::from_tag(&caps[1]) else {
                continue;
            };
            self.push(class, caps[2].trim().to_string(), &caps[0], origin);
        }
    }

    fn push(&mut self, class: MarkerClass, hint: String, raw: &str, origin: MarkerOrigin) {
        let raw = raw.trim();
        if !self.seen.insert(raw.to_string()) {
            return;
        }
        if class == MarkerClass::Map && self.options.maps == MapAvailability::Configured {
            self.excused_maps += 1;
            return;
        }
        self.markers.push(Marker {
            class,
            hint,
            raw: raw.to_string(),
            origin,
        });
    }

    fn finish(self) -> ScanReport {
        ScanReport {
            unresolved: self.markers.len(),
            markers: self.markers,
            excused_maps: self.excused_maps,
        }
    }
}
