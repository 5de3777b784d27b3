use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote",
    "section", "article", "figure", "figcaption", "table", "tr", "td", "th", "hr",
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("attribute pattern compiles")
    })
}

/// Attributes of a single start tag, keyed by lowercase name with entity-decoded values.
pub(crate) fn parse_attributes(tag: &str) -> BTreeMap<String, String> {
    attribute_pattern()
        .captures_iter(tag)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|value| decode_entities(value.as_str()))
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}

/// Escape text for use in element content or a double-quoted attribute.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub(crate) fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let (c, width) = entity_at(candidate).unwrap_or(('&', 1));
        decoded.push(c);
        rest = &candidate[width..];
    }
    decoded.push_str(rest);
    decoded
}

/// The character an entity at the start of `candidate` stands for, and its raw width.
fn entity_at(candidate: &str) -> Option<(char, usize)> {
    let (end, _) = candidate
        .char_indices()
        .take(12)
        .find(|(_, c)| *c == ';')?;
    decode_entity(&candidate[1..end]).map(|c| (c, end + 1))
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = name.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Byte ranges of every tag (`<...>`) in `markup`. A `<` that does not open a tag, or a
/// tag missing its closing `>`, is treated as text.
pub(crate) fn tag_spans(markup: &str) -> Vec<Range<usize>> {
    let bytes = markup.as_bytes();
    let mut spans = Vec::new();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'<' && opens_tag(bytes.get(index + 1).copied()) {
            match markup[index..].find('>') {
                Some(offset) => {
                    spans.push(index..index + offset + 1);
                    index += offset + 1;
                    continue;
                }
                None => break,
            }
        }
        index += 1;
    }
    spans
}

fn opens_tag(next: Option<u8>) -> bool {
    matches!(next, Some(b) if b.is_ascii_alphabetic() || b == b'/' || b == b'!')
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Plain-text rendering of markup: tags dropped (block elements become line breaks) and
/// entities decoded.
pub(crate) fn strip_tags(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut cursor = 0;
    for span in tag_spans(markup) {
        text.push_str(&markup[cursor..span.start]);
        if BLOCK_ELEMENTS.contains(&tag_name(&markup[span.clone()]).as_str()) {
            text.push('\n');
        }
        cursor = span.end;
    }
    text.push_str(&markup[cursor..]);
    decode_entities(&text)
}

/// Replace every occurrence of any `needle` that sits in text (never inside a tag). When
/// an occurrence is the whole body of a `<p>` element the paragraph wrapper is replaced
/// too. Returns the rewritten markup and the number of replacements.
pub(crate) fn replace_in_text(
    markup: &str,
    needles: &[String],
    replacement: &str,
) -> (String, usize) {
    let spans = tag_spans(markup);
    let mut out = String::with_capacity(markup.len());
    let mut replaced = 0;
    let mut span_iter = spans.iter().peekable();
    let mut index = 0;

    while index < markup.len() {
        if let Some(span) = span_iter.peek() {
            if span.start == index {
                out.push_str(&markup[span.start..span.end]);
                index = span.end;
                span_iter.next();
                continue;
            }
        }

        let text_end = span_iter.peek().map_or(markup.len(), |span| span.start);
        let window = &markup[index..text_end];
        let hit = needles
            .iter()
            .filter(|needle| !needle.is_empty())
            .filter_map(|needle| window.find(needle.as_str()).map(|pos| (pos, needle)))
            .min_by_key(|(pos, _)| *pos);

        match hit {
            Some((pos, needle)) => {
                out.push_str(&window[..pos]);
                let after = index + pos + needle.len();
                let bare_paragraph = out.ends_with("<p>") && markup[after..].starts_with("</p>");
                if bare_paragraph {
                    out.truncate(out.len() - "<p>".len());
                    out.push_str(replacement);
                    index = after + "</p>".len();
                    while span_iter.peek().is_some_and(|span| span.start < index) {
                        span_iter.next();
                    }
                } else {
                    out.push_str(replacement);
                    index = after;
                }
                replaced += 1;
            }
            None => {
                out.push_str(window);
                index = text_end;
            }
        }
    }

    (out, replaced)
}

/// One visible character and the raw bytes it was rendered from.
struct MappedChar {
    offset: usize,
    raw: Range<usize>,
}

/// Visible text as `strip_tags` renders it, with the raw range behind each character.
fn mapped_text(markup: &str, spans: &[Range<usize>]) -> (String, Vec<MappedChar>) {
    let mut text = String::with_capacity(markup.len());
    let mut chars = Vec::with_capacity(markup.len());
    let mut cursor = 0;
    for span in spans {
        push_decoded(&markup[cursor..span.start], cursor, &mut text, &mut chars);
        if BLOCK_ELEMENTS.contains(&tag_name(&markup[span.start..span.end]).as_str()) {
            chars.push(MappedChar {
                offset: text.len(),
                raw: span.start..span.end,
            });
            text.push('\n');
        }
        cursor = span.end;
    }
    push_decoded(&markup[cursor..], cursor, &mut text, &mut chars);
    (text, chars)
}

fn push_decoded(segment: &str, base: usize, text: &mut String, chars: &mut Vec<MappedChar>) {
    let mut index = 0;
    while let Some(c) = segment[index..].chars().next() {
        let (decoded, width) = if c == '&' {
            entity_at(&segment[index..]).unwrap_or(('&', 1))
        } else {
            (c, c.len_utf8())
        };
        chars.push(MappedChar {
            offset: text.len(),
            raw: base + index..base + index + width,
        });
        text.push(decoded);
        index += width;
    }
}

/// Whether every element opened inside `range` is closed there and nothing outside is closed.
fn tags_balanced(markup: &str, spans: &[Range<usize>], range: &Range<usize>) -> bool {
    let mut open = Vec::new();
    for span in spans
        .iter()
        .filter(|span| span.start >= range.start && span.end <= range.end)
    {
        let tag = &markup[span.start..span.end];
        let name = tag_name(tag);
        if tag.starts_with("<!") || tag.ends_with("/>") || VOID_ELEMENTS.contains(&name.as_str()) {
            continue;
        }
        if tag.starts_with("</") {
            if open.pop().as_deref() != Some(name.as_str()) {
                return false;
            }
        } else {
            open.push(name);
        }
    }
    open.is_empty()
}

/// Byte range of the element whose start tag is `spans[start_index]`, closing tag included.
fn element_range(markup: &str, spans: &[Range<usize>], start_index: usize) -> Option<Range<usize>> {
    let opening = &spans[start_index];
    let name = tag_name(&markup[opening.start..opening.end]);
    let mut depth = 0usize;
    for span in &spans[start_index + 1..] {
        let tag = &markup[span.start..span.end];
        if tag_name(tag) != name {
            continue;
        }
        if tag.starts_with("</") {
            if depth == 0 {
                return Some(opening.start..span.end);
            }
            depth -= 1;
        } else if !tag.ends_with("/>") {
            depth += 1;
        }
    }
    None
}

/// The raw range to rewrite for a marker found in visible text at `raw`. A balanced range
/// is used as-is, widened over a bare `<p>` wrapper. Otherwise the innermost enclosing
/// element is used, provided its whole visible text is the marker.
fn rewrite_range(
    markup: &str,
    spans: &[Range<usize>],
    raw: Range<usize>,
    needle: &str,
) -> Option<Range<usize>> {
    if tags_balanced(markup, spans, &raw) {
        if markup[..raw.start].ends_with("<p>") && markup[raw.end..].starts_with("</p>") {
            return Some(raw.start - "<p>".len()..raw.end + "</p>".len());
        }
        return Some(raw);
    }

    let first_inside = spans.partition_point(|span| span.start < raw.start);
    (0..first_inside)
        .rev()
        .filter(|&index| {
            let tag = &markup[spans[index].start..spans[index].end];
            !tag.starts_with("</")
                && !tag.starts_with("<!")
                && !VOID_ELEMENTS.contains(&tag_name(tag).as_str())
        })
        .filter_map(|index| element_range(markup, spans, index))
        .find(|element| element.end >= raw.end && tags_balanced(markup, spans, element))
        .filter(|element| strip_tags(&markup[element.start..element.end]).trim() == needle)
}

/// Replace occurrences of `needle` in the reader-visible text of `markup`, which catches
/// markers that inline tags split apart. Returns the rewritten markup and the number of
/// replacements.
pub(crate) fn replace_in_visible_text(
    markup: &str,
    needle: &str,
    replacement: &str,
) -> (String, usize) {
    if needle.is_empty() {
        return (markup.to_string(), 0);
    }
    let spans = tag_spans(markup);
    let (text, chars) = mapped_text(markup, &spans);

    let mut edits: Vec<Range<usize>> = Vec::new();
    let mut from = 0;
    while let Some(pos) = text[from..].find(needle).map(|found| found + from) {
        let end = pos + needle.len();
        from = end;
        let first = chars.partition_point(|c| c.offset < pos);
        let last = chars.partition_point(|c| c.offset < end) - 1;
        let raw = chars[first].raw.start..chars[last].raw.end;
        if let Some(range) = rewrite_range(markup, &spans, raw, needle) {
            if edits.last().map_or(true, |previous| previous.end <= range.start) {
                edits.push(range);
            }
        }
    }

    let mut out = String::with_capacity(markup.len());
    let mut cursor = 0;
    for edit in &edits {
        out.push_str(&markup[cursor..edit.start]);
        out.push_str(replacement);
        cursor = edit.end;
    }
    out.push_str(&markup[cursor..]);
    (out, edits.len())
}
