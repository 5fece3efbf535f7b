//! Heading discovery and table-of-contents synthesis.
//!
//! Headings are matched textually: an opening `<hN ...>` is paired with the
//! first `</hN>` that follows it. Every matched heading gets an `id` derived
//! from its discovery index, so ids stay unique across all fragments fed to
//! the same [`HeadingSynthesizer`] even when heading text repeats.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::markup::escape_html;

pub const HEADING_ID_PREFIX: &str = "mr-pdf-heading-";

/// Horizontal indentation per heading level, in pixels.
const INDENT_PX_PER_LEVEL: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRecord {
    pub text: String,
    pub level: u8,
    pub id: String,
}

/// Headings in document order. Nesting is only visual.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOfContents {
    entries: Vec<HeadingRecord>,
}

impl TableOfContents {
    pub fn entries(&self) -> &[HeadingRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_html(&self) -> String {
        let items: String = self
            .entries
            .iter()
            .map(|entry| {
                format!(
                    r##"<li class="toc-item toc-item-{level}" style="margin-left: {indent}px;"><a href="#{id}">{text}</a></li>"##,
                    level = entry.level,
                    indent = u32::from(entry.level.saturating_sub(1)) * INDENT_PX_PER_LEVEL,
                    id = entry.id,
                    text = escape_html(&entry.text),
                )
            })
            .collect();

        format!(
            r#"<div class="toc-page" style="page-break-after: always;"><h1 class="toc-header">Table of contents:</h1><ul class="toc-list" style="list-style: none; padding: 0;">{items}</ul></div>"#
        )
    }
}

fn opening_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<h([1-6])(?:\s[^>]*)?>").unwrap())
}

fn closing_tag(level: u8) -> &'static Regex {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    let all = RES.get_or_init(|| {
        (1..=6)
            .map(|n| Regex::new(&format!(r"(?i)</h{n}\s*>")).unwrap())
            .collect()
    });
    &all[usize::from(level - 1)]
}

/// One attribute at the start of the remaining tag text: name and optional
/// (possibly quoted) value.
fn next_attribute() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s+([^\s=>/"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+)))?"#)
            .unwrap()
    })
}

/// Rewrites headings and records them as it goes. Feed it every fragment of
/// a document in order, then call [`HeadingSynthesizer::finish`].
#[derive(Debug)]
pub struct HeadingSynthesizer {
    max_level: u8,
    records: Vec<HeadingRecord>,
}

impl HeadingSynthesizer {
    /// Collects `<h1>` through `<h{max_level}>`; `max_level` is clamped to 1..=6.
    pub fn new(max_level: u8) -> Self {
        Self {
            max_level: max_level.clamp(1, 6),
            records: Vec::new(),
        }
    }

    pub fn rewrite(&mut self, html: &str) -> String {
        let mut out = String::with_capacity(html.len() + 64);
        let mut cursor = 0;

        while let Some(caps) = opening_tag().captures_at(html, cursor) {
            let open = caps.get(0).expect("group 0 always matches");
            let level: u8 = caps[1].parse().unwrap_or(u8::MAX);

            let close = if level <= self.max_level {
                closing_tag(level).find_at(html, open.end())
            } else {
                None
            };

            let Some(close) = close else {
                out.push_str(&html[cursor..open.end()]);
                cursor = open.end();
                continue;
            };

            let inner = &html[open.end()..close.start()];
            let id = format!("{HEADING_ID_PREFIX}{}", self.records.len());

            let (tag, existing_id) = with_heading_id(open.as_str(), &id);
            out.push_str(&html[cursor..open.start()]);
            out.push_str(&tag);
            if let Some(existing_id) = existing_id {
                // Links to the page's own id keep resolving inside the heading.
                out.push_str(&format!(r#"<span id="{existing_id}"></span>"#));
            }
            out.push_str(inner);
            out.push_str(close.as_str());
            cursor = close.end();

            self.records.push(HeadingRecord {
                text: heading_text(inner),
                level,
                id,
            });
        }

        out.push_str(&html[cursor..]);
        out
    }

    pub fn finish(self) -> TableOfContents {
        TableOfContents {
            entries: self.records,
        }
    }
}

/// Rewrites a single block of HTML and returns it with its contents table.
pub fn synthesize(html: &str, max_level: u8) -> (String, TableOfContents) {
    let mut synthesizer = HeadingSynthesizer::new(max_level);
    let rewritten = synthesizer.rewrite(html);
    (rewritten, synthesizer.finish())
}

/// Makes `id` the only id of an opening heading tag. A previous non-empty
/// id is returned so the caller can keep it on an inner element.
fn with_heading_id(tag: &str, id: &str) -> (String, Option<String>) {
    // "<hN" is always three bytes.
    let (head, attributes) = tag.split_at(3);
    let attributes = attributes.strip_suffix('>').unwrap_or(attributes);

    let mut kept = String::with_capacity(attributes.len());
    let mut existing = None;
    let mut rest = attributes;
    while let Some(caps) = next_attribute().captures(rest) {
        let Some(whole) = caps.get(0) else { break };
        if caps[1].eq_ignore_ascii_case("id") {
            existing = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().trim().replace('"', "&quot;"))
                .filter(|v| !v.is_empty());
        } else {
            kept.push_str(whole.as_str());
        }
        rest = &rest[whole.end()..];
    }

    (format!(r#"{head} id="{id}"{kept}{rest}>"#), existing)
}

/// Plain text of a heading body, ignoring `<a>` elements whose only text is
/// `#` (deep-link anchors).
fn heading_text(inner: &str) -> String {
    let fragment = Html::parse_fragment(inner);
    let anchor = Selector::parse("a").unwrap();
    let anchors: HashSet<_> = fragment
        .select(&anchor)
        .filter(|a| a.text().collect::<String>().trim() == "#")
        .map(|a| a.id())
        .collect();

    let mut text = String::new();
    for node in fragment.tree.root().descendants() {
        if let Some(t) = node.value().as_text() {
            if !node.ancestors().any(|a| anchors.contains(&a.id())) {
                text.push_str(t);
            }
        }
    }
    text.trim().to_string()
}
