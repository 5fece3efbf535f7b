//! Pagination-link traversal.
//!
//! Each seed URL starts a chain: the page is loaded, handed to a [`Visit`]
//! implementation, and the pagination selector picks the next URL. A chain
//! ends when the selector matches nothing. Visited URLs are not tracked, so a
//! pagination link pointing back into its own chain never terminates.

use colored::*;
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

use crate::error::Result;
use crate::extractor::extract_fragment;
use crate::page::PageDriver;

/// The content region of one visited page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFragment {
    pub source_url: String,
    pub html: String,
    pub sequence_index: usize,
}

/// URLs whose content is skipped while their pagination link is still
/// followed. Absolute URLs are compared in normalized form.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    urls: HashSet<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            urls: urls
                .into_iter()
                .map(|u| normalize_url(u.as_ref()))
                .collect(),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        !self.urls.is_empty() && self.urls.contains(&normalize_url(url))
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    Url::parse(raw)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Owns the fragments of one run in visiting order.
#[derive(Debug, Default)]
pub struct ContentAggregator {
    fragments: Vec<PageFragment>,
}

impl ContentAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source_url: &str, html: String) {
        let sequence_index = self.fragments.len();
        self.fragments.push(PageFragment {
            source_url: source_url.to_string(),
            html,
            sequence_index,
        });
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self) -> &[PageFragment] {
        &self.fragments
    }

    pub fn into_fragments(self) -> Vec<PageFragment> {
        self.fragments
    }
}

/// Work done on every visited page that is not excluded.
#[allow(async_fn_in_trait)]
pub trait Visit<P: PageDriver> {
    async fn visit(&mut self, page: &mut P, url: &str) -> Result<()>;
}

/// Collects one fragment per page into a [`ContentAggregator`].
pub struct FragmentCollector<'a> {
    content_selector: &'a str,
    strict: bool,
    aggregator: ContentAggregator,
}

impl<'a> FragmentCollector<'a> {
    pub fn new(content_selector: &'a str, strict: bool) -> Self {
        Self {
            content_selector,
            strict,
            aggregator: ContentAggregator::new(),
        }
    }

    pub fn into_aggregator(self) -> ContentAggregator {
        self.aggregator
    }
}

impl<P: PageDriver> Visit<P> for FragmentCollector<'_> {
    async fn visit(&mut self, page: &mut P, url: &str) -> Result<()> {
        let html = extract_fragment(page, url, self.content_selector, self.strict).await?;
        self.aggregator.push(url, html);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub visited: usize,
    pub excluded: usize,
}

pub struct FrontierWalker<'a> {
    pagination_selector: &'a str,
    exclusions: ExclusionSet,
}

impl<'a> FrontierWalker<'a> {
    pub fn new(pagination_selector: &'a str, exclusions: ExclusionSet) -> Self {
        Self {
            pagination_selector,
            exclusions,
        }
    }

    /// Follows every chain in seed order, calling `visitor` on each page that
    /// is not excluded.
    pub async fn traverse<P, V>(
        &self,
        page: &mut P,
        seeds: &[String],
        visitor: &mut V,
    ) -> Result<WalkStats>
    where
        P: PageDriver,
        V: Visit<P>,
    {
        let mut stats = WalkStats::default();

        for seed in seeds {
            let mut current = seed.trim().to_string();

            while !current.is_empty() {
                info!("Retrieving html from {}", current.cyan());
                page.navigate(&current).await?;
                stats.visited += 1;

                // The next link is read before the visitor touches the DOM.
                let next = page
                    .next_page_url(self.pagination_selector)
                    .await?
                    .unwrap_or_default();

                if self.exclusions.contains(&current) {
                    stats.excluded += 1;
                    info!("Skipping excluded page {}", current.yellow());
                } else {
                    visitor.visit(page, &current).await?;
                    info!("{}", "Success".green());
                }

                if next.is_empty() {
                    debug!("No pagination link on {}, chain finished", current);
                }
                current = next;
            }
        }

        Ok(stats)
    }

    /// Collects the content fragments of every chain.
    pub async fn walk<P: PageDriver>(
        &self,
        page: &mut P,
        seeds: &[String],
        content_selector: &str,
        strict: bool,
    ) -> Result<ContentAggregator> {
        let mut collector = FragmentCollector::new(content_selector, strict);
        let stats = self.traverse(page, seeds, &mut collector).await?;
        let aggregator = collector.into_aggregator();
        debug!(
            "Visited {} pages, excluded {}, kept {} fragments",
            stats.visited,
            stats.excluded,
            aggregator.len()
        );
        Ok(aggregator)
    }
}
