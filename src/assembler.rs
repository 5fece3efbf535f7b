//! Recomposes the target page from cover, table of contents and content.

use tracing::{debug, info};

use crate::cover::CoverPage;
use crate::error::Result;
use crate::page::PageDriver;
use crate::toc::{HeadingSynthesizer, TableOfContents};
use crate::walker::PageFragment;

/// The finished document. Constructing it consumes the fragments, so no
/// more can be appended afterwards.
#[derive(Debug, Clone)]
pub struct AggregatedDocument {
    pub cover: CoverPage,
    pub toc: Option<TableOfContents>,
    /// Fragments in traversal order, headings already carrying their ids.
    pub fragments: Vec<PageFragment>,
}

impl AggregatedDocument {
    /// Runs every fragment through one [`HeadingSynthesizer`] so heading ids
    /// are unique across the whole document. The contents table is dropped
    /// when `with_toc` is false; content is rewritten either way.
    pub fn finalize(
        cover: CoverPage,
        fragments: Vec<PageFragment>,
        with_toc: bool,
        toc_max_level: u8,
    ) -> Self {
        let mut synthesizer = HeadingSynthesizer::new(toc_max_level);
        let fragments = fragments
            .into_iter()
            .map(|fragment| PageFragment {
                html: synthesizer.rewrite(&fragment.html),
                ..fragment
            })
            .collect();
        let toc = synthesizer.finish();
        debug!("Found {} headings for the table of contents", toc.len());

        Self {
            cover,
            toc: with_toc.then_some(toc),
            fragments,
        }
    }

    /// `cover ++ toc ++ fragments`.
    pub fn body_html(&self) -> String {
        let mut body = self.cover.to_html();
        if let Some(toc) = &self.toc {
            body.push_str(&toc.to_html());
        }
        for fragment in &self.fragments {
            body.push_str(&fragment.html);
        }
        body
    }
}

/// Removes every element matching each selector, one selector at a time,
/// and returns the total number removed.
pub async fn remove_excluded<P: PageDriver>(page: &mut P, selectors: &[String]) -> Result<usize> {
    let mut removed = 0;
    for selector in selectors.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let count = page.remove_matching(selector).await?;
        debug!("Removed {} elements matching '{}'", count, selector);
        removed += count;
    }
    Ok(removed)
}

/// Exclusions, then the custom stylesheet. Both have settled when this
/// returns.
pub async fn apply_adjustments<P: PageDriver>(
    page: &mut P,
    exclude_selectors: &[String],
    css_style: Option<&str>,
) -> Result<()> {
    remove_excluded(page, exclude_selectors).await?;
    if let Some(css) = css_style.filter(|c| !c.trim().is_empty()) {
        page.add_style(css).await?;
    }
    Ok(())
}

/// Replaces the body of the page currently loaded with the document, then
/// applies exclusions and custom styling to the result.
pub async fn assemble<P: PageDriver>(
    page: &mut P,
    document: &AggregatedDocument,
    exclude_selectors: &[String],
    css_style: Option<&str>,
) -> Result<()> {
    info!(
        "Assembling {} fragments{}",
        document.fragments.len(),
        if document.toc.is_some() {
            " with table of contents"
        } else {
            ""
        }
    );
    page.replace_body(&document.body_html()).await?;
    apply_adjustments(page, exclude_selectors, css_style).await
}
