//! # mr-pdf
//!
//! Turns a paginated documentation website into one PDF.
//!
//! Starting from one or more seed URLs, each page is loaded in headless
//! Chromium, its content region is extracted, and the pagination link is
//! followed until a page has none. The collected content is prefixed with a
//! cover and a table of contents built from its headings, placed into the
//! first page, and printed.
//!
//! ## Usage
//!
//! ```bash
//! mr-pdf --initialDocURLs https://docs.example.com/intro \
//!     --contentSelector article \
//!     --paginationSelector "a.pagination-nav__link--next" \
//!     --excludeSelectors ".navbar,.footer"
//! ```

mod assembler;
mod chromium;
mod cover;
mod error;
mod extractor;
mod markup;
mod options;
mod page;
mod pdf_merger;
mod pipeline;
mod toc;
mod walker;

pub use assembler::{apply_adjustments, assemble, remove_excluded, AggregatedDocument};
pub use chromium::ChromiumPage;
pub use cover::{fetch_cover_image, CoverImage, CoverPage};
pub use error::{Error, Result};
pub use extractor::extract_fragment;
pub use options::{GeneratePdfOptions, PaperFormat, PdfMargin, DEFAULT_OUTPUT_FILENAME};
pub use page::{PageDriver, RenderOptions};
pub use pdf_merger::{merge_pdf_buffers, PdfMerger};
pub use pipeline::{generate_with, render_document, render_per_page, write_pdf};
pub use toc::{synthesize, HeadingRecord, HeadingSynthesizer, TableOfContents};
pub use walker::{
    ContentAggregator, ExclusionSet, FragmentCollector, FrontierWalker, PageFragment, Visit,
    WalkStats,
};

/// Launches Chromium, runs the configured pipeline, writes the PDF to
/// `options.output_pdf_filename` and returns its bytes.
pub async fn generate_pdf(options: &GeneratePdfOptions) -> Result<Vec<u8>> {
    options.validate()?;

    let client = reqwest::Client::new();
    let mut page = ChromiumPage::launch(options).await?;
    let result = generate_with(&mut page, options, &client).await;
    page.close().await;

    result
}
