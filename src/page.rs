//! The browser-page capability every pipeline stage is written against.
//!
//! [`crate::ChromiumPage`] is the production implementation. Stages only ever
//! hold one page and call it sequentially, so methods take `&mut self`.

use crate::error::Result;
use crate::options::{PaperFormat, PdfMargin};

/// Parameters handed to the renderer when printing the current document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    pub format: Option<PaperFormat>,
    pub margin: PdfMargin,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait PageDriver {
    /// Loads `url` and waits until the page has settled.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Returns the outer HTML of the first element matching `selector`, after
    /// forcing a page break after it and opening every `<details>` inside it.
    /// `None` when nothing matches.
    async fn extract_content(&mut self, selector: &str) -> Result<Option<String>>;

    /// Resolved `href` of the first element matching `selector`, if any.
    async fn next_page_url(&mut self, selector: &str) -> Result<Option<String>>;

    async fn replace_body(&mut self, html: &str) -> Result<()>;

    /// Removes every element matching `selector` and returns how many went.
    async fn remove_matching(&mut self, selector: &str) -> Result<usize>;

    async fn add_style(&mut self, css: &str) -> Result<()>;

    async fn print_pdf(&mut self, options: &RenderOptions) -> Result<Vec<u8>>;
}
