//! End-to-end runs over any [`PageDriver`].

use colored::*;
use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::assembler::{apply_adjustments, assemble, AggregatedDocument};
use crate::cover::CoverPage;
use crate::error::{Error, Result};
use crate::options::GeneratePdfOptions;
use crate::page::{PageDriver, RenderOptions};
use crate::pdf_merger::merge_pdf_buffers;
use crate::walker::{ExclusionSet, FrontierWalker, Visit};

/// Whole-document run: every chain is collected into one body on the first
/// seed page and printed once. Returns the PDF bytes without writing them.
pub async fn render_document<P: PageDriver>(
    page: &mut P,
    options: &GeneratePdfOptions,
    cover: CoverPage,
) -> Result<Vec<u8>> {
    options.validate()?;

    let walker = FrontierWalker::new(
        &options.pagination_selector,
        ExclusionSet::new(&options.exclude_urls),
    );
    let aggregator = walker
        .walk(
            page,
            &options.initial_doc_urls,
            &options.content_selector,
            options.strict_content,
        )
        .await?;

    let document = AggregatedDocument::finalize(
        cover,
        aggregator.into_fragments(),
        !options.disable_toc,
        options.toc_max_level,
    );

    let first_seed = options
        .initial_doc_urls
        .iter()
        .map(|u| u.trim())
        .find(|u| !u.is_empty())
        .ok_or_else(|| Error::InvalidOptions("initialDocURLs is empty".to_string()))?;
    page.navigate(first_seed).await?;

    assemble(
        page,
        &document,
        &options.exclude_selectors,
        options.css_style.as_deref(),
    )
    .await?;

    info!("Rendering PDF");
    page.print_pdf(&options.render_options()).await
}

/// Prints each non-excluded page as soon as it is visited.
struct PagePrinter<'a> {
    exclude_selectors: &'a [String],
    css_style: Option<&'a str>,
    render: RenderOptions,
    buffers: Vec<Vec<u8>>,
}

impl<P: PageDriver> Visit<P> for PagePrinter<'_> {
    async fn visit(&mut self, page: &mut P, _url: &str) -> Result<()> {
        apply_adjustments(page, self.exclude_selectors, self.css_style).await?;
        self.buffers.push(page.print_pdf(&self.render).await?);
        Ok(())
    }
}

/// Per-page run: one PDF per visited page, merged in visiting order.
pub async fn render_per_page<P: PageDriver>(
    page: &mut P,
    options: &GeneratePdfOptions,
) -> Result<Vec<u8>> {
    options.validate()?;

    let walker = FrontierWalker::new(
        &options.pagination_selector,
        ExclusionSet::new(&options.exclude_urls),
    );
    let mut printer = PagePrinter {
        exclude_selectors: &options.exclude_selectors,
        css_style: options.css_style.as_deref(),
        render: options.render_options(),
        buffers: Vec::new(),
    };
    walker
        .traverse(page, &options.initial_doc_urls, &mut printer)
        .await?;

    info!("Merging {} page PDFs", printer.buffers.len());
    merge_pdf_buffers(&printer.buffers)
}

/// Runs the variant selected by `options.per_page`, writes the result to
/// `options.output_pdf_filename` and returns the bytes.
pub async fn generate_with<P: PageDriver>(
    page: &mut P,
    options: &GeneratePdfOptions,
    client: &reqwest::Client,
) -> Result<Vec<u8>> {
    options.validate()?;

    let pdf = if options.per_page {
        render_per_page(page, options).await?
    } else {
        let cover = CoverPage::build(
            client,
            options.cover_title.clone(),
            options.cover_sub.clone(),
            options.cover_image.as_deref(),
        )
        .await;
        render_document(page, options, cover).await?
    };

    write_pdf(&options.output_pdf_filename, &pdf).await?;
    Ok(pdf)
}

pub async fn write_pdf(path: &Path, pdf: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, pdf).await.map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        "PDF saved to: {} ({} bytes)",
        path.display().to_string().blue(),
        pdf.len()
    );
    Ok(())
}
