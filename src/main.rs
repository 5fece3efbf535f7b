use anyhow::Result;
use clap::Parser;
use colored::*;
use mr_pdf::{generate_pdf, GeneratePdfOptions, PaperFormat, PdfMargin, DEFAULT_OUTPUT_FILENAME};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "mr-pdf")]
#[command(about = "Generate a single PDF from a documentation website by following its pagination links")]
#[command(version)]
struct Args {
    /// URLs to start generating the PDF from (comma separated)
    #[arg(long = "initialDocURLs", value_delimiter = ',', required = true)]
    initial_doc_urls: Vec<String>,

    /// URLs whose content is left out; their pagination link is still followed
    #[arg(long = "excludeURLs", value_delimiter = ',')]
    exclude_urls: Vec<String>,

    /// Selector of the main content of each page
    #[arg(long = "contentSelector")]
    content_selector: String,

    /// Selector of the link to the next page
    #[arg(long = "paginationSelector")]
    pagination_selector: String,

    /// Selectors of elements removed before printing, ex: .nav
    #[arg(long = "excludeSelectors", value_delimiter = ',')]
    exclude_selectors: Vec<String>,

    /// CSS injected before printing, ex: body{padding-top: 0;}
    #[arg(long = "cssStyle")]
    css_style: Option<String>,

    /// Name of the output PDF file
    #[arg(long = "outputPDFFilename", default_value = DEFAULT_OUTPUT_FILENAME)]
    output_pdf_filename: PathBuf,

    /// Margin around the PDF as top,right,bottom,left, ex: 32,32,32,32
    #[arg(long = "pdfMargin", value_parser = parse_margin)]
    pdf_margin: Option<PdfMargin>,

    /// Paper format, ex: A3, A4, Letter
    #[arg(long = "paperFormat", alias = "pdfFormat", value_parser = parse_format)]
    paper_format: Option<PaperFormat>,

    /// Title for the PDF cover
    #[arg(long = "coverTitle")]
    cover_title: Option<String>,

    /// Subtitle for the PDF cover
    #[arg(long = "coverSub")]
    cover_sub: Option<String>,

    /// Image URL for the PDF cover
    #[arg(long = "coverImage")]
    cover_image: Option<String>,

    /// Leave out the table of contents
    #[arg(long = "disableTOC")]
    disable_toc: bool,

    /// Deepest heading level listed in the table of contents (1-6)
    #[arg(long = "tocLevel", default_value_t = 3)]
    toc_level: u8,

    /// Milliseconds to wait after each page load
    #[arg(long = "waitForRender")]
    wait_for_render: Option<u64>,

    /// Maximum seconds to wait for a page load (default: no limit beyond the 24h per-command deadline)
    #[arg(long = "timeout", value_parser = parse_timeout)]
    timeout: Option<u64>,

    /// HTML template for the page header
    #[arg(long = "headerTemplate")]
    header_template: Option<String>,

    /// HTML template for the page footer
    #[arg(long = "footerTemplate")]
    footer_template: Option<String>,

    /// Extra browser arguments, ex: --no-sandbox
    #[arg(long = "browserArgs", alias = "puppeteerArgs", value_delimiter = ',', allow_hyphen_values = true)]
    browser_args: Vec<String>,

    /// Fail when a page has no element matching the content selector
    #[arg(long = "strictContent")]
    strict_content: bool,

    /// Print every page separately and merge the PDFs instead of building one document
    #[arg(long = "perPage")]
    per_page: bool,
}

fn parse_margin(s: &str) -> Result<PdfMargin, String> {
    s.parse::<PdfMargin>().map_err(|e| e.to_string())
}

fn parse_format(s: &str) -> Result<PaperFormat, String> {
    s.parse::<PaperFormat>().map_err(|e| e.to_string())
}

fn parse_timeout(s: &str) -> Result<u64, String> {
    let value = s.parse::<u64>().map_err(|_| "Not a whole number of seconds.")?;
    if value == 0 {
        return Err("Must be a positive number.".to_string());
    }
    Ok(value)
}

impl From<Args> for GeneratePdfOptions {
    fn from(args: Args) -> Self {
        Self {
            initial_doc_urls: args.initial_doc_urls,
            exclude_urls: args.exclude_urls,
            content_selector: args.content_selector,
            pagination_selector: args.pagination_selector,
            exclude_selectors: args.exclude_selectors,
            css_style: args.css_style,
            output_pdf_filename: args.output_pdf_filename,
            pdf_margin: args.pdf_margin.unwrap_or_default(),
            pdf_format: args.paper_format,
            cover_title: args.cover_title,
            cover_sub: args.cover_sub,
            cover_image: args.cover_image,
            disable_toc: args.disable_toc,
            header_template: args.header_template,
            footer_template: args.footer_template,
            browser_args: args.browser_args,
            wait_for_render: args.wait_for_render,
            navigation_timeout: args.timeout,
            strict_content: args.strict_content,
            toc_max_level: args.toc_level,
            per_page: args.per_page,
        }
    }
}

async fn run(options: GeneratePdfOptions) -> Result<()> {
    generate_pdf(&options).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    // Set up logging with chromiumoxide errors suppressed
    let filter = EnvFilter::from_default_env()
        .add_directive("chromiumoxide::conn=off".parse().unwrap())
        .add_directive("chromiumoxide::handler=off".parse().unwrap())
        .add_directive("mr_pdf=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let options = GeneratePdfOptions::from(Args::parse());

    if let Err(e) = run(options).await {
        error!("{}", format!("Error: {:#}", e).red());
        process::exit(1);
    }

    info!("{}", "Finish generating PDF!".green());
}
