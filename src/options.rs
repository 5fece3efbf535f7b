use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::page::RenderOptions;

pub const DEFAULT_OUTPUT_FILENAME: &str = "mr-pdf.pdf";
pub const DEFAULT_MARGIN_PX: f64 = 32.0;
pub const DEFAULT_TOC_MAX_LEVEL: u8 = 3;

/// Everything one run needs. Keys follow the camelCase names users already
/// know from the command line, so a JSON file can be deserialized directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratePdfOptions {
    #[serde(rename = "initialDocURLs")]
    pub initial_doc_urls: Vec<String>,
    #[serde(rename = "excludeURLs")]
    pub exclude_urls: Vec<String>,
    pub content_selector: String,
    pub pagination_selector: String,
    pub exclude_selectors: Vec<String>,
    pub css_style: Option<String>,
    #[serde(rename = "outputPDFFilename")]
    pub output_pdf_filename: PathBuf,
    pub pdf_margin: PdfMargin,
    #[serde(alias = "paperFormat")]
    pub pdf_format: Option<PaperFormat>,
    pub cover_title: Option<String>,
    pub cover_sub: Option<String>,
    pub cover_image: Option<String>,
    #[serde(rename = "disableTOC")]
    pub disable_toc: bool,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
    /// Extra command-line switches for the browser process.
    #[serde(alias = "puppeteerArgs")]
    pub browser_args: Vec<String>,
    /// Milliseconds to wait after each navigation before touching the DOM.
    pub wait_for_render: Option<u64>,
    /// Upper bound in seconds for a single navigation. With `None` only the
    /// browser's per-command deadline of 24 hours applies.
    pub navigation_timeout: Option<u64>,
    /// Fail the run when a page has no element matching `content_selector`.
    pub strict_content: bool,
    /// Deepest heading level collected into the table of contents.
    pub toc_max_level: u8,
    /// Render each page to its own PDF and merge them instead of
    /// assembling one document.
    pub per_page: bool,
}

impl Default for GeneratePdfOptions {
    fn default() -> Self {
        Self {
            initial_doc_urls: Vec::new(),
            exclude_urls: Vec::new(),
            content_selector: String::new(),
            pagination_selector: String::new(),
            exclude_selectors: Vec::new(),
            css_style: None,
            output_pdf_filename: PathBuf::from(DEFAULT_OUTPUT_FILENAME),
            pdf_margin: PdfMargin::default(),
            pdf_format: None,
            cover_title: None,
            cover_sub: None,
            cover_image: None,
            disable_toc: false,
            header_template: None,
            footer_template: None,
            browser_args: Vec::new(),
            wait_for_render: None,
            navigation_timeout: None,
            strict_content: false,
            toc_max_level: DEFAULT_TOC_MAX_LEVEL,
            per_page: false,
        }
    }
}

impl GeneratePdfOptions {
    /// Rejects the options if any required field is missing, naming all of
    /// them at once.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.initial_doc_urls.iter().all(|u| u.trim().is_empty()) {
            missing.push("initialDocURLs");
        }
        if self.content_selector.trim().is_empty() {
            missing.push("contentSelector");
        }
        if self.pagination_selector.trim().is_empty() {
            missing.push("paginationSelector");
        }
        if !missing.is_empty() {
            return Err(Error::InvalidOptions(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        if !(1..=6).contains(&self.toc_max_level) {
            return Err(Error::InvalidOptions(format!(
                "tocMaxLevel must be between 1 and 6, got {}",
                self.toc_max_level
            )));
        }

        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            format: self.pdf_format,
            margin: self.pdf_margin,
            header_template: self.header_template.clone(),
            footer_template: self.footer_template.clone(),
        }
    }

    pub fn navigation_timeout(&self) -> Option<Duration> {
        self.navigation_timeout.map(Duration::from_secs)
    }

    pub fn wait_for_render(&self) -> Option<Duration> {
        self.wait_for_render
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// Page margins in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfMargin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for PdfMargin {
    fn default() -> Self {
        Self::uniform(DEFAULT_MARGIN_PX)
    }
}

impl PdfMargin {
    pub fn uniform(px: f64) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }
}

impl FromStr for PdfMargin {
    type Err = Error;

    /// Accepts `"top,right,bottom,left"` or a single value for all sides.
    /// Each value may carry a `px`, `in`, `cm` or `mm` suffix.
    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(parse_length_px)
            .collect::<Result<Vec<_>>>()?;

        match values.as_slice() {
            [all] => Ok(Self::uniform(*all)),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            _ => Err(Error::InvalidOptions(format!(
                "pdfMargin expects 1 or 4 comma separated values, got '{s}'"
            ))),
        }
    }
}

fn parse_length_px(raw: &str) -> Result<f64> {
    let raw = raw.trim();
    let (number, px_per_unit) = if let Some(n) = raw.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = raw.strip_suffix("in") {
        (n, 96.0)
    } else if let Some(n) = raw.strip_suffix("cm") {
        (n, 96.0 / 2.54)
    } else if let Some(n) = raw.strip_suffix("mm") {
        (n, 96.0 / 25.4)
    } else {
        (raw, 1.0)
    };

    let value = number
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidOptions(format!("'{raw}' is not a valid margin")))?;
    if value < 0.0 {
        return Err(Error::InvalidOptions(format!(
            "margin must be zero or positive, got '{raw}'"
        )));
    }
    Ok(value * px_per_unit)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaperFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
}

impl PaperFormat {
    /// Width and height in inches.
    pub fn dimensions_in(self) -> (f64, f64) {
        match self {
            Self::Letter => (8.5, 11.0),
            Self::Legal => (8.5, 14.0),
            Self::Tabloid => (11.0, 17.0),
            Self::Ledger => (17.0, 11.0),
            Self::A0 => (33.1, 46.8),
            Self::A1 => (23.4, 33.1),
            Self::A2 => (16.54, 23.4),
            Self::A3 => (11.7, 16.54),
            Self::A4 => (8.27, 11.7),
            Self::A5 => (5.83, 8.27),
            Self::A6 => (4.13, 5.83),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Letter => "Letter",
            Self::Legal => "Legal",
            Self::Tabloid => "Tabloid",
            Self::Ledger => "Ledger",
            Self::A0 => "A0",
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::A3 => "A3",
            Self::A4 => "A4",
            Self::A5 => "A5",
            Self::A6 => "A6",
        }
    }
}

impl fmt::Display for PaperFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaperFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let format = match s.trim().to_ascii_lowercase().as_str() {
            "letter" => Self::Letter,
            "legal" => Self::Legal,
            "tabloid" => Self::Tabloid,
            "ledger" => Self::Ledger,
            "a0" => Self::A0,
            "a1" => Self::A1,
            "a2" => Self::A2,
            "a3" => Self::A3,
            "a4" => Self::A4,
            "a5" => Self::A5,
            "a6" => Self::A6,
            _ => {
                return Err(Error::InvalidOptions(format!(
                    "unknown paper format '{s}'"
                )))
            }
        };
        Ok(format)
    }
}

impl TryFrom<String> for PaperFormat {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PaperFormat> for String {
    fn from(format: PaperFormat) -> Self {
        format.name().to_string()
    }
}
