//! Error types for mr-pdf.
//!
//! Only fatal failures live here. A chain ending without a pagination link,
//! a page whose content selector matches nothing (unless strict), and a cover
//! image that cannot be fetched are all ordinary outcomes and never surface
//! as an [`Error`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Required options are absent or an option value could not be parsed.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("Failed to navigate to {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Navigation to {url} did not settle within {secs}s")]
    NavigationTimeout { url: String, secs: u64 },

    /// A script run inside the page failed or returned an unexpected value.
    #[error("Script evaluation failed: {0}")]
    Evaluation(String),

    /// Raised only when strict content mode is enabled.
    #[error("Content selector '{selector}' matched nothing on {url}")]
    ContentNotFound { url: String, selector: String },

    #[error("Failed to render PDF: {0}")]
    Render(String),

    #[error("No PDF pages were rendered")]
    NothingToMerge,

    #[error("Failed to merge PDF buffers: {0}")]
    Merge(#[from] lopdf::Error),

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
