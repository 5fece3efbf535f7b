use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures_util::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::extractor;
use crate::options::GeneratePdfOptions;
use crate::page::{PageDriver, RenderOptions};

const CSS_PX_PER_INCH: f64 = 96.0;

/// Per-command DevTools deadline. It has to outlast `printToPDF` of a whole
/// site, which chromiumoxide's 30s default does not.
const CDP_REQUEST_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// The navigation ceiling is enforced around `navigate` only. Commands such
/// as `printToPDF` get the long deadline, raised if the ceiling exceeds it.
fn request_timeout_for(options: &GeneratePdfOptions) -> Duration {
    CDP_REQUEST_TIMEOUT.max(options.navigation_timeout().unwrap_or_default())
}

/// A single headless Chromium tab driven over the DevTools protocol.
pub struct ChromiumPage {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Option<Duration>,
    wait_for_render: Option<Duration>,
}

#[derive(Deserialize)]
struct Extracted {
    found: bool,
    html: String,
}

impl ChromiumPage {
    pub async fn launch(options: &GeneratePdfOptions) -> Result<Self> {
        let config = BrowserConfig::builder()
            .window_size(1920, 1080)
            .request_timeout(request_timeout_for(options))
            .args(options.browser_args.iter().cloned())
            .build()
            .map_err(Error::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::BrowserLaunch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(err) = h {
                    // Only log if it's not a common websocket deserialization error
                    let err_str = err.to_string();
                    if !err_str.contains("data did not match any variant")
                        && !err_str.contains("untagged enum Message")
                    {
                        error!("Browser handler error: {}", err);
                    } else {
                        debug!("Chrome protocol message ignored: {}", err);
                    }
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(Error::BrowserLaunch(format!("failed to create page: {e}")));
            }
        };

        Ok(Self {
            browser,
            page,
            handler,
            navigation_timeout: options.navigation_timeout(),
            wait_for_render: options.wait_for_render(),
        })
    }

    pub async fn close(mut self) {
        self.browser.close().await.ok();
        self.handler.abort();
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| Error::Evaluation(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| Error::Evaluation(e.to_string()))
    }
}

/// Encodes `value` as a JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

impl PageDriver for ChromiumPage {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let navigation_error = |e: chromiumoxide::error::CdpError| Error::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let ceiling = self.navigation_timeout;
        let load = async {
            self.page.goto(url).await.map_err(navigation_error)?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(navigation_error)?;
            Ok::<(), Error>(())
        };

        match ceiling {
            Some(ceiling) => tokio::time::timeout(ceiling, load).await.map_err(|_| {
                Error::NavigationTimeout {
                    url: url.to_string(),
                    secs: ceiling.as_secs(),
                }
            })??,
            None => load.await?,
        }

        if let Some(wait) = self.wait_for_render {
            tokio::time::sleep(wait).await;
        }
        Ok(())
    }

    async fn extract_content(&mut self, selector: &str) -> Result<Option<String>> {
        let extracted: Extracted = self.evaluate(extractor::content_script(selector)).await?;
        Ok(extracted.found.then_some(extracted.html))
    }

    async fn next_page_url(&mut self, selector: &str) -> Result<Option<String>> {
        let script = format!(
            r#"(() => {{
                const link = document.querySelector({});
                return link && link.href ? String(link.href) : "";
            }})()"#,
            js_string(selector)
        );
        let href: String = self.evaluate(script).await?;
        Ok(Some(href).filter(|h| !h.is_empty()))
    }

    async fn replace_body(&mut self, html: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                document.body.innerHTML = {};
                return true;
            }})()"#,
            js_string(html)
        );
        self.evaluate::<bool>(script).await.map(|_| ())
    }

    async fn remove_matching(&mut self, selector: &str) -> Result<usize> {
        let script = format!(
            r#"(() => {{
                const matches = document.querySelectorAll({});
                matches.forEach((match) => match.remove());
                return matches.length;
            }})()"#,
            js_string(selector)
        );
        self.evaluate(script).await
    }

    async fn add_style(&mut self, css: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const style = document.createElement("style");
                style.textContent = {};
                (document.head || document.documentElement).appendChild(style);
                return true;
            }})()"#,
            js_string(css)
        );
        self.evaluate::<bool>(script).await.map(|_| ())
    }

    async fn print_pdf(&mut self, options: &RenderOptions) -> Result<Vec<u8>> {
        let page_size = options.format.map(|f| f.dimensions_in());
        let with_header_footer =
            options.header_template.is_some() || options.footer_template.is_some();

        let params = PrintToPdfParams {
            print_background: Some(true),
            paper_width: page_size.map(|(w, _)| w),
            paper_height: page_size.map(|(_, h)| h),
            margin_top: Some(options.margin.top / CSS_PX_PER_INCH),
            margin_right: Some(options.margin.right / CSS_PX_PER_INCH),
            margin_bottom: Some(options.margin.bottom / CSS_PX_PER_INCH),
            margin_left: Some(options.margin.left / CSS_PX_PER_INCH),
            display_header_footer: Some(with_header_footer),
            header_template: options.header_template.clone(),
            footer_template: options.footer_template.clone(),
            ..Default::default()
        };

        self.page
            .pdf(params)
            .await
            .map_err(|e| Error::Render(e.to_string()))
    }
}
