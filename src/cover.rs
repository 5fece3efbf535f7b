use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use colored::*;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};

use crate::markup::escape_html;

const SVG_MIME: &str = "image/svg+xml";
const COVER_IMAGE_SIZE_PX: u32 = 140;

/// The first page of the document. Built once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverPage {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub image_base64: Option<String>,
    pub image_is_svg: bool,
}

impl CoverPage {
    pub fn new(title: Option<String>, subtitle: Option<String>) -> Self {
        Self {
            title,
            subtitle,
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: Option<CoverImage>) -> Self {
        if let Some(image) = image {
            self.image_base64 = Some(image.base64);
            self.image_is_svg = image.is_svg;
        }
        self
    }

    /// Builds the cover, fetching `image_url` if one is given. A failed fetch
    /// leaves the cover without an image.
    pub async fn build(
        client: &reqwest::Client,
        title: Option<String>,
        subtitle: Option<String>,
        image_url: Option<&str>,
    ) -> Self {
        let image = match image_url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => fetch_cover_image(client, url).await,
            None => None,
        };
        Self::new(title, subtitle).with_image(image)
    }

    pub fn to_html(&self) -> String {
        let title = self
            .title
            .as_deref()
            .map(|t| format!("<h1>{}</h1>", escape_html(t)))
            .unwrap_or_default();
        let subtitle = self
            .subtitle
            .as_deref()
            .map(|s| format!("<h3>{}</h3>", escape_html(s)))
            .unwrap_or_default();
        let image = self
            .image_base64
            .as_deref()
            .map(|data| {
                let mime = if self.image_is_svg { SVG_MIME } else { "image/png" };
                format!(
                    r#"<img class="cover-img" src="data:{mime};base64,{data}" alt="" width="{size}" height="{size}" />"#,
                    size = COVER_IMAGE_SIZE_PX
                )
            })
            .unwrap_or_default();

        format!(
            r#"<div class="pdf-cover" style="display: flex; flex-direction: column; justify-content: center; align-items: center; height: 100vh; page-break-after: always;">{title}{subtitle}{image}</div>"#
        )
    }
}

/// An image downloaded for the cover, already base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub base64: String,
    pub is_svg: bool,
}

impl CoverImage {
    pub fn from_bytes(bytes: &[u8], content_type: Option<&str>) -> Self {
        let is_svg = content_type
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(SVG_MIME));
        Self {
            base64: BASE64.encode(bytes),
            is_svg,
        }
    }
}

/// Fetches the cover image once. Any failure is logged and yields `None`.
pub async fn fetch_cover_image(client: &reqwest::Client, url: &str) -> Option<CoverImage> {
    info!("Fetching cover image {}", url.cyan());

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Failed to fetch cover image {}: {}", url, e);
            return None;
        }
    };

    if !response.status().is_success() {
        warn!(
            "Cover image {} returned HTTP {}, continuing without it",
            url,
            response.status()
        );
        return None;
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match response.bytes().await {
        Ok(bytes) => {
            debug!(
                "Cover image is {} bytes ({})",
                bytes.len(),
                content_type.as_deref().unwrap_or("unknown type")
            );
            Some(CoverImage::from_bytes(&bytes, content_type.as_deref()))
        }
        Err(e) => {
            warn!("Failed to read cover image {}: {}", url, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one HTTP response on a local port and returns its URL.
    async fn serve_once(
        status: &'static str,
        content_type: &'static str,
        body: &'static [u8],
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}/logo.svg")
    }

    #[test]
    fn svg_detected_from_content_type() {
        let image = CoverImage::from_bytes(b"<svg/>", Some("image/svg+xml; charset=utf-8"));
        assert!(image.is_svg);
        assert_eq!(image.base64, "PHN2Zy8+");

        let image = CoverImage::from_bytes(&[0x89, b'P', b'N', b'G'], Some("image/png"));
        assert!(!image.is_svg);

        assert!(!CoverImage::from_bytes(b"x", None).is_svg);
    }

    #[test]
    fn cover_html_breaks_page_and_fills_viewport() {
        let html = CoverPage::new(Some("Guide".into()), Some("v2 <beta>".into())).to_html();
        assert!(html.contains("page-break-after: always"));
        assert!(html.contains("height: 100vh"));
        assert!(html.contains("<h1>Guide</h1>"));
        assert!(html.contains("<h3>v2 &lt;beta&gt;</h3>"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn cover_html_embeds_image_as_data_uri() {
        let cover = CoverPage::default().with_image(Some(CoverImage::from_bytes(
            b"<svg/>",
            Some("image/svg+xml"),
        )));
        let html = cover.to_html();
        assert!(html.contains(r#"src="data:image/svg+xml;base64,PHN2Zy8+""#));
        assert!(!html.contains("<h1>"));
    }

    #[tokio::test]
    async fn unreachable_image_degrades_to_no_image() {
        let client = reqwest::Client::new();
        let cover = CoverPage::build(
            &client,
            Some("Title".into()),
            None,
            Some("not a valid url"),
        )
        .await;
        assert_eq!(cover.image_base64, None);
        assert_eq!(cover.title.as_deref(), Some("Title"));
    }

    #[tokio::test]
    async fn served_svg_is_fetched_and_encoded() {
        let url = serve_once("200 OK", "image/svg+xml", b"<svg/>").await;
        let client = reqwest::Client::new();

        let image = fetch_cover_image(&client, &url).await.unwrap();
        assert!(image.is_svg);
        assert_eq!(image.base64, "PHN2Zy8+");

    }

    #[tokio::test]
    async fn cover_built_from_served_image_embeds_it() {
        let url = serve_once("200 OK", "image/png", b"PNG").await;
        let client = reqwest::Client::new();

        let cover = CoverPage::build(&client, Some("Guide".into()), None, Some(&url)).await;
        assert_eq!(cover.image_base64.as_deref(), Some("UE5H"));
        assert!(!cover.image_is_svg);
        assert!(cover.to_html().contains("data:image/png;base64,UE5H"));
    }

    #[tokio::test]
    async fn error_status_yields_no_image() {
        let url = serve_once("404 Not Found", "text/plain", b"missing").await;
        let client = reqwest::Client::new();

        assert_eq!(fetch_cover_image(&client, &url).await, None);
    }
}
