//! Pulls the printable content region out of a rendered page.

use tracing::debug;

use crate::chromium::js_string;
use crate::error::{Error, Result};
use crate::page::PageDriver;

/// Script evaluated in the page: forces a page break after the content
/// element, opens every `<details>` inside it and reports its outer HTML.
pub(crate) fn content_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            const element = document.querySelector({});
            if (!element) {{
                return {{ found: false, html: "" }};
            }}
            element.style.pageBreakAfter = "always";
            element.querySelectorAll("details").forEach((details) => {{
                details.setAttribute("open", "");
            }});
            return {{ found: true, html: element.outerHTML }};
        }})()"#,
        js_string(selector)
    )
}

/// Returns the fragment for the page currently loaded in `page`.
///
/// A page without a matching element contributes an empty fragment unless
/// `strict` is set, in which case the run is aborted.
pub async fn extract_fragment<P: PageDriver>(
    page: &mut P,
    url: &str,
    selector: &str,
    strict: bool,
) -> Result<String> {
    match page.extract_content(selector).await? {
        Some(html) => Ok(html),
        None if strict => Err(Error::ContentNotFound {
            url: url.to_string(),
            selector: selector.to_string(),
        }),
        None => {
            debug!("Content selector '{}' matched nothing on {}", selector, url);
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_script_embeds_selector_safely() {
        let script = content_script(r#"div[data-role="main"]"#);
        assert!(script.contains(r#"document.querySelector("div[data-role=\"main\"]")"#));
        assert!(script.contains("pageBreakAfter"));
        assert!(script.contains("details"));
    }
}
