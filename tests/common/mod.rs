//! In-memory `PageDriver` for exercising the pipeline without a browser.

#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, Stream};
use mr_pdf::{Error, PageDriver, RenderOptions, Result};
use scraper::{Html, Selector};
use std::collections::HashMap;

pub struct MemoryPage {
    site: HashMap<String, String>,
    document: String,
    pub navigations: Vec<String>,
    pub styles: Vec<String>,
    /// Serialized document at each `print_pdf` call.
    pub printed: Vec<String>,
    pub render_options: Vec<RenderOptions>,
}

impl MemoryPage {
    pub fn new<I, U, H>(pages: I) -> Self
    where
        I: IntoIterator<Item = (U, H)>,
        U: Into<String>,
        H: Into<String>,
    {
        Self {
            site: pages
                .into_iter()
                .map(|(url, html)| (url.into(), html.into()))
                .collect(),
            document: String::new(),
            navigations: Vec::new(),
            styles: Vec::new(),
            printed: Vec::new(),
            render_options: Vec::new(),
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    fn parsed(&self) -> Html {
        Html::parse_document(&self.document)
    }
}

fn selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| Error::Evaluation(format!("bad selector '{s}': {e:?}")))
}

impl PageDriver for MemoryPage {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let html = self.site.get(url).ok_or_else(|| Error::Navigation {
            url: url.to_string(),
            reason: "404".to_string(),
        })?;
        self.document = html.clone();
        self.navigations.push(url.to_string());
        Ok(())
    }

    async fn extract_content(&mut self, s: &str) -> Result<Option<String>> {
        let selector = selector(s)?;
        Ok(self.parsed().select(&selector).next().map(|e| e.html()))
    }

    async fn next_page_url(&mut self, s: &str) -> Result<Option<String>> {
        let selector = selector(s)?;
        Ok(self
            .parsed()
            .select(&selector)
            .next()
            .and_then(|e| e.value().attr("href"))
            .map(str::to_string))
    }

    async fn replace_body(&mut self, html: &str) -> Result<()> {
        let head = self
            .parsed()
            .select(&selector("head")?)
            .next()
            .map(|h| h.inner_html())
            .unwrap_or_default();
        self.document = format!("<html><head>{head}</head><body>{html}</body></html>");
        Ok(())
    }

    async fn remove_matching(&mut self, s: &str) -> Result<usize> {
        let selector = selector(s)?;
        let mut document = self.parsed();
        let ids: Vec<_> = document.select(&selector).map(|e| e.id()).collect();
        for id in &ids {
            if let Some(mut node) = document.tree.get_mut(*id) {
                node.detach();
            }
        }
        self.document = document.html();
        Ok(ids.len())
    }

    async fn add_style(&mut self, css: &str) -> Result<()> {
        self.styles.push(css.to_string());
        Ok(())
    }

    async fn print_pdf(&mut self, options: &RenderOptions) -> Result<Vec<u8>> {
        self.printed.push(self.document.clone());
        self.render_options.push(options.clone());
        Ok(single_page_pdf(100 + self.printed.len() as i64))
    }
}

/// One-page PDF whose MediaBox width identifies it.
pub fn single_page_pdf(width: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), 200.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut data = Vec::new();
    doc.save_to(&mut data).unwrap();
    data
}

pub fn page_widths(data: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(data).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| {
            let page = doc.get_dictionary(id).unwrap();
            page.get(b"MediaBox").unwrap().as_array().unwrap()[2]
                .as_i64()
                .unwrap()
        })
        .collect()
}

/// A page with `content` in its body and an optional `a.next` link.
pub fn doc_page(content: &str, next: Option<&str>) -> String {
    let link = next
        .map(|href| format!(r#"<a class="next" href="{href}">Next</a>"#))
        .unwrap_or_default();
    format!("<html><head><title>Docs</title></head><body>{content}{link}</body></html>")
}
