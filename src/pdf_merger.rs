use lopdf::{Document, Object, ObjectId};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Page attributes a page may inherit from its page-tree ancestors.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// Concatenates independently rendered PDFs, keeping input order.
pub struct PdfMerger {
    documents: Vec<Document>,
}

impl PdfMerger {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
        }
    }

    pub fn add_pdf_bytes(&mut self, data: &[u8]) -> Result<()> {
        let document = Document::load_mem(data)?;
        debug!("Loaded PDF with {} pages", document.get_pages().len());
        self.documents.push(document);
        Ok(())
    }

    pub async fn add_pdf(&mut self, path: &Path) -> Result<()> {
        let data = fs::read(path).await?;
        self.add_pdf_bytes(&data)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn merge(self) -> Result<Vec<u8>> {
        let mut documents = self.documents.into_iter();
        let Some(mut merged_doc) = documents.next() else {
            return Err(Error::NothingToMerge);
        };

        let pages_id = page_tree_root(&merged_doc)?;
        let mut all_page_ids: Vec<ObjectId> = merged_doc.get_pages().into_values().collect();
        debug!("First document has {} pages", all_page_ids.len());

        let mut max_id = merged_doc.max_id;

        for (i, mut doc_copy) in documents.enumerate() {
            debug!(
                "Processing document {} with {} pages",
                i + 2,
                doc_copy.get_pages().len()
            );

            // Renumber objects to avoid conflicts
            doc_copy.renumber_objects_with(max_id + 1);
            max_id = doc_copy.max_id;

            let catalog_id = doc_copy.trailer.get(b"Root")?.as_reference()?;
            let root_id = page_tree_root(&doc_copy)?;
            let page_ids: Vec<ObjectId> = doc_copy.get_pages().into_values().collect();

            for page_id in &page_ids {
                let inherited = inherited_attributes(&doc_copy, *page_id);
                let page = doc_copy.get_object_mut(*page_id)?.as_dict_mut()?;
                for (key, value) in inherited {
                    page.set(key, value);
                }
                page.set("Parent", Object::Reference(pages_id));
            }

            let skipped: HashSet<ObjectId> = [catalog_id, root_id].into_iter().collect();
            for (obj_id, obj) in doc_copy.objects {
                if !skipped.contains(&obj_id) {
                    merged_doc.objects.insert(obj_id, obj);
                }
            }

            all_page_ids.extend(page_ids);
        }

        info!("Total pages collected: {}", all_page_ids.len());

        let count = all_page_ids.len() as i64;
        let pages_dict = merged_doc.get_object_mut(pages_id)?.as_dict_mut()?;
        pages_dict.set(
            "Kids",
            Object::Array(all_page_ids.into_iter().map(Object::Reference).collect()),
        );
        pages_dict.set("Count", Object::Integer(count));

        merged_doc.max_id = max_id;

        let mut data = Vec::new();
        merged_doc.save_to(&mut data)?;
        Ok(data)
    }
}

impl Default for PdfMerger {
    fn default() -> Self {
        Self::new()
    }
}

fn page_tree_root(document: &Document) -> Result<ObjectId> {
    Ok(document.catalog()?.get(b"Pages")?.as_reference()?)
}

/// Inheritable attributes missing on the page itself, resolved from the
/// nearest ancestor that defines them.
fn inherited_attributes(document: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let Ok(page) = document.get_dictionary(page_id) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for key in INHERITABLE {
        if page.has(key) {
            continue;
        }
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        while let Some(parent_id) = parent {
            let Ok(node) = document.get_dictionary(parent_id) else {
                break;
            };
            if let Ok(value) = node.get(key) {
                found.push((key.to_vec(), value.clone()));
                break;
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }
    }
    found
}

/// Merges `buffers` in order into a single PDF.
pub fn merge_pdf_buffers<B: AsRef<[u8]>>(buffers: &[B]) -> Result<Vec<u8>> {
    let mut merger = PdfMerger::new();
    for buffer in buffers {
        merger.add_pdf_bytes(buffer.as_ref())?;
    }
    merger.merge()
}
