use anyhow::{Context, Result};
use lopdf::Document;
use std::path::Path;

/// Concatenates the text of every page, in page order.
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    let document = Document::load(path).context("failed to parse PDF")?;
    if document.is_encrypted() {
        anyhow::bail!("encrypted PDFs are not supported");
    }

    // BTreeMap keyed by page number, so iteration is in page order.
    let pages = document.get_pages();
    log::debug!("Extracting text from {} PDF page(s)", pages.len());

    let mut text = String::new();
    for page_number in pages.keys() {
        let page_text = document
            .extract_text(&[*page_number])
            .with_context(|| format!("failed to extract text from page {page_number}"))?;
        text.push_str(&page_text);
    }
    Ok(text)
}
