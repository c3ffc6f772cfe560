use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";

/// Returns the paragraph texts of a .docx file joined by newlines.
pub fn extract_docx_text(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).context("file is not a valid .docx (zip) archive")?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .with_context(|| format!("archive has no {DOCUMENT_PART}"))?
        .read_to_string(&mut xml)
        .with_context(|| format!("failed to read {DOCUMENT_PART}"))?;

    Ok(paragraphs_from_document_xml(&xml)?.join("\n"))
}

/// Collects the text of each top-level `<w:p>` in document order.
///
/// Tabs and breaks inside a run become `\t` and `\n`. Paragraphs nested in a
/// text box become lines of the paragraph that anchors them, and
/// `mc:Fallback` branches are skipped since they repeat their `mc:Choice`.
pub fn paragraphs_from_document_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut open: Vec<OpenParagraph> = Vec::new();
    let mut in_text = false;
    let mut fallback_depth = 0usize;

    loop {
        let event = reader.read_event().context("malformed document XML")?;
        if fallback_depth > 0 {
            match event {
                Event::Start(e) if e.name().as_ref() == b"mc:Fallback" => fallback_depth += 1,
                Event::End(e) if e.name().as_ref() == b"mc:Fallback" => fallback_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(OpenParagraph::default()),
                b"w:t" => in_text = true,
                b"mc:Fallback" => fallback_depth = 1,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => close_paragraph(&mut open, &mut paragraphs, String::new()),
                b"w:tab" => push_to_current(&mut open, "\t"),
                b"w:br" | b"w:cr" => push_to_current(&mut open, "\n"),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.unescape().context("invalid escape in document XML")?;
                push_to_current(&mut open, &text);
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        close_paragraph(&mut open, &mut paragraphs, paragraph.text);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}

#[derive(Default)]
struct OpenParagraph {
    text: String,
    // Set after a nested paragraph so the parent's next text starts a new line.
    break_pending: bool,
}

fn close_paragraph(open: &mut [OpenParagraph], paragraphs: &mut Vec<String>, text: String) {
    match open.last_mut() {
        Some(parent) => {
            if !parent.text.is_empty() {
                parent.text.push('\n');
            }
            parent.text.push_str(&text);
            parent.break_pending = true;
        }
        None => paragraphs.push(text),
    }
}

fn push_to_current(open: &mut [OpenParagraph], text: &str) {
    if let Some(current) = open.last_mut() {
        if current.break_pending {
            current.text.push('\n');
            current.break_pending = false;
        }
        current.text.push_str(text);
    }
}
