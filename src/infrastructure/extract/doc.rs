//! Best-effort text extraction for legacy Word 97-2003 (.doc) files.
//!
//! Reads the main document text through the piece table. Formatting, headers,
//! footnotes and field instructions are dropped.

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;

const WORD_IDENT: u16 = 0xA5EC;
const FLAGS_OFFSET: usize = 0x0A;
const WHICH_TABLE_STREAM: u16 = 0x0200;
const CCP_TEXT_OFFSET: usize = 0x4C;
const FC_CLX_OFFSET: usize = 0x01A2;
const LCB_CLX_OFFSET: usize = 0x01A6;

pub fn extract_doc_text(path: &Path) -> Result<String> {
    let mut compound = cfb::open(path).context("file is not an OLE compound document")?;
    let word_document = read_stream(&mut compound, "WordDocument")?;

    if read_u16(&word_document, 0)? != WORD_IDENT {
        bail!("WordDocument stream has an unknown signature");
    }
    let flags = read_u16(&word_document, FLAGS_OFFSET)?;
    let table_name = if flags & WHICH_TABLE_STREAM != 0 { "1Table" } else { "0Table" };
    let table = read_stream(&mut compound, table_name)?;

    let ccp_text = read_u32(&word_document, CCP_TEXT_OFFSET)? as usize;
    let fc_clx = read_u32(&word_document, FC_CLX_OFFSET)? as usize;
    let lcb_clx = read_u32(&word_document, LCB_CLX_OFFSET)? as usize;
    let clx = table
        .get(fc_clx..fc_clx + lcb_clx)
        .context("piece table lies outside the table stream")?;

    let raw = text_from_pieces(&word_document, clx, ccp_text)?;
    Ok(clean_control_characters(&raw))
}

fn read_stream<F: Read + std::io::Seek>(compound: &mut cfb::CompoundFile<F>, name: &str) -> Result<Vec<u8>> {
    let mut stream = compound
        .open_stream(name)
        .with_context(|| format!("missing {name} stream"))?;
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Walks the Clx: skips property runs (0x01) and decodes the piece table (0x02).
fn text_from_pieces(word_document: &[u8], clx: &[u8], ccp_text: usize) -> Result<String> {
    let mut pos = 0;
    while pos < clx.len() && clx[pos] == 0x01 {
        let cb = read_u16(clx, pos + 1)? as usize;
        pos += 3 + cb;
    }
    if clx.get(pos) != Some(&0x02) {
        bail!("piece table not found");
    }
    let lcb = read_u32(clx, pos + 1)? as usize;
    let plc = clx.get(pos + 5..pos + 5 + lcb).context("truncated piece table")?;
    if lcb < 4 || (lcb - 4) % 12 != 0 {
        bail!("piece table has an invalid size ({lcb} bytes)");
    }
    let pieces = (lcb - 4) / 12;
    let descriptors = &plc[(pieces + 1) * 4..];

    let mut text = String::new();
    let mut remaining = ccp_text;
    for i in 0..pieces {
        if remaining == 0 {
            break;
        }
        let cp_start = read_u32(plc, i * 4)? as usize;
        let cp_end = read_u32(plc, (i + 1) * 4)? as usize;
        let len = cp_end.saturating_sub(cp_start).min(remaining);
        remaining -= len;

        let fc_raw = read_u32(descriptors, i * 8 + 2)?;
        let compressed = fc_raw & 0x4000_0000 != 0;
        let fc = (fc_raw & 0x3FFF_FFFF) as usize;
        if compressed {
            let start = fc / 2;
            let bytes = word_document
                .get(start..start + len)
                .context("text piece lies outside the WordDocument stream")?;
            // 8-bit pieces are cp1252; Latin-1 is close enough for plain text.
            text.extend(bytes.iter().map(|&b| char::from(b)));
        } else {
            let bytes = word_document
                .get(fc..fc + len * 2)
                .context("text piece lies outside the WordDocument stream")?;
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            text.push_str(&String::from_utf16_lossy(&units));
        }
    }
    Ok(text)
}

/// Maps Word's paragraph, cell and break marks to whitespace and drops field codes.
fn clean_control_characters(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut field_depth = 0usize;
    let mut in_instruction = false;
    for c in raw.chars() {
        match c {
            '\u{13}' => {
                field_depth += 1;
                in_instruction = true;
            }
            '\u{14}' => in_instruction = false,
            '\u{15}' => {
                field_depth = field_depth.saturating_sub(1);
                in_instruction = false;
            }
            _ if in_instruction && field_depth > 0 => {}
            '\r' | '\u{0B}' | '\u{0C}' => text.push('\n'),
            '\u{07}' => text.push('\t'),
            '\t' | '\n' => text.push(c),
            c if c.is_control() => {}
            c => text.push(c),
        }
    }
    text
}

fn read_u16(bytes: &[u8], offset: usize) -> Result<u16> {
    let slice = bytes.get(offset..offset + 2).context("unexpected end of stream")?;
    Ok(u16::from_le_bytes([slice[0], slice[1]]))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    let slice = bytes.get(offset..offset + 4).context("unexpected end of stream")?;
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}
