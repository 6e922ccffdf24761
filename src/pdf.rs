use std::path::Path;

use log::debug;
use pdfium_render::prelude::*;

use crate::error::{OutlineError, Result};
use crate::types::{ContentBlock, Fragment, PageContent, Rect, Span};

/// Supplies per-page text content for a document.
pub trait PageSource {
    fn load_pages(&self, path: &Path) -> Result<Vec<PageContent>>;
}

/// Page source backed by the pdfium library.
pub struct PdfiumSource {
    pdfium: Pdfium,
}

impl PdfiumSource {
    pub fn new(pdfium: Pdfium) -> Self {
        Self { pdfium }
    }
}

impl PageSource for PdfiumSource {
    fn load_pages(&self, path: &Path) -> Result<Vec<PageContent>> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| OutlineError::malformed(path, e))?;

        document
            .pages()
            .iter()
            .enumerate()
            .map(|(idx, page)| extract_page(path, idx, &page))
            .collect()
    }
}

/// A character in top-down page coordinates with its style.
struct StyledChar {
    ch: char,
    bbox: Rect,
    font_name: String,
    font_size: f32,
    bold: bool,
}

fn extract_page(path: &Path, page_idx: usize, page: &PdfPage) -> Result<PageContent> {
    let text_page = page.text().map_err(|e| {
        OutlineError::malformed(path, format!("page {}: {e}", page_idx + 1))
    })?;
    let height = page.height().value;

    let chars: Vec<StyledChar> = text_page
        .chars()
        .iter()
        .filter_map(|ch| convert_text_char(&ch, height))
        .collect();

    let mut blocks = Vec::new();
    let fragments = group_chars_into_fragments(&chars);
    if !fragments.is_empty() {
        blocks.push(ContentBlock::Text(fragments));
    }
    let images = page
        .objects()
        .iter()
        .filter(|object| matches!(object, PdfPageObject::Image(_)))
        .count();
    blocks.extend(std::iter::repeat_n(ContentBlock::Image, images));

    debug!(
        "page {}: {} chars, {} image object(s)",
        page_idx + 1,
        chars.len(),
        images
    );

    Ok(PageContent {
        index: page_idx,
        width: page.width().value,
        height,
        blocks,
    })
}

fn convert_text_char(ch: &PdfPageTextChar, page_height: f32) -> Option<StyledChar> {
    let unicode = ch.unicode_char()?;
    if unicode.is_control() && unicode != ' ' {
        return None;
    }

    // Skip zero-size font characters (watermarks, hidden text)
    let font_size = ch.scaled_font_size().value;
    if font_size < 0.5 {
        return None;
    }

    let rect = ch.loose_bounds().or_else(|_| ch.tight_bounds()).ok()?;
    let bbox = Rect::new(
        rect.left().value,
        page_height - rect.top().value,
        rect.right().value,
        page_height - rect.bottom().value,
    );

    Some(StyledChar {
        ch: unicode,
        bbox,
        font_name: ch.font_name(),
        font_size,
        bold: is_bold_weight(ch),
    })
}

fn is_bold_weight(ch: &PdfPageTextChar) -> bool {
    let weight_is_bold = match ch.font_weight() {
        Some(PdfFontWeight::Weight600)
        | Some(PdfFontWeight::Weight700Bold)
        | Some(PdfFontWeight::Weight800)
        | Some(PdfFontWeight::Weight900) => true,
        Some(PdfFontWeight::Custom(weight)) => weight >= 600,
        _ => false,
    };
    weight_is_bold || ch.font_is_bold_reenforced()
}

struct SpanAccum {
    text: String,
    bbox: Rect,
    font_name: String,
    font_size: f32,
    bold: bool,
}

impl SpanAccum {
    fn start(ch: &StyledChar) -> Self {
        Self {
            text: ch.ch.to_string(),
            bbox: ch.bbox,
            font_name: ch.font_name.clone(),
            font_size: ch.font_size,
            bold: ch.bold,
        }
    }

    fn same_style(&self, ch: &StyledChar) -> bool {
        self.bold == ch.bold && self.font_size == ch.font_size && self.font_name == ch.font_name
    }

    fn extend(&mut self, ch: &StyledChar) {
        self.text.push(ch.ch);
        self.bbox = self.bbox.union(&ch.bbox);
    }

    fn into_span(self) -> Span {
        Span {
            text: self.text,
            bbox: self.bbox,
            font_name: self.font_name,
            font_size: self.font_size,
            bold: self.bold,
        }
    }
}

/// Group the character stream into renderer lines of style runs.
///
/// A new line starts when the baseline jumps by more than half a font size
/// or the stream moves back to the left, as after a wrap.
fn group_chars_into_fragments(chars: &[StyledChar]) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut spans: Vec<Span> = Vec::new();
    let mut acc: Option<SpanAccum> = None;
    let mut line_bottom = 0.0;
    let mut prev_right = f32::MIN;

    for ch in chars {
        let breaks_line = acc.is_some()
            && ((ch.bbox.bottom - line_bottom).abs() > ch.font_size * 0.5
                || ch.bbox.left < prev_right - ch.font_size);

        if breaks_line {
            spans.extend(acc.take().map(SpanAccum::into_span));
            fragments.extend(Fragment::from_spans(std::mem::take(&mut spans)));
        }
        match acc.as_mut() {
            Some(run) if run.same_style(ch) => run.extend(ch),
            _ => {
                spans.extend(acc.take().map(SpanAccum::into_span));
                acc = Some(SpanAccum::start(ch));
            }
        }
        if !ch.ch.is_whitespace() || breaks_line {
            line_bottom = ch.bbox.bottom;
        }
        prev_right = ch.bbox.right;
    }
    spans.extend(acc.map(SpanAccum::into_span));
    fragments.extend(Fragment::from_spans(spans));
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled(text: &str, left: f32, top: f32, size: f32, font: &str, bold: bool) -> Vec<StyledChar> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| {
                let x = left + i as f32 * size * 0.5;
                StyledChar {
                    ch,
                    bbox: Rect::new(x, top, x + size * 0.5, top + size),
                    font_name: font.into(),
                    font_size: size,
                    bold,
                }
            })
            .collect()
    }

    #[test]
    fn style_runs_become_spans_of_one_line() {
        let mut chars = styled("Chapter ", 72.0, 100.0, 12.0, "Arial", false);
        chars.extend(styled("3", 120.0, 100.0, 12.0, "Arial", true));
        let fragments = group_chars_into_fragments(&chars);
        assert_eq!(fragments.len(), 1);
        let texts: Vec<&str> = fragments[0].spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["Chapter ", "3"]);
        assert!(fragments[0].spans[1].bold);
        assert_eq!(fragments[0].bbox.left, 72.0);
    }

    #[test]
    fn baseline_jump_and_wrap_start_new_lines() {
        let mut chars = styled("first line", 72.0, 100.0, 12.0, "Arial", false);
        chars.extend(styled("second", 72.0, 116.0, 12.0, "Arial", false));
        chars.extend(styled("raised", 400.0, 116.0, 12.0, "Arial", false));
        chars.extend(styled("wrapped", 72.0, 116.0, 12.0, "Arial", false));
        let fragments = group_chars_into_fragments(&chars);
        let texts: Vec<String> = fragments
            .iter()
            .map(|f| f.spans.iter().map(|s| s.text.as_str()).collect())
            .collect();
        assert_eq!(texts, ["first line", "secondraised", "wrapped"]);
    }

    #[test]
    fn no_chars_no_fragments() {
        assert!(group_chars_into_fragments(&[]).is_empty());
    }
}
