//! Token extraction: positioned words and rendered bitmaps from a document.
//!
//! The parser core never touches pdfium directly — it consumes the
//! [`DocumentSource`] trait, so tests drive the full pipeline from synthetic
//! token lists and bitmaps. [`PdfiumSource`] is the production
//! implementation: it merges pdfium's per-character boxes into word tokens
//! under the template's x/y tolerances and caches rendered bitmaps per page,
//! since both separator detection and duty-image cropping need the same
//! render.
//!
//! All coordinates leaving this module are top-down page points (y grows
//! downward); pdfium's bottom-up axis is flipped at the boundary so the
//! geometry catalog constants read like the printed page.

use crate::config::{MergeTolerances, TemplateConfig};
use crate::error::TurnusError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Extracted text with its bounding box and page index. Immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken {
    pub text: String,
    pub page: usize,
    pub left: f32,
    pub right: f32,
    /// Top edge, top-down coordinates (top < bottom).
    pub top: f32,
    pub bottom: f32,
}

impl PositionedToken {
    pub fn cx(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn cy(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// The PDF-decode collaborator: positioned tokens plus bitmap rendering.
pub trait DocumentSource {
    fn page_count(&self) -> usize;

    /// (width, height) in page points.
    fn page_size(&self, page: usize) -> Result<(f32, f32), TurnusError>;

    /// Word tokens for one page, in document order.
    fn page_tokens(&self, page: usize) -> Result<Vec<PositionedToken>, TurnusError>;

    /// Rendered page bitmap at the source's zoom factor. Implementations
    /// cache this per page within one run.
    fn render_page(&self, page: usize) -> Result<DynamicImage, TurnusError>;
}

// ── Pdfium implementation ────────────────────────────────────────────────

/// Production [`DocumentSource`] backed by pdfium-render.
pub struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
    merge: MergeTolerances,
    zoom: f32,
    render_cache: RefCell<HashMap<usize, DynamicImage>>,
}

impl<'a> PdfiumSource<'a> {
    /// Open a PDF file with the template's merge tolerances and zoom.
    pub fn open(
        pdfium: &'a Pdfium,
        path: &Path,
        config: &TemplateConfig,
    ) -> Result<Self, TurnusError> {
        let document =
            pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| TurnusError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: format!("{e:?}"),
                })?;
        debug!("PDF loaded: {} pages", document.pages().len());
        Ok(Self {
            document,
            merge: config.merge,
            zoom: config.render_zoom,
            render_cache: RefCell::new(HashMap::new()),
        })
    }

    fn page(&self, page: usize) -> Result<PdfPage<'_>, TurnusError> {
        let total = self.page_count();
        if page >= total {
            return Err(TurnusError::PageOutOfRange { page, total });
        }
        self.document
            .pages()
            .get(page as u16)
            .map_err(|e| TurnusError::Internal(format!("page {page}: {e:?}")))
    }
}

impl DocumentSource for PdfiumSource<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, page: usize) -> Result<(f32, f32), TurnusError> {
        let p = self.page(page)?;
        Ok((p.width().value, p.height().value))
    }

    fn page_tokens(&self, page: usize) -> Result<Vec<PositionedToken>, TurnusError> {
        let p = self.page(page)?;
        let page_h = p.height().value;
        let text = p.text().map_err(|e| TurnusError::TextExtractionFailed {
            page,
            detail: format!("{e:?}"),
        })?;

        let mut boxes = Vec::new();
        for ch in text.chars().iter() {
            let Some(c) = ch.unicode_char() else { continue };
            let rect = ch
                .tight_bounds()
                .or_else(|_| ch.loose_bounds())
                .unwrap_or(PdfRect::ZERO);
            boxes.push(CharBox {
                c,
                left: rect.left().value,
                right: rect.right().value,
                // Flip to top-down: pdfium's top is farthest from y=0.
                top: page_h - rect.top().value,
                bottom: page_h - rect.bottom().value,
            });
        }

        let tokens = merge_chars(&boxes, page, self.merge);
        debug!("page {page}: {} chars → {} tokens", boxes.len(), tokens.len());
        Ok(tokens)
    }

    fn render_page(&self, page: usize) -> Result<DynamicImage, TurnusError> {
        if let Some(img) = self.render_cache.borrow().get(&page) {
            return Ok(img.clone());
        }
        let p = self.page(page)?;
        let target_width = (p.width().value * self.zoom) as i32;
        let render_config = PdfRenderConfig::new().set_target_width(target_width);
        let bitmap =
            p.render_with_config(&render_config)
                .map_err(|e| TurnusError::RasterisationFailed {
                    page,
                    detail: format!("{e:?}"),
                })?;
        let image = bitmap.as_image();
        debug!("rendered page {page} → {}x{} px", image.width(), image.height());
        self.render_cache.borrow_mut().insert(page, image.clone());
        Ok(image)
    }
}

// ── Character-to-word merging ────────────────────────────────────────────

/// One pdfium character with flipped (top-down) bounds.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CharBox {
    pub c: char,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl CharBox {
    fn cy(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// Merge characters into word tokens: whitespace always splits; otherwise a
/// character joins the current token when its horizontal gap and vertical
/// center offset stay within the tolerances.
pub(crate) fn merge_chars(
    chars: &[CharBox],
    page: usize,
    tol: MergeTolerances,
) -> Vec<PositionedToken> {
    let mut tokens = Vec::new();
    let mut cur: Option<PositionedToken> = None;

    for ch in chars {
        if ch.c.is_whitespace() {
            if let Some(t) = cur.take() {
                tokens.push(t);
            }
            continue;
        }

        match cur.as_mut() {
            Some(t)
                if ch.left - t.right <= tol.x_tol
                    && (ch.cy() - (t.top + t.bottom) / 2.0).abs() <= tol.y_tol =>
            {
                t.text.push(ch.c);
                t.right = t.right.max(ch.right);
                t.top = t.top.min(ch.top);
                t.bottom = t.bottom.max(ch.bottom);
            }
            _ => {
                if let Some(t) = cur.take() {
                    tokens.push(t);
                }
                cur = Some(PositionedToken {
                    text: ch.c.to_string(),
                    page,
                    left: ch.left,
                    right: ch.right,
                    top: ch.top,
                    bottom: ch.bottom,
                });
            }
        }
    }
    if let Some(t) = cur {
        tokens.push(t);
    }
    tokens
}
