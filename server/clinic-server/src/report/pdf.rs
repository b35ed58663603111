//! A4 rendering of a [`VisitReport`] with printpdf

use printpdf::image_crate::{self, GenericImageView};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{ReportError, ReportRenderer, VisitReport, TITLE};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const CONTENT_RIGHT: f32 = PAGE_WIDTH - MARGIN;
const LOGO_WIDTH: f32 = 24.0;
const HEADER_TEXT_X: f32 = 45.0;
const LABEL_WIDTH: f32 = 40.0;
/// Distance of the signature block from the bottom edge
const SIGNATURE_OFFSET: f32 = 35.0;
const PT_TO_MM: f32 = 0.3528;
/// Average glyph advance as a fraction of the font size
const AVG_GLYPH_EM: f32 = 0.5;

const REGULAR_FONT: &str = "DejaVuSans.ttf";
const BOLD_FONT: &str = "DejaVuSans-Bold.ttf";

/// Report renderer producing PDF bytes.
///
/// DejaVu fonts are loaded from `font_dir` when both files exist so that
/// Croatian diacritics print correctly; otherwise built-in Helvetica is used.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    font_dir: PathBuf,
}

impl PdfRenderer {
    pub fn new(font_dir: impl Into<PathBuf>) -> Self {
        Self {
            font_dir: font_dir.into(),
        }
    }

    fn load_fonts(&self, doc: &PdfDocumentReference) -> Result<(IndirectFontRef, IndirectFontRef), ReportError> {
        let regular = self.font_dir.join(REGULAR_FONT);
        let bold = self.font_dir.join(BOLD_FONT);
        let font_err = |reason: String| ReportError::Font {
            dir: self.font_dir.display().to_string(),
            reason,
        };

        if regular.is_file() && bold.is_file() {
            let load = |path: &Path| -> Result<IndirectFontRef, ReportError> {
                let file = File::open(path).map_err(|e| font_err(e.to_string()))?;
                doc.add_external_font(file).map_err(|e| font_err(e.to_string()))
            };
            return Ok((load(&regular)?, load(&bold)?));
        }

        debug!(dir = %self.font_dir.display(), "DejaVu fonts not found, using built-in Helvetica");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| font_err(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| font_err(e.to_string()))?;
        Ok((regular, bold))
    }
}

impl ReportRenderer for PdfRenderer {
    fn render(&self, report: &VisitReport) -> Result<Vec<u8>, ReportError> {
        let (doc, page, layer) =
            PdfDocument::new(TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let (regular, bold) = self.load_fonts(&doc)?;
        let layer = doc.get_page(page).get_layer(layer);

        let mut writer = PageWriter {
            doc: &doc,
            layer,
            regular,
            bold,
            y: MARGIN,
        };
        writer.letterhead(report);
        writer.title();
        writer.patient_block(report);
        writer.visits(report);
        writer.signature(report);

        doc.save_to_bytes()
            .map_err(|e| ReportError::Render(e.to_string()))
    }
}

/// Cursor over the current page; `y` is measured from the top edge
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PageWriter<'_> {
    fn text(&self, x: f32, size: f32, bold: bool, value: &str) {
        let font = if bold { &self.bold } else { &self.regular };
        // baseline sits roughly one cap height below the line top
        let baseline = self.y + size * PT_TO_MM;
        self.layer
            .use_text(value, size, Mm(x), Mm(PAGE_HEIGHT - baseline), font);
    }

    fn rule(&self) {
        let y = Mm(PAGE_HEIGHT - self.y);
        self.layer.set_outline_thickness(0.6);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), y), false),
                (Point::new(Mm(CONTENT_RIGHT), y), false),
            ],
            is_closed: false,
        });
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = MARGIN;
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT - MARGIN {
            self.new_page();
        }
    }

    /// Wrapped paragraph at the left margin
    fn paragraph(&mut self, size: f32, bold: bool, value: &str) {
        let line_height = 5.0;
        for line in wrap(value, CONTENT_RIGHT - MARGIN, size) {
            self.ensure_room(line_height);
            self.text(MARGIN, size, bold, &line);
            self.y += line_height;
        }
    }

    fn letterhead(&mut self, report: &VisitReport) {
        let top = self.y;
        if let Some(logo) = report.letterhead.as_ref().and_then(|h| h.logo.as_deref()) {
            self.logo(logo, top);
        }

        let printed = format!("Datum ispisa: {}", report.printed_on);
        self.text(PAGE_WIDTH - 70.0, 10.0, false, &printed);

        let Some(head) = &report.letterhead else {
            self.y = top + 10.0;
            return;
        };
        self.text(HEADER_TEXT_X, 12.0, true, &head.practice_name);
        self.y += 6.0;
        for line in [&head.role_line, &head.address, &head.phone, &head.email, &head.website] {
            if !line.is_empty() {
                self.text(HEADER_TEXT_X, 10.0, false, line);
                self.y += 5.0;
            }
        }
        // keep the rule below the logo
        self.y = (self.y + 6.0).max(top + LOGO_WIDTH + 2.0);
    }

    fn logo(&self, path: &Path, top: f32) {
        let img = match image_crate::open(path) {
            Ok(img) => img,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable logo");
                return;
            }
        };
        let (width_px, height_px) = img.dimensions();
        if width_px == 0 || height_px == 0 {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (width_px as f32, height_px as f32);
        let dpi = w * 25.4 / LOGO_WIDTH;
        let height_mm = LOGO_WIDTH * h / w;
        Image::from_dynamic_image(&img).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(PAGE_HEIGHT - top - height_mm)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
    }

    fn title(&mut self) {
        self.rule();
        self.y += 6.0;
        let size = 12.0;
        let x = (PAGE_WIDTH - text_width(TITLE, size)) / 2.0;
        self.text(x.max(MARGIN), size, true, TITLE);
        self.y += 12.0;
    }

    fn patient_block(&mut self, report: &VisitReport) {
        let patient = &report.patient;
        let rows = [
            ("Pacijent:", Some(&patient.name)),
            ("Datum rođenja:", patient.date_of_birth.as_ref()),
            ("Telefon:", patient.phone.as_ref()),
            ("Adresa:", patient.address.as_ref()),
        ];
        for (label, value) in rows {
            let Some(value) = value else { continue };
            self.text(MARGIN, 10.0, true, label);
            self.text(MARGIN + LABEL_WIDTH, 10.0, false, value);
            self.y += 5.0;
        }
        self.y += 3.0;
        self.rule();
        self.y += 6.0;
    }

    fn visits(&mut self, report: &VisitReport) {
        for visit in &report.visits {
            self.paragraph(11.0, true, &visit.heading);
            for (label, value) in &visit.fields {
                self.paragraph(10.0, true, label);
                self.paragraph(10.0, false, value);
                self.y += 2.0;
            }
            self.y += 2.0;
        }
    }

    fn signature(&mut self, report: &VisitReport) {
        let Some(name) = &report.signature else {
            return;
        };
        let top = PAGE_HEIGHT - SIGNATURE_OFFSET;
        if self.y > top {
            self.new_page();
        }
        self.y = top;
        self.text(MARGIN, 9.0, true, "Fizioterapeut:");
        self.y += 5.0;
        self.text(MARGIN, 9.0, false, &format!("bacc.physioth {name}"));
    }
}

#[allow(clippy::cast_precision_loss)]
fn text_width(value: &str, size: f32) -> f32 {
    value.chars().count() as f32 * size * PT_TO_MM * AVG_GLYPH_EM
}

/// Greedy word wrap to an approximate line width; explicit newlines are kept.
/// Words wider than a whole line are cut at the line width.
fn wrap(value: &str, width: f32, size: f32) -> Vec<String> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max_chars = ((width / (size * PT_TO_MM * AVG_GLYPH_EM)) as usize).max(1);
    let mut lines = Vec::new();
    for raw in value.lines() {
        let mut current = String::new();
        for word in raw.split_whitespace() {
            let mut word = word;
            while word.chars().count() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let cut = word
                    .char_indices()
                    .nth(max_chars)
                    .map_or(word.len(), |(i, _)| i);
                lines.push(word[..cut].to_string());
                word = &word[cut..];
            }
            let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}
