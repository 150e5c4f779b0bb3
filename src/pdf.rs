//! PDF assembly. Replays a composed sheet onto physical A4 pages: the
//! sheet is scaled to the page width and sliced vertically, one page per
//! 297mm band, so an over-long document paginates without reflowing.

use std::fs;
use std::io::{BufWriter, Cursor};
use std::path::{Path, PathBuf};

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocumentReference,
    PdfLayerReference, Point, Polygon, Rect,
};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::layout::{self, DrawOp, FontSel, Sheet};
use crate::model::{InvoiceData, InvoiceTotals};
use crate::template::{accent_color, Color, FontFamily, TemplateId};
use crate::text::TextMeasure;

pub const PAGE_W_MM: f32 = 210.0;
pub const PAGE_H_MM: f32 = 297.0;

const MM_TO_PT: f32 = 72.0 / 25.4;
const IMAGE_DPI: f32 = 300.0;

/// Where glyphs come from. The builtin PDF fonts carry no CJK glyphs, so
/// deployments should point this at a Japanese TTF; the builtin set keeps
/// the pipeline running without one.
#[derive(Debug, Clone, Default)]
pub enum FontSource {
    #[default]
    Builtin,
    File(PathBuf),
}

#[derive(Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

#[derive(Debug)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub pages: usize,
    pub bytes: usize,
}

/// Render a document to PDF bytes.
pub fn render_document(
    data: &InvoiceData,
    totals: &InvoiceTotals,
    template: TemplateId,
    accent_hex: &str,
    source: &FontSource,
) -> Result<RenderedPdf> {
    let font_bytes = match source {
        FontSource::File(path) => Some(
            fs::read(path).map_err(|e| Error::Font(format!("{}: {}", path.display(), e)))?,
        ),
        FontSource::Builtin => None,
    };
    let measure = match font_bytes.as_deref() {
        Some(bytes) => TextMeasure::Face(
            ttf_parser::Face::parse(bytes, 0)
                .map_err(|e| Error::Font(format!("unusable font file: {e}")))?,
        ),
        None => TextMeasure::Estimate,
    };

    let sheet = if template.is_receipt() {
        layout::receipt::compose_receipt(data, totals, &measure)
    } else {
        layout::standard::compose_a4(data, totals, template, accent_color(accent_hex), &measure)
    };
    debug!(
        template = %template,
        width_mm = sheet.width_mm,
        height_mm = sheet.height_mm,
        ops = sheet.ops.len(),
        "composed sheet"
    );

    assemble(&sheet, &data.title, font_bytes.as_deref())
}

/// Render and write `{title}_{number}.pdf` under `out_dir`. The file is
/// written to a temporary name first and renamed into place, so a failed
/// export never leaves a partial document behind.
pub fn export_document(
    data: &InvoiceData,
    totals: &InvoiceTotals,
    template: TemplateId,
    accent_hex: &str,
    source: &FontSource,
    out_dir: &Path,
) -> Result<ExportOutcome> {
    let rendered = render_document(data, totals, template, accent_hex, source)?;
    let filename = document_filename(data);
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(&filename);
    let tmp = out_dir.join(format!("{filename}.part"));
    fs::write(&tmp, &rendered.bytes)?;
    fs::rename(&tmp, &path)?;
    info!(
        path = %path.display(),
        pages = rendered.pages,
        size = rendered.bytes.len(),
        "exported pdf"
    );
    Ok(ExportOutcome {
        path,
        pages: rendered.pages,
        bytes: rendered.bytes.len(),
    })
}

/// Download name for a document: `{title}_{number}.pdf` with characters a
/// filesystem could reject replaced by underscores. Japanese titles pass
/// through untouched.
pub fn document_filename(data: &InvoiceData) -> String {
    let raw = format!("{}_{}", data.title, data.invoice_number);
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let ok = ch.is_alphanumeric() || ch == '-' || ch == '_' || ch == '.' || ch == ' ';
        out.push(if ok { ch } else { '_' });
    }
    let trimmed = out.trim();
    if trimmed.is_empty() {
        "invoice.pdf".to_string()
    } else {
        format!("{trimmed}.pdf")
    }
}

/// Pages needed for a sheet already scaled to page width.
pub fn page_count(scaled_height_mm: f32) -> usize {
    if scaled_height_mm <= PAGE_H_MM {
        1
    } else {
        (scaled_height_mm / PAGE_H_MM).ceil() as usize
    }
}

fn assemble(sheet: &Sheet, title: &str, font_bytes: Option<&[u8]>) -> Result<RenderedPdf> {
    let ratio = PAGE_W_MM / sheet.width_mm;
    let pages = page_count(sheet.height_mm * ratio);

    let (doc, page1, layer1) =
        printpdf::PdfDocument::new(title, Mm(PAGE_W_MM), Mm(PAGE_H_MM), "Layer 1");
    let fonts = FontSet::load(&doc, font_bytes)?;

    for page in 0..pages {
        let layer = if page == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (pi, li) = doc.add_page(Mm(PAGE_W_MM), Mm(PAGE_H_MM), "Layer 1");
            doc.get_page(pi).get_layer(li)
        };
        replay(&layer, &fonts, sheet, ratio, page as f32 * PAGE_H_MM);
    }

    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Pdf(e.to_string()))?;
    Ok(RenderedPdf { bytes, pages })
}

struct FontSet {
    sans: IndirectFontRef,
    sans_bold: IndirectFontRef,
    serif: IndirectFontRef,
    serif_bold: IndirectFontRef,
    mono: IndirectFontRef,
    mono_bold: IndirectFontRef,
}

impl FontSet {
    fn load(doc: &PdfDocumentReference, bytes: Option<&[u8]>) -> Result<FontSet> {
        match bytes {
            Some(b) => {
                // A single embedded face serves every family; bold runs
                // reuse it rather than requiring a second file.
                let font = doc.add_external_font(Cursor::new(b))?;
                Ok(FontSet {
                    sans: font.clone(),
                    sans_bold: font.clone(),
                    serif: font.clone(),
                    serif_bold: font.clone(),
                    mono: font.clone(),
                    mono_bold: font,
                })
            }
            None => Ok(FontSet {
                sans: doc.add_builtin_font(BuiltinFont::Helvetica)?,
                sans_bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
                serif: doc.add_builtin_font(BuiltinFont::TimesRoman)?,
                serif_bold: doc.add_builtin_font(BuiltinFont::TimesBold)?,
                mono: doc.add_builtin_font(BuiltinFont::Courier)?,
                mono_bold: doc.add_builtin_font(BuiltinFont::CourierBold)?,
            }),
        }
    }

    fn select(&self, sel: FontSel) -> &IndirectFontRef {
        match (sel.family, sel.bold) {
            (FontFamily::Sans, false) => &self.sans,
            (FontFamily::Sans, true) => &self.sans_bold,
            (FontFamily::Serif, false) => &self.serif,
            (FontFamily::Serif, true) => &self.serif_bold,
            (FontFamily::Mono, false) => &self.mono,
            (FontFamily::Mono, true) => &self.mono_bold,
        }
    }
}

fn pdf_color(c: Color) -> printpdf::Color {
    printpdf::Color::Rgb(printpdf::Rgb::new(c.r, c.g, c.b, None))
}

/// Replay the sheet onto one page. `offset_mm` is the top of this page's
/// band in scaled sheet coordinates; anything outside the band is skipped
/// up front, and the page MediaBox clips whatever straddles the edges.
fn replay(
    layer: &PdfLayerReference,
    fonts: &FontSet,
    sheet: &Sheet,
    ratio: f32,
    offset_mm: f32,
) {
    let tx = |x: f32| Mm(x * ratio);
    let ty = |y: f32| Mm(PAGE_H_MM - (y * ratio - offset_mm));

    for op in &sheet.ops {
        let (lo, hi) = op.v_extent();
        if hi * ratio - offset_mm < -0.5 || lo * ratio - offset_mm > PAGE_H_MM + 0.5 {
            continue;
        }
        match op {
            DrawOp::Text {
                text,
                size,
                x,
                y,
                font,
                color,
            } => {
                layer.set_fill_color(pdf_color(*color));
                layer.use_text(text, size * ratio, tx(*x), ty(*y), fonts.select(*font));
            }
            DrawOp::Rule {
                x1,
                y1,
                x2,
                y2,
                thickness,
                color,
            } => {
                layer.set_outline_color(pdf_color(*color));
                layer.set_outline_thickness(thickness * ratio * MM_TO_PT);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(tx(*x1), ty(*y1)), false),
                        (Point::new(tx(*x2), ty(*y2)), false),
                    ],
                    is_closed: false,
                });
            }
            DrawOp::DashedRule {
                x1,
                y,
                x2,
                thickness,
                color,
                dash_mm,
            } => {
                layer.set_outline_color(pdf_color(*color));
                layer.set_outline_thickness(thickness * ratio * MM_TO_PT);
                let mut x = *x1;
                while x < *x2 {
                    let end = (x + dash_mm).min(*x2);
                    layer.add_line(Line {
                        points: vec![
                            (Point::new(tx(x), ty(*y)), false),
                            (Point::new(tx(end), ty(*y)), false),
                        ],
                        is_closed: false,
                    });
                    x += dash_mm * 2.0;
                }
            }
            DrawOp::RectFill { x, y_top, w, h, color } => {
                layer.set_fill_color(pdf_color(*color));
                let rect = Rect::new(tx(*x), ty(y_top + h), tx(x + w), ty(*y_top))
                    .with_mode(PaintMode::Fill);
                layer.add_rect(rect);
            }
            DrawOp::RectStroke {
                x,
                y_top,
                w,
                h,
                thickness,
                color,
            } => {
                layer.set_outline_color(pdf_color(*color));
                layer.set_outline_thickness(thickness * ratio * MM_TO_PT);
                let rect = Rect::new(tx(*x), ty(y_top + h), tx(x + w), ty(*y_top))
                    .with_mode(PaintMode::Stroke);
                layer.add_rect(rect);
            }
            DrawOp::PolyFill { points, color } => {
                layer.set_fill_color(pdf_color(*color));
                let ring = points
                    .iter()
                    .map(|(x, y)| (Point::new(tx(*x), ty(*y)), false))
                    .collect();
                layer.add_polygon(Polygon {
                    rings: vec![ring],
                    mode: PaintMode::Fill,
                    winding_order: WindingOrder::NonZero,
                });
            }
            DrawOp::Image {
                image,
                x,
                y_top,
                w_mm,
                h_mm,
            } => {
                let px_w = image.width().max(1) as f32;
                let px_h = image.height().max(1) as f32;
                let natural_w_mm = px_w / IMAGE_DPI * 25.4;
                let natural_h_mm = px_h / IMAGE_DPI * 25.4;
                let pdf_image = Image::from_dynamic_image(image);
                pdf_image.add_to_layer(
                    layer.clone(),
                    ImageTransform {
                        translate_x: Some(tx(*x)),
                        translate_y: Some(ty(y_top + h_mm)),
                        rotate: None,
                        scale_x: Some(w_mm * ratio / natural_w_mm),
                        scale_y: Some(h_mm * ratio / natural_h_mm),
                        dpi: Some(IMAGE_DPI),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_invoice, LineItem, TaxRate};
    use crate::tax;

    fn sample() -> InvoiceData {
        let mut data = default_invoice();
        data.issuer.name = "山田商事株式会社".to_string();
        data.client.name = "株式会社テスト".to_string();
        data.items = vec![LineItem {
            id: "1".to_string(),
            description: "ウェブサイト制作".to_string(),
            quantity: 1.0,
            unit_price: 100000.0,
            unit: "式".to_string(),
            tax_rate: TaxRate::Standard,
        }];
        data
    }

    #[test]
    fn one_page_until_the_band_overflows() {
        assert_eq!(page_count(0.0), 1);
        assert_eq!(page_count(296.9), 1);
        assert_eq!(page_count(297.0), 1);
        assert_eq!(page_count(297.1), 2);
        assert_eq!(page_count(594.1), 3);
    }

    #[test]
    fn filename_keeps_japanese_and_drops_separators() {
        let mut data = sample();
        data.title = "御請求書".to_string();
        data.invoice_number = "INV/2025:08-001".to_string();
        assert_eq!(document_filename(&data), "御請求書_INV_2025_08-001.pdf");
    }

    #[test]
    fn blank_names_still_produce_a_filename() {
        let mut data = sample();
        data.title = "//".to_string();
        data.invoice_number = String::new();
        assert_eq!(document_filename(&data), "___.pdf");
    }

    #[test]
    fn renders_single_page_pdf() {
        let data = sample();
        let totals = tax::aggregate(&data.items);
        let pdf = render_document(
            &data,
            &totals,
            TemplateId::Modern,
            "#4f46e5",
            &FontSource::Builtin,
        )
        .unwrap();
        assert_eq!(pdf.pages, 1);
        assert!(pdf.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_invoices_paginate() {
        let mut data = sample();
        let item = data.items[0].clone();
        data.items = (0..60)
            .map(|i| LineItem {
                id: i.to_string(),
                ..item.clone()
            })
            .collect();
        let totals = tax::aggregate(&data.items);
        let pdf = render_document(
            &data,
            &totals,
            TemplateId::Modern,
            "#4f46e5",
            &FontSource::Builtin,
        )
        .unwrap();
        assert!(pdf.pages >= 2);
        assert!(pdf.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn receipt_scales_to_the_page() {
        let data = sample();
        let totals = tax::aggregate(&data.items);
        let pdf = render_document(
            &data,
            &totals,
            TemplateId::Receipt,
            "#4f46e5",
            &FontSource::Builtin,
        )
        .unwrap();
        assert!(pdf.pages >= 1);
        assert!(pdf.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn missing_font_file_is_reported() {
        let data = sample();
        let totals = tax::aggregate(&data.items);
        let err = render_document(
            &data,
            &totals,
            TemplateId::Modern,
            "#4f46e5",
            &FontSource::File(PathBuf::from("/nonexistent/font.ttf")),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Font(_)));
    }
}
