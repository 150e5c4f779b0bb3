//! Device-independent document composition. The engines lay text and
//! shapes onto a continuous sheet of fixed width and unbounded height,
//! measured in millimetres from the top-left corner; the exporter replays
//! the recorded operations onto physical pages.

pub mod receipt;
pub mod stamp;
pub mod standard;

use base64::Engine as _;
use printpdf::image_crate::DynamicImage;

use crate::template::{Color, FontFamily};

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;
pub const RECEIPT_WIDTH_MM: f32 = 80.0;

/// Font request for a text run; the exporter maps it to a concrete font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSel {
    pub family: FontFamily,
    pub bold: bool,
}

impl FontSel {
    pub fn regular(family: FontFamily) -> Self {
        FontSel { family, bold: false }
    }

    pub fn bold(family: FontFamily) -> Self {
        FontSel { family, bold: true }
    }
}

/// One recorded draw operation. Text `y` is the baseline; boxes hang down
/// from `y_top`.
#[derive(Debug, Clone)]
pub enum DrawOp {
    Text {
        text: String,
        size: f32,
        x: f32,
        y: f32,
        font: FontSel,
        color: Color,
    },
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
        color: Color,
    },
    DashedRule {
        x1: f32,
        y: f32,
        x2: f32,
        thickness: f32,
        color: Color,
        dash_mm: f32,
    },
    RectFill {
        x: f32,
        y_top: f32,
        w: f32,
        h: f32,
        color: Color,
    },
    RectStroke {
        x: f32,
        y_top: f32,
        w: f32,
        h: f32,
        thickness: f32,
        color: Color,
    },
    PolyFill {
        points: Vec<(f32, f32)>,
        color: Color,
    },
    Image {
        image: DynamicImage,
        x: f32,
        y_top: f32,
        w_mm: f32,
        h_mm: f32,
    },
}

impl DrawOp {
    /// Conservative vertical extent, used to skip operations that cannot
    /// touch a page.
    pub fn v_extent(&self) -> (f32, f32) {
        match self {
            DrawOp::Text { size, y, .. } => {
                let em = size * crate::text::PT_TO_MM;
                (y - em, y + em * 0.35)
            }
            DrawOp::Rule { y1, y2, thickness, .. } => {
                (y1.min(*y2) - thickness, y1.max(*y2) + thickness)
            }
            DrawOp::DashedRule { y, thickness, .. } => (y - thickness, y + thickness),
            DrawOp::RectFill { y_top, h, .. } => (*y_top, y_top + h),
            DrawOp::RectStroke { y_top, h, thickness, .. } => {
                (y_top - thickness, y_top + h + thickness)
            }
            DrawOp::PolyFill { points, .. } => {
                let mut lo = f32::INFINITY;
                let mut hi = f32::NEG_INFINITY;
                for (_, y) in points {
                    lo = lo.min(*y);
                    hi = hi.max(*y);
                }
                (lo, hi)
            }
            DrawOp::Image { y_top, h_mm, .. } => (*y_top, y_top + h_mm),
        }
    }
}

/// A composed document: fixed width, height set by the engine when it
/// finishes, plus the ordered operations.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub width_mm: f32,
    pub height_mm: f32,
    pub ops: Vec<DrawOp>,
}

impl Sheet {
    pub fn new(width_mm: f32) -> Self {
        Sheet {
            width_mm,
            height_mm: 0.0,
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn text(&mut self, text: impl Into<String>, size: f32, x: f32, y: f32, font: FontSel, color: Color) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.ops.push(DrawOp::Text {
            text,
            size,
            x,
            y,
            font,
            color,
        });
    }

    pub fn hrule(&mut self, x1: f32, x2: f32, y: f32, thickness: f32, color: Color) {
        self.ops.push(DrawOp::Rule {
            x1,
            y1: y,
            x2,
            y2: y,
            thickness,
            color,
        });
    }

    pub fn vrule(&mut self, x: f32, y1: f32, y2: f32, thickness: f32, color: Color) {
        self.ops.push(DrawOp::Rule {
            x1: x,
            y1,
            x2: x,
            y2,
            thickness,
            color,
        });
    }

    pub fn rect_fill(&mut self, x: f32, y_top: f32, w: f32, h: f32, color: Color) {
        self.ops.push(DrawOp::RectFill { x, y_top, w, h, color });
    }

    pub fn rect_stroke(&mut self, x: f32, y_top: f32, w: f32, h: f32, thickness: f32, color: Color) {
        self.ops.push(DrawOp::RectStroke {
            x,
            y_top,
            w,
            h,
            thickness,
            color,
        });
    }
}

/// Decode a `data:image/*;base64,` URL the way uploads are stored. Returns
/// None for anything that is not a well-formed raster data URL; callers
/// skip the image rather than failing the document.
pub fn decode_data_url_image(url: &str) -> Option<DynamicImage> {
    let s = url.trim();
    if s.is_empty() {
        return None;
    }
    let lower = s.to_ascii_lowercase();
    if !lower.starts_with("data:") {
        return None;
    }
    let comma = s.find(',')?;
    let (meta, data) = s.split_at(comma);
    if !meta.to_ascii_lowercase().contains(";base64") {
        return None;
    }
    let bytes = base64::engine::general_purpose::STANDARD.decode(&data[1..]).ok()?;
    printpdf::image_crate::load_from_memory(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::palette;

    #[test]
    fn text_helper_drops_empty_runs() {
        let mut sheet = Sheet::new(A4_WIDTH_MM);
        sheet.text("", 10.0, 0.0, 10.0, FontSel::regular(FontFamily::Sans), palette::BLACK);
        assert!(sheet.ops.is_empty());
        sheet.text("x", 10.0, 0.0, 10.0, FontSel::regular(FontFamily::Sans), palette::BLACK);
        assert_eq!(sheet.ops.len(), 1);
    }

    #[test]
    fn rect_extent_spans_its_height() {
        let op = DrawOp::RectFill {
            x: 0.0,
            y_top: 100.0,
            w: 10.0,
            h: 25.0,
            color: palette::BLACK,
        };
        assert_eq!(op.v_extent(), (100.0, 125.0));
    }

    #[test]
    fn non_data_urls_are_rejected() {
        assert!(decode_data_url_image("https://example.com/logo.png").is_none());
        assert!(decode_data_url_image("data:image/png,plainbody").is_none());
        assert!(decode_data_url_image("").is_none());
        assert!(decode_data_url_image("data:image/png;base64,!!!").is_none());
    }
}
