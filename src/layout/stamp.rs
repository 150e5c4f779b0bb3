//! Placeholder seal synthesis. When stamping is enabled and no seal image
//! was uploaded, a red square seal is drawn from the issuer name. The glyph
//! arrangement is a fixed table keyed on character count; traditional seal
//! order puts the reading top-right first for the 2×2 grid.

use crate::template::{palette, FontFamily};
use crate::text::{TextMeasure, PT_TO_MM};

use super::{FontSel, Sheet};

/// Draw a synthesized seal into the `size_mm` square at (`x`, `y_top`).
/// An empty name falls back to the single glyph 印.
pub fn draw_seal(sheet: &mut Sheet, measure: &TextMeasure<'_>, name: &str, x: f32, y_top: f32, size_mm: f32) {
    let text: String = name.chars().take(4).collect();
    let text = if text.is_empty() { "印".to_string() } else { text };
    draw_seal_text(sheet, measure, &text, x, y_top, size_mm);
}

/// Seal drawing for arbitrary text, including the 5+ condensed row used
/// when callers do not cap the input.
pub fn draw_seal_text(
    sheet: &mut Sheet,
    measure: &TextMeasure<'_>,
    text: &str,
    x: f32,
    y_top: f32,
    size_mm: f32,
) {
    let font = FontSel::bold(FontFamily::Serif);
    let red = palette::VERMILION;

    // Double border: heavy outer frame, hairline inner frame.
    sheet.rect_stroke(x, y_top, size_mm, size_mm, 0.45, red);
    let inset = size_mm * 0.06;
    sheet.rect_stroke(
        x + inset,
        y_top + inset,
        size_mm - 2.0 * inset,
        size_mm - 2.0 * inset,
        0.15,
        red,
    );

    let chars: Vec<char> = text.chars().collect();
    let cx = x + size_mm / 2.0;
    let cy = y_top + size_mm / 2.0;

    let put = |sheet: &mut Sheet, ch: &str, fs_mm: f32, center_x: f32, center_y: f32| {
        let size_pt = fs_mm / PT_TO_MM;
        let w = measure.width_mm(ch, size_pt);
        sheet.text(ch, size_pt, center_x - w / 2.0, center_y + fs_mm * 0.35, font, red);
    };

    match chars.len() {
        0 => {}
        1 => {
            let fs = size_mm * 0.60;
            put(sheet, &chars[0].to_string(), fs, cx, cy);
        }
        2 => {
            let fs = size_mm * 0.45;
            let half_gap = fs * 0.45;
            put(sheet, &chars[0].to_string(), fs, cx, cy - half_gap);
            put(sheet, &chars[1].to_string(), fs, cx, cy + half_gap);
        }
        3 => {
            let fs = size_mm * 0.33;
            let step = fs * 0.85;
            put(sheet, &chars[0].to_string(), fs, cx, cy - step);
            put(sheet, &chars[1].to_string(), fs, cx, cy);
            put(sheet, &chars[2].to_string(), fs, cx, cy + step);
        }
        4 => {
            let fs = size_mm * 0.35;
            let off = fs * 0.55;
            // Reading order: top-right, bottom-right, top-left, bottom-left.
            put(sheet, &chars[0].to_string(), fs, cx + off, cy - off);
            put(sheet, &chars[1].to_string(), fs, cx + off, cy + off);
            put(sheet, &chars[2].to_string(), fs, cx - off, cy - off);
            put(sheet, &chars[3].to_string(), fs, cx - off, cy + off);
        }
        n => {
            let fs = (size_mm / n as f32) * 1.4;
            let size_pt = fs / PT_TO_MM;
            let joined: String = chars.iter().collect();
            let w = measure.width_mm(&joined, size_pt);
            sheet.text(joined, size_pt, cx - w / 2.0, cy + fs * 0.35, font, red);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{A4_WIDTH_MM, DrawOp};

    fn seal_ops(text: &str) -> Vec<DrawOp> {
        let mut sheet = Sheet::new(A4_WIDTH_MM);
        let measure = TextMeasure::Estimate;
        draw_seal(&mut sheet, &measure, text, 100.0, 20.0, 15.0);
        sheet.ops
    }

    fn text_ops(ops: &[DrawOp]) -> Vec<(String, f32, f32)> {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, x, y, .. } => Some((text.clone(), *x, *y)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_name_falls_back_to_single_glyph() {
        let texts = text_ops(&seal_ops(""));
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "印");
    }

    #[test]
    fn two_characters_stack_vertically() {
        let texts = text_ops(&seal_ops("山田"));
        assert_eq!(texts.len(), 2);
        assert!((texts[0].1 - texts[1].1).abs() < 1e-4);
        assert!(texts[0].2 < texts[1].2);
    }

    #[test]
    fn three_characters_stack_in_one_column() {
        let texts = text_ops(&seal_ops("佐々木"));
        assert_eq!(texts.len(), 3);
        assert!((texts[0].1 - texts[1].1).abs() < 1e-4);
        assert!((texts[1].1 - texts[2].1).abs() < 1e-4);
        assert!(texts[0].2 < texts[1].2 && texts[1].2 < texts[2].2);
    }

    #[test]
    fn four_characters_read_right_column_first() {
        let texts = text_ops(&seal_ops("株式会社"));
        assert_eq!(texts.len(), 4);
        let (right, left) = (&texts[0..2], &texts[2..4]);
        assert!(right.iter().all(|t| t.1 > left[0].1));
        assert!(right[0].2 < right[1].2);
        assert!(left[0].2 < left[1].2);
    }

    #[test]
    fn long_names_cap_at_four_glyphs() {
        let texts = text_ops(&seal_ops("アトリエ青木デザイン"));
        assert_eq!(texts.len(), 4);
    }

    #[test]
    fn uncapped_text_condenses_horizontally() {
        let mut sheet = Sheet::new(A4_WIDTH_MM);
        let measure = TextMeasure::Estimate;
        draw_seal_text(&mut sheet, &measure, "アトリエ青木", 100.0, 20.0, 15.0);
        let texts = text_ops(&sheet.ops);
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "アトリエ青木");
    }

    #[test]
    fn seal_draws_double_border() {
        let ops = seal_ops("印");
        let strokes = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::RectStroke { .. }))
            .count();
        assert_eq!(strokes, 2);
    }
}
