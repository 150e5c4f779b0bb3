//! Text measurement and wrapping. All widths are sheet millimetres; font
//! sizes are points.

pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// Width source for layout. With an external font file the parsed face
/// gives real glyph advances; with the built-in PDF fonts there are no
/// reliable metrics, so a per-character estimate stands in. The estimate
/// treats fullwidth CJK as a whole em and everything else as roughly half,
/// which is good enough for column alignment and matches the reference
/// visually.
pub enum TextMeasure<'a> {
    Face(ttf_parser::Face<'a>),
    Estimate,
}

impl TextMeasure<'_> {
    pub fn width_mm(&self, text: &str, font_size_pt: f32) -> f32 {
        match self {
            TextMeasure::Face(face) => face_width_mm(face, text, font_size_pt),
            TextMeasure::Estimate => estimate_width_mm(text, font_size_pt),
        }
    }

    pub fn ascent_mm(&self, font_size_pt: f32) -> f32 {
        match self {
            TextMeasure::Face(face) => {
                let units_per_em = face.units_per_em() as f32;
                if units_per_em <= 0.0 {
                    return font_size_pt * PT_TO_MM * 0.80;
                }
                (face.ascender() as f32 / units_per_em) * font_size_pt * PT_TO_MM
            }
            TextMeasure::Estimate => font_size_pt * PT_TO_MM * 0.80,
        }
    }

    pub fn descent_mm(&self, font_size_pt: f32) -> f32 {
        match self {
            TextMeasure::Face(face) => {
                let units_per_em = face.units_per_em() as f32;
                if units_per_em <= 0.0 {
                    return font_size_pt * PT_TO_MM * 0.20;
                }
                // descender is typically negative; report a positive magnitude.
                ((-(face.descender() as f32)).max(0.0) / units_per_em) * font_size_pt * PT_TO_MM
            }
            TextMeasure::Estimate => font_size_pt * PT_TO_MM * 0.20,
        }
    }

    /// Greedy wrap to a width. Words longer than the line (and unspaced CJK
    /// runs, which arrive as one word) are split at character granularity.
    pub fn wrap(&self, input: &str, font_size_pt: f32, max_width_mm: f32) -> Vec<String> {
        let s = input.trim();
        if s.is_empty() {
            return Vec::new();
        }

        let mut out: Vec<String> = Vec::new();
        let mut current = String::new();

        for word in s.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if self.width_mm(&candidate, font_size_pt) <= max_width_mm {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            if self.width_mm(word, font_size_pt) <= max_width_mm {
                current = word.to_string();
                continue;
            }

            // Split a single too-long word into chunks.
            let mut chunk = String::new();
            for ch in word.chars() {
                let mut widened = chunk.clone();
                widened.push(ch);
                if self.width_mm(&widened, font_size_pt) <= max_width_mm {
                    chunk = widened;
                } else {
                    if !chunk.is_empty() {
                        out.push(chunk);
                    }
                    chunk = ch.to_string();
                }
            }
            current = chunk;
        }

        if !current.is_empty() {
            out.push(current);
        }
        out
    }

    /// Wrap text that carries its own newlines (notes, bank info). Blank
    /// source lines survive as blank output lines.
    pub fn wrap_multiline(&self, input: &str, font_size_pt: f32, max_width_mm: f32) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for raw in input.lines() {
            if raw.trim().is_empty() {
                out.push(String::new());
                continue;
            }
            out.extend(self.wrap(raw, font_size_pt, max_width_mm));
        }
        out
    }
}

fn face_width_mm(face: &ttf_parser::Face<'_>, text: &str, font_size_pt: f32) -> f32 {
    let units_per_em = face.units_per_em() as f32;
    if units_per_em <= 0.0 {
        return 0.0;
    }

    let mut width_units: i32 = 0;
    for ch in text.chars() {
        let Some(gid) = face.glyph_index(ch) else {
            continue;
        };
        width_units += i32::from(face.glyph_hor_advance(gid).unwrap_or(0));
    }

    (width_units as f32 / units_per_em) * font_size_pt * PT_TO_MM
}

fn estimate_width_mm(text: &str, font_size_pt: f32) -> f32 {
    let em = font_size_pt * PT_TO_MM;
    text.chars()
        .map(|ch| if is_fullwidth(ch) { em } else { em * 0.52 })
        .sum()
}

/// East-Asian wide ranges that matter for these documents.
fn is_fullwidth(ch: char) -> bool {
    matches!(u32::from(ch),
        0x3000..=0x303F   // CJK symbols and punctuation
        | 0x3040..=0x30FF // hiragana, katakana
        | 0x3400..=0x4DBF // CJK extension A
        | 0x4E00..=0x9FFF // CJK unified
        | 0xAC00..=0xD7A3 // hangul syllables
        | 0xF900..=0xFAFF // CJK compatibility
        | 0xFF00..=0xFF60 // fullwidth forms
        | 0xFFE0..=0xFFE6
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_counts_cjk_as_full_em() {
        let m = TextMeasure::Estimate;
        let em = 10.0 * PT_TO_MM;
        assert!((m.width_mm("請求", 10.0) - 2.0 * em).abs() < 1e-4);
        assert!((m.width_mm("ab", 10.0) - 2.0 * em * 0.52).abs() < 1e-4);
    }

    #[test]
    fn ascent_descent_fallbacks() {
        let m = TextMeasure::Estimate;
        assert!((m.ascent_mm(10.0) - 10.0 * PT_TO_MM * 0.80).abs() < 1e-6);
        assert!((m.descent_mm(10.0) - 10.0 * PT_TO_MM * 0.20).abs() < 1e-6);
    }

    #[test]
    fn wrap_keeps_short_text_on_one_line() {
        let m = TextMeasure::Estimate;
        assert_eq!(m.wrap("hello world", 10.0, 100.0), vec!["hello world"]);
    }

    #[test]
    fn wrap_breaks_at_word_boundaries() {
        let m = TextMeasure::Estimate;
        let lines = m.wrap("aaaa bbbb cccc", 10.0, 9.0);
        // 4 latin chars at 10pt estimate to ~7.3mm; two words never fit.
        assert_eq!(lines, vec!["aaaa", "bbbb", "cccc"]);
    }

    #[test]
    fn wrap_chunks_unspaced_cjk_runs() {
        let m = TextMeasure::Estimate;
        let em = 10.0 * PT_TO_MM;
        let lines = m.wrap("東京都港区赤坂一丁目", 10.0, em * 4.0 + 0.01);
        assert_eq!(lines, vec!["東京都港", "区赤坂一", "丁目"]);
    }

    #[test]
    fn multiline_preserves_blank_lines() {
        let m = TextMeasure::Estimate;
        let lines = m.wrap_multiline("first\n\nsecond", 10.0, 100.0);
        assert_eq!(lines, vec!["first", "", "second"]);
    }
}
