//! Template catalog. Every template id resolves to a [`TemplateStyle`]: a
//! declarative bundle of independent visual axes the layout engine reads.
//! Adding a template means adding an enum variant and one match arm of
//! data, nothing else. `Receipt` is the one structural exception: it takes
//! the 80mm thermal branch before the axis engine applies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    Modern,
    Classic,
    Simple,
    Bold,
    Elegant,
    Tech,
    Nature,
    Grid,
    Corporate,
    Monochrome,
    Warm,
    Cool,
    Compact,
    Playful,
    Shadow,
    Borderless,
    Sharp,
    Soft,
    Vintage,
    Studio,
    Receipt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Sans,
    Serif,
    Mono,
}

/// Item-table header treatments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
    /// Near-black band, white text.
    Dark,
    /// Accent-colored band, white text.
    Accent,
    /// Light gray band, muted text.
    Light,
}

#[derive(Debug, Clone, Copy)]
pub struct TemplateStyle {
    pub family: FontFamily,
    pub header: HeaderStyle,
    /// Full cell grid when set; hairline row rules otherwise.
    pub bordered: bool,
    /// Colored strip across the very top of the sheet.
    pub accent_bar: bool,
    /// Quarter-disc tint in the top-right corner.
    pub corner_flourish: bool,
    /// Soft drop shadow behind the amount banner.
    pub banner_shadow: bool,
    /// Rule under the header area.
    pub header_divider: bool,
    /// Item table pads with empty rows up to this count.
    pub min_rows: usize,
    /// Some templates pin the heading instead of using the document title.
    pub fixed_title: Option<&'static str>,
    /// Heading drawn in black instead of the accent color.
    pub title_in_black: bool,
}

impl TemplateStyle {
    const BASE: TemplateStyle = TemplateStyle {
        family: FontFamily::Sans,
        header: HeaderStyle::Light,
        bordered: false,
        accent_bar: true,
        corner_flourish: false,
        banner_shadow: false,
        header_divider: false,
        min_rows: 8,
        fixed_title: None,
        title_in_black: false,
    };
}

impl TemplateId {
    pub const ALL: [TemplateId; 21] = [
        TemplateId::Modern,
        TemplateId::Classic,
        TemplateId::Simple,
        TemplateId::Bold,
        TemplateId::Elegant,
        TemplateId::Tech,
        TemplateId::Nature,
        TemplateId::Grid,
        TemplateId::Corporate,
        TemplateId::Monochrome,
        TemplateId::Warm,
        TemplateId::Cool,
        TemplateId::Compact,
        TemplateId::Playful,
        TemplateId::Shadow,
        TemplateId::Borderless,
        TemplateId::Sharp,
        TemplateId::Soft,
        TemplateId::Vintage,
        TemplateId::Studio,
        TemplateId::Receipt,
    ];

    pub fn id(self) -> &'static str {
        match self {
            TemplateId::Modern => "modern",
            TemplateId::Classic => "classic",
            TemplateId::Simple => "simple",
            TemplateId::Bold => "bold",
            TemplateId::Elegant => "elegant",
            TemplateId::Tech => "tech",
            TemplateId::Nature => "nature",
            TemplateId::Grid => "grid",
            TemplateId::Corporate => "corporate",
            TemplateId::Monochrome => "monochrome",
            TemplateId::Warm => "warm",
            TemplateId::Cool => "cool",
            TemplateId::Compact => "compact",
            TemplateId::Playful => "playful",
            TemplateId::Shadow => "shadow",
            TemplateId::Borderless => "borderless",
            TemplateId::Sharp => "sharp",
            TemplateId::Soft => "soft",
            TemplateId::Vintage => "vintage",
            TemplateId::Studio => "studio",
            TemplateId::Receipt => "receipt",
        }
    }

    /// Display name as shown in the template picker.
    pub fn label(self) -> &'static str {
        match self {
            TemplateId::Modern => "モダン",
            TemplateId::Classic => "クラシック",
            TemplateId::Simple => "シンプル",
            TemplateId::Bold => "太字強調",
            TemplateId::Elegant => "エレガント",
            TemplateId::Tech => "テック",
            TemplateId::Nature => "ネイチャー",
            TemplateId::Grid => "グリッド",
            TemplateId::Corporate => "コーポレート",
            TemplateId::Monochrome => "モノクロ",
            TemplateId::Warm => "ウォーム",
            TemplateId::Cool => "クール",
            TemplateId::Compact => "コンパクト",
            TemplateId::Playful => "プレイフル",
            TemplateId::Shadow => "シャドウ",
            TemplateId::Borderless => "枠なし",
            TemplateId::Sharp => "シャープ",
            TemplateId::Soft => "ソフト",
            TemplateId::Vintage => "ビンテージ",
            TemplateId::Studio => "スタジオ",
            TemplateId::Receipt => "レシート (感熱紙)",
        }
    }

    pub fn is_receipt(self) -> bool {
        self == TemplateId::Receipt
    }

    pub fn style(self) -> TemplateStyle {
        use TemplateId::*;
        let base = TemplateStyle::BASE;
        match self {
            Modern => base,
            Classic => TemplateStyle {
                family: FontFamily::Serif,
                bordered: true,
                ..base
            },
            Simple => TemplateStyle {
                accent_bar: false,
                fixed_title: Some("Invoice"),
                ..base
            },
            Bold => TemplateStyle {
                header: HeaderStyle::Accent,
                ..base
            },
            Elegant => TemplateStyle {
                family: FontFamily::Serif,
                ..base
            },
            Tech => TemplateStyle {
                header: HeaderStyle::Dark,
                ..base
            },
            Nature => TemplateStyle {
                header: HeaderStyle::Accent,
                corner_flourish: true,
                ..base
            },
            Grid => TemplateStyle {
                bordered: true,
                header_divider: true,
                ..base
            },
            Corporate => TemplateStyle {
                header: HeaderStyle::Dark,
                ..base
            },
            Monochrome => TemplateStyle {
                header: HeaderStyle::Dark,
                title_in_black: true,
                ..base
            },
            Warm => TemplateStyle {
                header: HeaderStyle::Accent,
                ..base
            },
            Cool => TemplateStyle {
                header: HeaderStyle::Accent,
                ..base
            },
            Compact => TemplateStyle {
                bordered: true,
                min_rows: 10,
                ..base
            },
            Playful => TemplateStyle {
                header: HeaderStyle::Accent,
                corner_flourish: true,
                ..base
            },
            Shadow => TemplateStyle {
                banner_shadow: true,
                ..base
            },
            Borderless => TemplateStyle {
                accent_bar: false,
                ..base
            },
            Sharp => TemplateStyle {
                header: HeaderStyle::Dark,
                ..base
            },
            Soft => TemplateStyle {
                family: FontFamily::Serif,
                accent_bar: false,
                ..base
            },
            Vintage => TemplateStyle {
                family: FontFamily::Serif,
                bordered: true,
                ..base
            },
            Studio => TemplateStyle {
                header: HeaderStyle::Accent,
                corner_flourish: true,
                ..base
            },
            Receipt => TemplateStyle {
                family: FontFamily::Mono,
                accent_bar: false,
                min_rows: 0,
                ..base
            },
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for TemplateId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateId::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| format!("unknown template id: {s}"))
    }
}

/// RGB color in the 0..=1 range, as the PDF layer expects it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Color {
        Color { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb`. Anything else is None.
    pub fn from_hex(s: &str) -> Option<Color> {
        let hex = s.strip_prefix('#')?;
        let (r, g, b) = match hex.len() {
            3 => {
                let v: Vec<u8> = hex
                    .chars()
                    .map(|c| u8::from_str_radix(&format!("{c}{c}"), 16))
                    .collect::<Result<_, _>>()
                    .ok()?;
                (v[0], v[1], v[2])
            }
            6 => (
                u8::from_str_radix(&hex[0..2], 16).ok()?,
                u8::from_str_radix(&hex[2..4], 16).ok()?,
                u8::from_str_radix(&hex[4..6], 16).ok()?,
            ),
            _ => return None,
        };
        Some(Color::rgb(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
        ))
    }

    /// Composite this color over white at the given alpha, the way a
    /// translucent CSS background reads on a white sheet.
    pub fn tint(self, alpha: f32) -> Color {
        let blend = |c: f32| 1.0 - (1.0 - c) * alpha;
        Color::rgb(blend(self.r), blend(self.g), blend(self.b))
    }
}

/// Default accent, the indigo the picker starts on.
pub const DEFAULT_ACCENT: &str = "#4f46e5";

/// Parse an accent hex string, falling back to the default accent.
pub fn accent_color(hex: &str) -> Color {
    Color::from_hex(hex)
        .or_else(|| Color::from_hex(DEFAULT_ACCENT))
        .unwrap_or(Color::rgb(0.31, 0.275, 0.898))
}

pub mod palette {
    use super::Color;

    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    // Slate scale.
    pub const SLATE_900: Color = Color::rgb(0.059, 0.09, 0.165);
    pub const SLATE_600: Color = Color::rgb(0.278, 0.333, 0.412);
    pub const SLATE_500: Color = Color::rgb(0.392, 0.455, 0.545);
    pub const SLATE_400: Color = Color::rgb(0.58, 0.639, 0.722);
    pub const SLATE_300: Color = Color::rgb(0.796, 0.835, 0.882);
    pub const SLATE_100: Color = Color::rgb(0.945, 0.961, 0.976);
    pub const SLATE_50: Color = Color::rgb(0.973, 0.98, 0.988);
    /// Seal red.
    pub const VERMILION: Color = Color::rgb(0.937, 0.267, 0.267);
    /// Reduced-rate badge background; fixed, independent of the accent.
    pub const BADGE_INDIGO: Color = Color::rgb(0.388, 0.4, 0.945);
}
