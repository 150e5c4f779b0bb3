//! Industry starter presets: one-tap line-item sets for common freelance
//! trades. The catalog is fixed at compile time.

use uuid::Uuid;

use crate::model::{LineItem, TaxRate};

/// A line item template before it gets an id.
#[derive(Debug, Clone)]
pub struct PresetItem {
    pub description: &'static str,
    pub quantity: f64,
    pub unit_price: f64,
    pub unit: &'static str,
    pub tax_rate: TaxRate,
}

/// A named starter set shown on the preset picker.
#[derive(Debug, Clone)]
pub struct IndustryPreset {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub items: &'static [PresetItem],
}

impl IndustryPreset {
    /// Materializes the preset as form rows, each with a fresh id.
    pub fn to_items(&self) -> Vec<LineItem> {
        self.items
            .iter()
            .map(|p| LineItem {
                id: Uuid::new_v4().to_string(),
                description: p.description.to_string(),
                quantity: p.quantity,
                unit_price: p.unit_price,
                unit: p.unit.to_string(),
                tax_rate: p.tax_rate,
            })
            .collect()
    }
}

pub const INDUSTRY_PRESETS: &[IndustryPreset] = &[
    IndustryPreset {
        id: "engineer",
        label: "エンジニア",
        icon: "💻",
        items: &[
            PresetItem {
                description: "システム開発費（○○機能実装）",
                quantity: 1.0,
                unit_price: 300_000.0,
                unit: "式",
                tax_rate: TaxRate::Standard,
            },
            PresetItem {
                description: "サーバー構築・設定費",
                quantity: 1.0,
                unit_price: 50_000.0,
                unit: "式",
                tax_rate: TaxRate::Standard,
            },
            PresetItem {
                description: "要件定義・設計費",
                quantity: 1.0,
                unit_price: 100_000.0,
                unit: "式",
                tax_rate: TaxRate::Standard,
            },
        ],
    },
    IndustryPreset {
        id: "designer",
        label: "デザイナー",
        icon: "🎨",
        items: &[
            PresetItem {
                description: "Webデザイン制作費（TOPページ）",
                quantity: 1.0,
                unit_price: 150_000.0,
                unit: "式",
                tax_rate: TaxRate::Standard,
            },
            PresetItem {
                description: "下層ページデザイン制作費",
                quantity: 4.0,
                unit_price: 30_000.0,
                unit: "ページ",
                tax_rate: TaxRate::Standard,
            },
            PresetItem {
                description: "バナー制作費",
                quantity: 2.0,
                unit_price: 10_000.0,
                unit: "点",
                tax_rate: TaxRate::Standard,
            },
        ],
    },
    IndustryPreset {
        id: "writer",
        label: "ライター",
        icon: "✒️",
        items: &[
            PresetItem {
                description: "記事執筆費（取材・構成費含む）",
                quantity: 1.0,
                unit_price: 30_000.0,
                unit: "本",
                tax_rate: TaxRate::Standard,
            },
            PresetItem {
                description: "インタビュー取材費",
                quantity: 1.0,
                unit_price: 10_000.0,
                unit: "回",
                tax_rate: TaxRate::Standard,
            },
            PresetItem {
                description: "交通費（実費）",
                quantity: 1.0,
                unit_price: 1_200.0,
                unit: "式",
                tax_rate: TaxRate::Standard,
            },
        ],
    },
    IndustryPreset {
        id: "construction",
        label: "建設・工事",
        icon: "🔨",
        items: &[
            PresetItem {
                description: "工事一式（材料費含む）",
                quantity: 1.0,
                unit_price: 500_000.0,
                unit: "式",
                tax_rate: TaxRate::Standard,
            },
            PresetItem {
                description: "人工（作業員2名×3日）",
                quantity: 6.0,
                unit_price: 20_000.0,
                unit: "人工",
                tax_rate: TaxRate::Standard,
            },
            PresetItem {
                description: "諸経費・運搬費",
                quantity: 1.0,
                unit_price: 30_000.0,
                unit: "式",
                tax_rate: TaxRate::Standard,
            },
        ],
    },
    IndustryPreset {
        id: "ubereats",
        label: "配達員",
        icon: "🚴",
        items: &[
            PresetItem {
                description: "配達報酬（○○期間分）",
                quantity: 1.0,
                unit_price: 120_000.0,
                unit: "式",
                tax_rate: TaxRate::Standard,
            },
            PresetItem {
                description: "クエスト達成報酬",
                quantity: 1.0,
                unit_price: 15_000.0,
                unit: "式",
                tax_rate: TaxRate::Standard,
            },
        ],
    },
];

/// Looks a preset up by its id.
pub fn find_preset(id: &str) -> Option<&'static IndustryPreset> {
    INDUSTRY_PRESETS.iter().find(|p| p.id == id)
}
