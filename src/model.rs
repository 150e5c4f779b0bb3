//! Domain types for qualified-invoice documents. JSON field names follow
//! the camelCase wire shape the stores and CLI exchange.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::template::TemplateId;

/// Consumption-tax rate classes. The set is closed: an item always carries
/// exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxRate {
    Standard,
    Reduced,
    Exempt,
}

impl TaxRate {
    /// Declaration order doubles as the summary emission order.
    pub const ALL: [TaxRate; 3] = [TaxRate::Standard, TaxRate::Reduced, TaxRate::Exempt];

    pub fn rate(self) -> f64 {
        match self {
            TaxRate::Standard => 0.10,
            TaxRate::Reduced => 0.08,
            TaxRate::Exempt => 0.00,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub unit: String,
    pub tax_rate: TaxRate,
}

impl LineItem {
    /// Blank row as the form adds it: one unit of 式 at zero yen, standard rate.
    pub fn blank() -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            description: String::new(),
            quantity: 1.0,
            unit_price: 0.0,
            unit: "式".to_string(),
            tax_rate: TaxRate::Standard,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issuer {
    pub name: String,
    pub registration_number: String,
    pub address: String,
    pub zip_code: String,
    pub phone: String,
    pub email: String,
    pub bank_info: String,
    pub enable_stamp: bool,
    #[serde(default)]
    pub stamp_image_url: Option<String>,
    #[serde(default)]
    pub logo_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    pub title: String,
    pub invoice_number: String,
    pub date: String,
    pub due_date: String,
    pub issuer: Issuer,
    pub client: Client,
    pub items: Vec<LineItem>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSummary {
    pub rate: f64,
    pub taxable_amount: f64,
    pub tax_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub total_tax: f64,
    pub grand_total: f64,
    pub tax_summaries: Vec<TaxSummary>,
}

/// History snapshot written at export time. Immutable once created except
/// for delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedInvoice {
    pub id: String,
    pub created_at: i64,
    pub template_id: TemplateId,
    #[serde(flatten)]
    pub data: InvoiceData,
}

impl SavedInvoice {
    pub fn snapshot(data: &InvoiceData, template_id: TemplateId) -> Self {
        SavedInvoice {
            id: Uuid::new_v4().to_string(),
            created_at: epoch_millis(),
            template_id,
            data: data.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// Document kinds the conversion flow can target. The enum carries the
/// Japanese title and the number prefix the conversion rewrites to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Invoice,
    Estimate,
    DeliveryNote,
    Receipt,
    Acceptance,
}

impl DocumentKind {
    pub fn title(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "御請求書",
            DocumentKind::Estimate => "御見積書",
            DocumentKind::DeliveryNote => "納品書",
            DocumentKind::Receipt => "領収書",
            DocumentKind::Acceptance => "検収書",
        }
    }

    pub fn number_prefix(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INV",
            DocumentKind::Estimate => "EST",
            DocumentKind::DeliveryNote => "DEL",
            DocumentKind::Receipt => "RCT",
            DocumentKind::Acceptance => "ACP",
        }
    }
}

/// Suggested units for the item form.
pub const UNIT_SUGGESTIONS: [&str; 6] = ["式", "個", "月", "h", "日", "件"];

/// Suggested document titles.
pub const DOCUMENT_TITLES: [&str; 6] =
    ["御請求書", "御見積書", "納品書", "領収書", "INVOICE", "QUOTATION"];

/// Qualified-invoice issuer registration numbers are a `T` followed by
/// exactly 13 digits. Pure predicate; invalid numbers stay representable.
pub fn registration_number_valid(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 14 && bytes[0] == b'T' && bytes[1..].iter().all(u8::is_ascii_digit)
}

/// Fresh document as the editor opens it: invoice titled 御請求書, numbered
/// `INV-{yyyy}{MM}-001`, issued today, due in 14 days, one blank item.
pub fn default_invoice() -> InvoiceData {
    let today = OffsetDateTime::now_utc();
    let due = today + Duration::days(14);

    InvoiceData {
        title: DocumentKind::Invoice.title().to_string(),
        invoice_number: format!(
            "{}-{:04}{:02}-001",
            DocumentKind::Invoice.number_prefix(),
            today.year(),
            u8::from(today.month())
        ),
        date: ymd(today),
        due_date: ymd(due),
        issuer: Issuer {
            enable_stamp: true,
            ..Issuer::default()
        },
        client: Client::default(),
        items: vec![LineItem::blank()],
        notes: String::new(),
    }
}

pub(crate) fn ymd(dt: OffsetDateTime) -> String {
    let d = dt.date();
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

pub(crate) fn epoch_millis() -> i64 {
    let now = OffsetDateTime::now_utc();
    now.unix_timestamp() * 1000 + i64::from(now.millisecond())
}
