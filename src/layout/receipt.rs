//! 80mm thermal receipt composition. A fixed monospace layout that
//! branches off before the template axis engine.

use crate::format::{format_date_receipt, format_number, format_yen};
use crate::model::{InvoiceData, InvoiceTotals, TaxRate};
use crate::template::{palette, FontFamily};
use crate::text::{TextMeasure, PT_TO_MM};

use super::{DrawOp, FontSel, Sheet, RECEIPT_WIDTH_MM};

const PAD: f32 = 5.0;
const LEFT: f32 = PAD;
const RIGHT: f32 = RECEIPT_WIDTH_MM - PAD;
const CENTER: f32 = RECEIPT_WIDTH_MM / 2.0;
const CONTENT_W: f32 = RIGHT - LEFT;

// Thermal paper column in points: 10px body, 9px detail, 8px fine print.
const TITLE_SIZE: f32 = 15.0;
const NAME_SIZE: f32 = 10.5;
const SHOP_SIZE: f32 = 9.0;
const BODY_SIZE: f32 = 7.5;
const DETAIL_SIZE: f32 = 6.8;
const FINE_SIZE: f32 = 6.0;

fn step(size_pt: f32) -> f32 {
    size_pt * PT_TO_MM * 1.25
}

fn mono() -> FontSel {
    FontSel::regular(FontFamily::Mono)
}

fn mono_bold() -> FontSel {
    FontSel::bold(FontFamily::Mono)
}

/// Compose the thermal receipt for the `receipt` template.
pub fn compose_receipt(
    data: &InvoiceData,
    totals: &InvoiceTotals,
    measure: &TextMeasure<'_>,
) -> Sheet {
    let mut sheet = Sheet::new(RECEIPT_WIDTH_MM);
    let m = measure;
    let mut y = PAD;

    let center = |sheet: &mut Sheet, m: &TextMeasure, text: &str, size: f32, y: f32, font: FontSel, color| {
        let w = m.width_mm(text, size);
        sheet.text(text, size, CENTER - w / 2.0, y, font, color);
    };
    let right = |sheet: &mut Sheet, m: &TextMeasure, text: &str, size: f32, y: f32, font: FontSel, color| {
        let w = m.width_mm(text, size);
        sheet.text(text, size, RIGHT - w, y, font, color);
    };

    // --- Header: underlined title, shop identity ---
    y += TITLE_SIZE * PT_TO_MM * 0.8;
    let title = "領 収 書";
    center(&mut sheet, m, title, TITLE_SIZE, y, mono_bold(), palette::SLATE_900);
    let title_w = m.width_mm(title, TITLE_SIZE);
    y += 1.1;
    sheet.hrule(
        CENTER - title_w / 2.0,
        CENTER + title_w / 2.0,
        y,
        0.53,
        palette::SLATE_900,
    );
    y += 2.1;

    let shop = if data.issuer.name.is_empty() {
        "店舗名未設定"
    } else {
        &data.issuer.name
    };
    y += step(SHOP_SIZE);
    center(&mut sheet, m, shop, SHOP_SIZE, y, mono_bold(), palette::SLATE_900);
    y += 1.1;

    if !data.issuer.address.is_empty() {
        y += step(DETAIL_SIZE);
        center(&mut sheet, m, &data.issuer.address, DETAIL_SIZE, y, mono(), palette::SLATE_900);
    }
    if !data.issuer.phone.is_empty() {
        y += step(DETAIL_SIZE);
        center(&mut sheet, m, &data.issuer.phone, DETAIL_SIZE, y, mono(), palette::SLATE_900);
    }
    y += 1.1 + step(DETAIL_SIZE);
    let reg_line = format!("登録番号: {}", data.issuer.registration_number);
    center(&mut sheet, m, &reg_line, DETAIL_SIZE, y, mono(), palette::SLATE_900);
    y += 6.3;

    // --- Meta row over a dashed separator ---
    y += step(BODY_SIZE);
    sheet.text(
        format_date_receipt(&data.date),
        BODY_SIZE,
        LEFT,
        y,
        mono(),
        palette::SLATE_900,
    );
    right(&mut sheet, m, "様", BODY_SIZE, y, mono(), palette::SLATE_900);
    y += step(BODY_SIZE);
    sheet.text(
        format!("No: {}", data.invoice_number),
        BODY_SIZE,
        LEFT,
        y,
        mono(),
        palette::SLATE_900,
    );
    y += 2.1;
    sheet.push(DrawOp::DashedRule {
        x1: LEFT,
        y,
        x2: RIGHT,
        thickness: 0.26,
        color: palette::SLATE_400,
        dash_mm: 1.0,
    });
    y += 4.2;

    // --- Payer name, underlined ---
    let client = if data.client.name.is_empty() {
        "様"
    } else {
        &data.client.name
    };
    y += step(NAME_SIZE);
    center(&mut sheet, m, client, NAME_SIZE, y, mono_bold(), palette::SLATE_900);
    let underline_w = m.width_mm(client, NAME_SIZE) + 8.4;
    y += 1.1;
    sheet.hrule(
        CENTER - underline_w / 2.0,
        CENTER + underline_w / 2.0,
        y,
        0.26,
        palette::SLATE_900,
    );
    y += 6.3;

    // --- Item list ---
    y += step(BODY_SIZE);
    sheet.text("品名", BODY_SIZE, LEFT, y, mono_bold(), palette::SLATE_900);
    let amount_w = m.width_mm("金額", BODY_SIZE);
    right(&mut sheet, m, "金額", BODY_SIZE, y, mono_bold(), palette::SLATE_900);
    let price_right = RIGHT - amount_w - 4.2;
    let price_w = m.width_mm("単価", BODY_SIZE);
    sheet.text("単価", BODY_SIZE, price_right - price_w, y, mono_bold(), palette::SLATE_900);
    y += 1.1;
    sheet.hrule(LEFT, RIGHT, y, 0.26, palette::SLATE_900);
    y += 2.1;

    for (i, item) in data.items.iter().enumerate() {
        if i > 0 {
            y += 2.1;
        }
        let name = if item.description.is_empty() {
            "商品"
        } else {
            &item.description
        };
        let name = truncate_to_width(m, name, BODY_SIZE, CONTENT_W * 2.0 / 3.0);
        y += step(BODY_SIZE);
        sheet.text(name, BODY_SIZE, LEFT, y, mono_bold(), palette::SLATE_900);
        right(
            &mut sheet,
            m,
            &format_yen(item.quantity * item.unit_price),
            BODY_SIZE,
            y,
            mono(),
            palette::SLATE_900,
        );
        y += 0.5 + step(FINE_SIZE);
        let unit_line = format!(
            "@{} x {}{}",
            format_number(item.unit_price),
            format_number(item.quantity),
            item.unit
        );
        sheet.text(unit_line, FINE_SIZE, LEFT + 2.1, y, mono(), palette::SLATE_500);
        if item.tax_rate == TaxRate::Reduced {
            right(&mut sheet, m, "(軽)", FINE_SIZE, y, mono(), palette::SLATE_500);
        }
    }
    y += 4.2;

    // --- Totals over a heavy dashed separator ---
    sheet.push(DrawOp::DashedRule {
        x1: LEFT,
        y,
        x2: RIGHT,
        thickness: 0.53,
        color: palette::SLATE_400,
        dash_mm: 1.0,
    });
    y += 2.1;

    let money_row = |sheet: &mut Sheet, y: f32, label: &str, value: &str| {
        sheet.text(label, BODY_SIZE, LEFT, y, mono(), palette::SLATE_900);
        let w = m.width_mm(value, BODY_SIZE);
        sheet.text(value, BODY_SIZE, RIGHT - w, y, mono(), palette::SLATE_900);
    };
    y += step(BODY_SIZE);
    money_row(&mut sheet, y, "小計 (税抜)", &format_yen(totals.subtotal));
    y += 1.1 + step(BODY_SIZE);
    money_row(&mut sheet, y, "消費税等", &format_yen(totals.total_tax));
    y += 1.1 + 2.1;

    sheet.hrule(LEFT, RIGHT, y, 0.53, palette::SLATE_900);
    y += 2.1 + TITLE_SIZE * PT_TO_MM * 0.8;
    sheet.text("合計", TITLE_SIZE, LEFT, y, mono_bold(), palette::SLATE_900);
    right(
        &mut sheet,
        m,
        &format_yen(totals.grand_total),
        TITLE_SIZE,
        y,
        mono_bold(),
        palette::SLATE_900,
    );
    y += m.descent_mm(TITLE_SIZE) + 2.1;
    sheet.hrule(LEFT, RIGHT, y, 0.53, palette::SLATE_900);
    y += 2.1;

    for s in &totals.tax_summaries {
        y += step(FINE_SIZE) + 0.5;
        let pct = (s.rate * 100.0).round() as i64;
        let line = format!(
            "{}%対象: {} (税: {})",
            pct,
            format_yen(s.taxable_amount),
            format_yen(s.tax_amount)
        );
        right(&mut sheet, m, &line, FINE_SIZE, y, mono(), palette::SLATE_500);
    }
    y += 6.3;

    // --- Footer: thanks, barcode, document number ---
    y += step(SHOP_SIZE);
    center(
        &mut sheet,
        m,
        "毎度ありがとうございます",
        SHOP_SIZE,
        y,
        mono_bold(),
        palette::SLATE_900,
    );
    y += 4.2;
    draw_barcode(&mut sheet, y);
    y += BARCODE_H + 1.1 + step(FINE_SIZE);
    let spaced: String = data
        .invoice_number
        .chars()
        .flat_map(|c| [c, ' '])
        .collect();
    center(
        &mut sheet,
        m,
        spaced.trim_end(),
        FINE_SIZE,
        y,
        mono(),
        palette::SLATE_900,
    );
    y += 4.2 + step(FINE_SIZE);
    center(
        &mut sheet,
        m,
        "Powered by Seikyu AI",
        FINE_SIZE,
        y,
        mono(),
        palette::SLATE_400,
    );
    y += 8.5;

    // Thermal paper: the sheet ends where the content ends.
    sheet.height_mm = y + PAD;
    draw_torn_edge(&mut sheet);
    sheet
}

const BARCODE_H: f32 = 8.5;

/// Mock barcode: fixed-pitch dark strips, centered at two thirds of the
/// content width.
fn draw_barcode(sheet: &mut Sheet, y_top: f32) {
    let w = CONTENT_W * 2.0 / 3.0;
    let x0 = CENTER - w / 2.0;
    let strip_w = 0.53;
    let pitch = 1.06;
    let n = (w / pitch) as usize;
    let ink = palette::SLATE_900.tint(0.8);
    for i in 0..n {
        sheet.rect_fill(x0 + i as f32 * pitch, y_top, strip_w, BARCODE_H, ink);
    }
}

/// Sawtooth along the bottom edge, suggesting torn thermal paper.
fn draw_torn_edge(sheet: &mut Sheet) {
    let depth = 2.6;
    let pitch = 2.6;
    let bottom = sheet.height_mm;
    let top = bottom - depth;
    let teeth = (RECEIPT_WIDTH_MM / pitch).ceil() as usize;
    for i in 0..teeth {
        let x0 = i as f32 * pitch;
        let xm = x0 + pitch / 2.0;
        let x1 = (x0 + pitch).min(RECEIPT_WIDTH_MM);
        sheet.push(DrawOp::Rule {
            x1: x0,
            y1: top,
            x2: xm,
            y2: bottom,
            thickness: 0.26,
            color: palette::SLATE_300,
        });
        sheet.push(DrawOp::Rule {
            x1: xm,
            y1: bottom,
            x2: x1,
            y2: top,
            thickness: 0.26,
            color: palette::SLATE_300,
        });
    }
}

fn truncate_to_width(m: &TextMeasure, text: &str, size: f32, max_w: f32) -> String {
    if m.width_mm(text, size) <= max_w {
        return text.to_string();
    }
    let ellipsis = "…";
    let ell_w = m.width_mm(ellipsis, size);
    let mut out = String::new();
    let mut w = 0.0;
    for ch in text.chars() {
        let cw = m.width_mm(&ch.to_string(), size);
        if w + cw + ell_w > max_w {
            break;
        }
        w += cw;
        out.push(ch);
    }
    out.push_str(ellipsis);
    out
}
