//! A4 document composition. One engine lays out every standard template;
//! the differences between templates arrive entirely through
//! [`TemplateStyle`] axes and the accent color.

use crate::format::{format_date_ja, format_number, format_yen};
use crate::model::{InvoiceData, InvoiceTotals, TaxRate};
use crate::template::{palette, Color, HeaderStyle, TemplateId, TemplateStyle};
use crate::text::{TextMeasure, PT_TO_MM};

use super::{decode_data_url_image, stamp, DrawOp, FontSel, Sheet, A4_HEIGHT_MM, A4_WIDTH_MM};

// Sheet geometry from the canonical capture state: 10mm padding on a
// 210mm sheet.
const MARGIN: f32 = 10.0;
const CONTENT_LEFT: f32 = MARGIN;
const CONTENT_RIGHT: f32 = A4_WIDTH_MM - MARGIN;
const CONTENT_W: f32 = CONTENT_RIGHT - CONTENT_LEFT;
const SECTION_GAP: f32 = 12.7;
const ACCENT_BAR_H: f32 = 3.2;
const FLOURISH_R: f32 = 33.9;

// Type scale in points.
const TITLE_SIZE: f32 = 27.0;
const HEADING_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 10.5;
const SMALL_SIZE: f32 = 8.3;
const TINY_SIZE: f32 = 7.5;
const TABLE_SIZE: f32 = 9.8;
const BANNER_SIZE: f32 = 24.0;
const FOOTER_SIZE: f32 = 6.8;

// Item table columns: description takes what the fixed columns leave.
const COL_QTY_W: f32 = 21.2;
const COL_UNIT_W: f32 = 21.2;
const COL_PRICE_W: f32 = 33.9;
const COL_AMOUNT_W: f32 = 38.1;
const COL_DESC_W: f32 = CONTENT_W - COL_QTY_W - COL_UNIT_W - COL_PRICE_W - COL_AMOUNT_W;
const CELL_PAD: f32 = 3.2;
const ROW_H: f32 = 10.6;

const TOTALS_W: f32 = 84.7;
const SEAL_SIZE: f32 = 14.8;
const SEAL_IMAGE_SIZE: f32 = 17.2;

fn line_step(size_pt: f32) -> f32 {
    size_pt * PT_TO_MM * 1.5
}

/// Compose the A4 document for any non-receipt template.
pub fn compose_a4(
    data: &InvoiceData,
    totals: &InvoiceTotals,
    template: TemplateId,
    accent: Color,
    measure: &TextMeasure<'_>,
) -> Sheet {
    let style = template.style();
    let mut c = Composer {
        sheet: Sheet::new(A4_WIDTH_MM),
        m: measure,
        style,
        accent,
    };

    let mut y = c.draw_frame();
    y = c.draw_header(data, y);
    y = c.draw_recipient(data, y);
    y = c.draw_banner(totals, y);
    y = c.draw_table(data, y);
    y = c.draw_totals(totals, y);
    y = c.draw_bank_notes(data, y);

    c.sheet.height_mm = (y + MARGIN).max(A4_HEIGHT_MM);
    c.draw_footer(data);
    c.sheet
}

struct Composer<'a, 'f> {
    sheet: Sheet,
    m: &'a TextMeasure<'f>,
    style: TemplateStyle,
    accent: Color,
}

impl Composer<'_, '_> {
    fn regular(&self) -> FontSel {
        FontSel::regular(self.style.family)
    }

    fn bold(&self) -> FontSel {
        FontSel::bold(self.style.family)
    }

    fn text_right(&mut self, text: &str, size: f32, x_right: f32, y: f32, font: FontSel, color: Color) {
        let w = self.m.width_mm(text, size);
        self.sheet.text(text, size, x_right - w, y, font, color);
    }

    fn text_center(&mut self, text: &str, size: f32, x_center: f32, y: f32, font: FontSel, color: Color) {
        let w = self.m.width_mm(text, size);
        self.sheet.text(text, size, x_center - w / 2.0, y, font, color);
    }

    /// Accent bar and corner flourish. Returns the content top.
    fn draw_frame(&mut self) -> f32 {
        let mut top = MARGIN;
        if self.style.accent_bar {
            self.sheet
                .rect_fill(0.0, 0.0, A4_WIDTH_MM, ACCENT_BAR_H, self.accent);
            top += ACCENT_BAR_H;
        }
        if self.style.corner_flourish {
            // Quarter disc hanging from the top-right corner, tinted to a
            // tenth of the accent.
            let tint = self.accent.tint(0.10);
            let cx = A4_WIDTH_MM;
            let cy = if self.style.accent_bar { ACCENT_BAR_H } else { 0.0 };
            let mut points = vec![(cx, cy), (cx - FLOURISH_R, cy)];
            let segments = 24;
            for i in 0..=segments {
                let t = std::f32::consts::FRAC_PI_2 * (i as f32 / segments as f32);
                points.push((cx - FLOURISH_R * t.cos(), cy + FLOURISH_R * t.sin()));
            }
            self.sheet.push(DrawOp::PolyFill { points, color: tint });
        }
        top
    }

    fn draw_header(&mut self, data: &InvoiceData, y: f32) -> f32 {
        let top = y;

        // --- Left: title and document meta ---
        let title_color = if self.style.title_in_black {
            palette::BLACK
        } else {
            self.accent
        };
        let title = self
            .style
            .fixed_title
            .map(str::to_string)
            .unwrap_or_else(|| data.title.clone())
            .to_uppercase();
        let mut ly = top + TITLE_SIZE * PT_TO_MM * 0.8;
        self.sheet
            .text(title, TITLE_SIZE, CONTENT_LEFT, ly, self.bold(), title_color);
        ly += 4.2 + line_step(BODY_SIZE);

        let no_label = "No. ";
        self.sheet
            .text(no_label, BODY_SIZE, CONTENT_LEFT, ly, self.bold(), palette::BLACK);
        let no_w = self.m.width_mm(no_label, BODY_SIZE);
        self.sheet.text(
            data.invoice_number.clone(),
            BODY_SIZE,
            CONTENT_LEFT + no_w,
            ly,
            self.regular(),
            palette::SLATE_500,
        );
        ly += line_step(BODY_SIZE);
        self.sheet.text(
            format!("発行日: {}", format_date_ja(&data.date)),
            BODY_SIZE,
            CONTENT_LEFT,
            ly,
            self.regular(),
            palette::SLATE_500,
        );
        ly += line_step(BODY_SIZE);
        self.sheet.text(
            format!("支払期限: {}", format_date_ja(&data.due_date)),
            BODY_SIZE,
            CONTENT_LEFT,
            ly,
            self.regular(),
            palette::SLATE_500,
        );
        let left_bottom = ly + self.m.descent_mm(BODY_SIZE);

        // --- Right: seal, logo, issuer block ---
        let issuer = &data.issuer;
        let mut ry = top + 2.1;

        if issuer.enable_stamp {
            self.draw_seal(issuer, top);
        }

        if let Some(url) = issuer.logo_image_url.as_deref() {
            if let Some(image) = decode_data_url_image(url) {
                let px_w = image.width().max(1) as f32;
                let px_h = image.height().max(1) as f32;
                let box_h = 12.0;
                let box_w = 40.0;
                let scale = (box_w / px_w).min(box_h / px_h);
                let w_mm = px_w * scale;
                let h_mm = px_h * scale;
                self.sheet.push(DrawOp::Image {
                    image,
                    x: CONTENT_RIGHT - w_mm,
                    y_top: ry,
                    w_mm,
                    h_mm,
                });
                ry += h_mm + 2.0;
            }
        }

        ry += HEADING_SIZE * PT_TO_MM * 0.8;
        self.text_right(
            &issuer.name,
            HEADING_SIZE,
            CONTENT_RIGHT,
            ry,
            self.bold(),
            palette::BLACK,
        );
        ry += 2.1;

        let detail_step = SMALL_SIZE * PT_TO_MM * 1.6;
        if !issuer.registration_number.is_empty() {
            ry += detail_step;
            let line = format!("登録番号: {}", issuer.registration_number);
            self.text_right(&line, SMALL_SIZE, CONTENT_RIGHT, ry, self.bold(), self.accent);
        }
        if !issuer.zip_code.is_empty() || !issuer.address.is_empty() {
            ry += detail_step;
            let line = format!("〒{} {}", issuer.zip_code, issuer.address);
            self.text_right(
                line.trim(),
                SMALL_SIZE,
                CONTENT_RIGHT,
                ry,
                self.regular(),
                palette::SLATE_500,
            );
        }
        let mut contact = String::new();
        if !issuer.phone.is_empty() {
            contact.push_str(&format!("TEL: {}", issuer.phone));
        }
        if !issuer.email.is_empty() {
            if !contact.is_empty() {
                contact.push_str(" / ");
            }
            contact.push_str(&issuer.email);
        }
        if !contact.is_empty() {
            ry += detail_step;
            self.text_right(
                &contact,
                SMALL_SIZE,
                CONTENT_RIGHT,
                ry,
                self.regular(),
                palette::SLATE_500,
            );
        }
        let right_bottom = ry + self.m.descent_mm(SMALL_SIZE);

        let mut bottom = left_bottom.max(right_bottom);
        if self.style.header_divider {
            bottom += 6.3;
            self.sheet
                .hrule(CONTENT_LEFT, CONTENT_RIGHT, bottom, 0.53, palette::SLATE_300);
        }
        bottom + SECTION_GAP
    }

    fn draw_seal(&mut self, issuer: &crate::model::Issuer, header_top: f32) {
        let image = issuer
            .stamp_image_url
            .as_deref()
            .and_then(decode_data_url_image);
        match image {
            Some(image) => {
                let px_w = image.width().max(1) as f32;
                let px_h = image.height().max(1) as f32;
                let scale = (SEAL_IMAGE_SIZE / px_w).min(SEAL_IMAGE_SIZE / px_h);
                let w_mm = px_w * scale;
                let h_mm = px_h * scale;
                self.sheet.push(DrawOp::Image {
                    image,
                    x: CONTENT_RIGHT + 2.6 - w_mm,
                    y_top: header_top - 2.6,
                    w_mm,
                    h_mm,
                });
            }
            None => {
                stamp::draw_seal(
                    &mut self.sheet,
                    self.m,
                    &issuer.name,
                    CONTENT_RIGHT + 2.6 - SEAL_SIZE,
                    header_top - 2.6,
                    SEAL_SIZE,
                );
            }
        }
    }

    fn draw_recipient(&mut self, data: &InvoiceData, y: f32) -> f32 {
        let top = y;
        let text_x = CONTENT_LEFT + 1.1 + 6.3;

        let mut ly = top + HEADING_SIZE * PT_TO_MM * 0.8;
        self.sheet.text(
            data.client.name.clone(),
            HEADING_SIZE,
            text_x,
            ly,
            self.bold(),
            palette::BLACK,
        );
        ly += 2.1;
        self.sheet
            .hrule(text_x, CONTENT_RIGHT * 0.55, ly, 0.26, palette::SLATE_100);
        ly += 3.2;

        if let Some(zip) = data.client.zip_code.as_deref().filter(|s| !s.is_empty()) {
            ly += line_step(BODY_SIZE);
            self.sheet.text(
                format!("〒{}", zip),
                BODY_SIZE,
                text_x,
                ly,
                self.regular(),
                palette::SLATE_500,
            );
        }
        if let Some(addr) = data.client.address.as_deref().filter(|s| !s.is_empty()) {
            for line in self.m.wrap(addr, BODY_SIZE, CONTENT_W * 0.55) {
                ly += line_step(BODY_SIZE);
                self.sheet
                    .text(line, BODY_SIZE, text_x, ly, self.regular(), palette::SLATE_500);
            }
        }
        let bottom = ly + self.m.descent_mm(BODY_SIZE);

        // Accent bar down the left edge of the block.
        self.sheet
            .rect_fill(CONTENT_LEFT, top, 1.1, bottom - top, self.accent);
        bottom + SECTION_GAP
    }

    fn draw_banner(&mut self, totals: &InvoiceTotals, y: f32) -> f32 {
        let h = 21.0;
        if self.style.banner_shadow {
            self.sheet.rect_fill(
                CONTENT_LEFT + 1.0,
                y + 1.4,
                CONTENT_W,
                h,
                palette::SLATE_300.tint(0.55),
            );
        }
        self.sheet
            .rect_fill(CONTENT_LEFT, y, CONTENT_W, h, self.accent.tint(0.0627));

        let mid = y + h / 2.0;
        self.sheet.text(
            "ご請求金額 (税込)",
            9.0,
            CONTENT_LEFT + 6.3,
            mid + 9.0 * PT_TO_MM * 0.35,
            self.bold(),
            palette::SLATE_400,
        );
        let amount = format_yen(totals.grand_total);
        self.text_right(
            &amount,
            BANNER_SIZE,
            CONTENT_RIGHT - 6.3,
            mid + BANNER_SIZE * PT_TO_MM * 0.35,
            self.bold(),
            self.accent,
        );
        y + h + SECTION_GAP
    }

    fn draw_table(&mut self, data: &InvoiceData, y: f32) -> f32 {
        let top = y;
        let col_x = [
            CONTENT_LEFT,
            CONTENT_LEFT + COL_DESC_W,
            CONTENT_LEFT + COL_DESC_W + COL_QTY_W,
            CONTENT_LEFT + COL_DESC_W + COL_QTY_W + COL_UNIT_W,
            CONTENT_LEFT + COL_DESC_W + COL_QTY_W + COL_UNIT_W + COL_PRICE_W,
        ];

        // Header band.
        let (band, head_color) = match self.style.header {
            HeaderStyle::Dark => (Some(palette::SLATE_900), palette::WHITE),
            HeaderStyle::Accent => (Some(self.accent), palette::WHITE),
            HeaderStyle::Light => (Some(palette::SLATE_50), palette::SLATE_600),
        };
        if let Some(fill) = band {
            self.sheet.rect_fill(CONTENT_LEFT, top, CONTENT_W, ROW_H, fill);
        }
        let head_base = top + ROW_H / 2.0 + TABLE_SIZE * PT_TO_MM * 0.35;
        self.sheet.text(
            "内容",
            TABLE_SIZE,
            col_x[0] + CELL_PAD,
            head_base,
            self.bold(),
            head_color,
        );
        self.text_center("数量", TABLE_SIZE, col_x[1] + COL_QTY_W / 2.0, head_base, self.bold(), head_color);
        self.text_center("単位", TABLE_SIZE, col_x[2] + COL_UNIT_W / 2.0, head_base, self.bold(), head_color);
        self.text_right(
            "単価",
            TABLE_SIZE,
            col_x[3] + COL_PRICE_W - CELL_PAD,
            head_base,
            self.bold(),
            head_color,
        );
        self.text_right(
            "金額",
            TABLE_SIZE,
            col_x[4] + COL_AMOUNT_W - CELL_PAD,
            head_base,
            self.bold(),
            head_color,
        );

        let mut row_bounds = vec![top, top + ROW_H];
        let mut ry = top + ROW_H;

        for item in &data.items {
            let desc_w = COL_DESC_W - 2.0 * CELL_PAD;
            let badge = item.tax_rate == TaxRate::Reduced;
            let wrap_w = if badge { desc_w - 12.0 } else { desc_w };
            let lines = self.m.wrap(&item.description, TABLE_SIZE, wrap_w);
            let text_h = (lines.len().max(1) as f32) * line_step(TABLE_SIZE);
            let row_h = (text_h + 2.0 * CELL_PAD).max(ROW_H);

            let mut base = ry + CELL_PAD + TABLE_SIZE * PT_TO_MM * 0.8;
            let mut last_line_end = col_x[0] + CELL_PAD;
            for line in &lines {
                self.sheet.text(
                    line.clone(),
                    TABLE_SIZE,
                    col_x[0] + CELL_PAD,
                    base,
                    self.regular(),
                    palette::BLACK,
                );
                last_line_end = col_x[0] + CELL_PAD + self.m.width_mm(line, TABLE_SIZE);
                base += line_step(TABLE_SIZE);
            }
            if badge {
                let badge_base = ry + CELL_PAD + TABLE_SIZE * PT_TO_MM * 0.8;
                self.draw_reduced_badge(last_line_end + 2.1, badge_base);
            }

            let mid_base = ry + row_h / 2.0 + TABLE_SIZE * PT_TO_MM * 0.35;
            self.text_center(
                &format_number(item.quantity),
                TABLE_SIZE,
                col_x[1] + COL_QTY_W / 2.0,
                mid_base,
                self.regular(),
                palette::BLACK,
            );
            self.text_center(
                &item.unit,
                TABLE_SIZE,
                col_x[2] + COL_UNIT_W / 2.0,
                mid_base,
                self.regular(),
                palette::BLACK,
            );
            self.text_right(
                &format_number(item.unit_price),
                TABLE_SIZE,
                col_x[3] + COL_PRICE_W - CELL_PAD,
                mid_base,
                self.regular(),
                palette::BLACK,
            );
            self.text_right(
                &format_number(item.quantity * item.unit_price),
                TABLE_SIZE,
                col_x[4] + COL_AMOUNT_W - CELL_PAD,
                mid_base,
                self.bold(),
                palette::BLACK,
            );

            ry += row_h;
            row_bounds.push(ry);
            if !self.style.bordered {
                self.sheet
                    .hrule(CONTENT_LEFT, CONTENT_RIGHT, ry, 0.26, palette::SLATE_100);
            }
        }

        // Pad to the minimum visible row count; padding rows carry no data.
        let padding_rows = self.style.min_rows.saturating_sub(data.items.len());
        for _ in 0..padding_rows {
            ry += ROW_H;
            row_bounds.push(ry);
            if !self.style.bordered {
                self.sheet
                    .hrule(CONTENT_LEFT, CONTENT_RIGHT, ry, 0.26, palette::SLATE_50);
            }
        }

        if self.style.bordered {
            for &by in &row_bounds {
                self.sheet
                    .hrule(CONTENT_LEFT, CONTENT_RIGHT, by, 0.26, palette::SLATE_300);
            }
            for &cx in &col_x {
                self.sheet.vrule(cx, top, ry, 0.26, palette::SLATE_300);
            }
            self.sheet.vrule(CONTENT_RIGHT, top, ry, 0.26, palette::SLATE_300);
        }

        ry + 10.6
    }

    fn draw_reduced_badge(&mut self, x: f32, text_base: f32) {
        let size = 6.0;
        let text = "軽減8%";
        let w = self.m.width_mm(text, size) + 1.6;
        let h = 3.0;
        let y_top = text_base - size * PT_TO_MM * 0.8 - 0.5;
        self.sheet.rect_fill(x, y_top, w, h, palette::BADGE_INDIGO);
        self.sheet.text(
            text,
            size,
            x + 0.8,
            y_top + h / 2.0 + size * PT_TO_MM * 0.35,
            self.bold(),
            palette::WHITE,
        );
    }

    fn draw_totals(&mut self, totals: &InvoiceTotals, y: f32) -> f32 {
        let x_left = CONTENT_RIGHT - TOTALS_W;
        let mut ly = y + line_step(BODY_SIZE);

        let pair = |c: &mut Self, ly: f32, label: &str, value: &str, size: f32, lc: Color, vc: Color, bold_value: bool| {
            c.sheet
                .text(label, size, x_left, ly, c.regular(), lc);
            let font = if bold_value { c.bold() } else { c.regular() };
            c.text_right(value, size, CONTENT_RIGHT, ly, font, vc);
        };

        pair(
            self,
            ly,
            "小計 (税抜)",
            &format_yen(totals.subtotal),
            BODY_SIZE,
            palette::SLATE_500,
            palette::SLATE_500,
            true,
        );
        ly += line_step(BODY_SIZE) + 2.1;
        pair(
            self,
            ly,
            "消費税計",
            &format_yen(totals.total_tax),
            BODY_SIZE,
            palette::SLATE_500,
            palette::SLATE_500,
            true,
        );
        ly += 2.1 + self.m.descent_mm(BODY_SIZE);

        // Per-rate breakdown between hairlines.
        self.sheet
            .hrule(x_left, CONTENT_RIGHT, ly + 2.1, 0.26, palette::SLATE_100);
        ly += 2.1;
        for s in &totals.tax_summaries {
            ly += line_step(TINY_SIZE);
            let pct = (s.rate * 100.0).round() as i64;
            pair(
                self,
                ly,
                &format!("{}% 対象 ({})", pct, format_yen(s.taxable_amount)),
                &format!("税額: {}", format_yen(s.tax_amount)),
                TINY_SIZE,
                palette::SLATE_400,
                palette::SLATE_400,
                false,
            );
        }
        ly += 2.1 + self.m.descent_mm(TINY_SIZE);
        self.sheet
            .hrule(x_left, CONTENT_RIGHT, ly, 0.26, palette::SLATE_100);

        ly += 2.1 + line_step(HEADING_SIZE);
        self.sheet
            .text("合計", HEADING_SIZE, x_left, ly, self.bold(), self.accent);
        self.text_right(
            &format_yen(totals.grand_total),
            HEADING_SIZE,
            CONTENT_RIGHT,
            ly,
            self.bold(),
            self.accent,
        );
        ly + self.m.descent_mm(HEADING_SIZE) + SECTION_GAP
    }

    fn draw_bank_notes(&mut self, data: &InvoiceData, y: f32) -> f32 {
        let gap = 8.0;
        let bank_w = (CONTENT_W - gap) * 0.4;
        let notes_w = (CONTENT_W - gap) * 0.6;
        let notes_x = CONTENT_LEFT + bank_w + gap;
        let pad = 5.3;
        let body_step = SMALL_SIZE * PT_TO_MM * 1.6;

        let bank_lines = self
            .m
            .wrap_multiline(&data.issuer.bank_info, SMALL_SIZE, bank_w - 2.0 * pad);
        let notes_text = if data.notes.is_empty() {
            "特記事項なし"
        } else {
            &data.notes
        };
        let notes_lines = self
            .m
            .wrap_multiline(notes_text, SMALL_SIZE, notes_w - 2.0 * pad);

        let label_h = line_step(TINY_SIZE) + 2.1;
        let content_rows = bank_lines.len().max(notes_lines.len()).max(1);
        let box_h = pad * 2.0 + label_h + content_rows as f32 * body_step;

        self.sheet
            .rect_fill(CONTENT_LEFT, y, bank_w, box_h, palette::SLATE_50);
        self.sheet
            .rect_stroke(notes_x, y, notes_w, box_h, 0.26, palette::SLATE_100);

        let draw_box = |c: &mut Self, x: f32, label: &str, lines: &[String], color: Color, bold: bool| {
            let mut ly = y + pad + line_step(TINY_SIZE);
            c.sheet
                .text(label, TINY_SIZE, x + pad, ly, c.bold(), palette::SLATE_400);
            ly += 2.1;
            let font = if bold { c.bold() } else { c.regular() };
            for line in lines {
                ly += body_step;
                c.sheet.text(line.clone(), SMALL_SIZE, x + pad, ly, font, color);
            }
        };
        draw_box(self, CONTENT_LEFT, "お振込先", &bank_lines, palette::SLATE_600, true);
        draw_box(self, notes_x, "備考", &notes_lines, palette::SLATE_500, false);

        y + box_h + SECTION_GAP
    }

    /// Compliance note pinned near the sheet bottom, drawn after the final
    /// height is known.
    fn draw_footer(&mut self, data: &InvoiceData) {
        let color = palette::SLATE_400.tint(0.30);
        let line2_y = self.sheet.height_mm - MARGIN - 0.6;
        let line1_y = line2_y - line_step(FOOTER_SIZE);
        let line1 = format!(
            "QUALIFIED INVOICE COMPLIANT WITH JAPANESE TAX LAW. REGISTRATION: {}",
            data.issuer.registration_number
        );
        let line2 = "CREATED WITH SEIKYU. WE TAKE NO LEGAL RESPONSIBILITY FOR THE CONTENTS.";
        self.text_center(&line1, FOOTER_SIZE, A4_WIDTH_MM / 2.0, line1_y, self.bold(), color);
        self.text_center(line2, FOOTER_SIZE, A4_WIDTH_MM / 2.0, line2_y, self.bold(), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_invoice, LineItem};
    use crate::tax;

    fn sample() -> InvoiceData {
        let mut data = default_invoice();
        data.issuer.name = "山田商事株式会社".to_string();
        data.issuer.registration_number = "T1234567890123".to_string();
        data.client.name = "株式会社テスト".to_string();
        data.items = vec![
            LineItem {
                id: "1".to_string(),
                description: "ウェブサイト制作".to_string(),
                quantity: 1.0,
                unit_price: 100000.0,
                unit: "式".to_string(),
                tax_rate: TaxRate::Standard,
            },
            LineItem {
                id: "2".to_string(),
                description: "お茶菓子".to_string(),
                quantity: 10.0,
                unit_price: 500.0,
                unit: "個".to_string(),
                tax_rate: TaxRate::Reduced,
            },
        ];
        data
    }

    fn compose(template: TemplateId) -> Sheet {
        let data = sample();
        let totals = tax::aggregate(&data.items);
        compose_a4(
            &data,
            &totals,
            template,
            crate::template::accent_color(crate::template::DEFAULT_ACCENT),
            &TextMeasure::Estimate,
        )
    }

    fn texts(sheet: &Sheet) -> Vec<String> {
        sheet
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn short_documents_fill_one_page() {
        let sheet = compose(TemplateId::Modern);
        assert_eq!(sheet.height_mm, A4_HEIGHT_MM);
    }

    #[test]
    fn accent_bar_follows_the_axis() {
        let with_bar = compose(TemplateId::Modern);
        let has_bar = with_bar.ops.iter().any(
            |op| matches!(op, DrawOp::RectFill { y_top, h, w, .. } if *y_top == 0.0 && *h == ACCENT_BAR_H && *w == A4_WIDTH_MM),
        );
        assert!(has_bar);

        let without_bar = compose(TemplateId::Borderless);
        let has_bar = without_bar.ops.iter().any(
            |op| matches!(op, DrawOp::RectFill { y_top, h, w, .. } if *y_top == 0.0 && *h == ACCENT_BAR_H && *w == A4_WIDTH_MM),
        );
        assert!(!has_bar);
    }

    #[test]
    fn flourish_only_for_its_set() {
        let playful = compose(TemplateId::Playful);
        assert!(playful
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::PolyFill { .. })));
        let modern = compose(TemplateId::Modern);
        assert!(!modern
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::PolyFill { .. })));
    }

    #[test]
    fn simple_pins_latin_title() {
        let sheet = compose(TemplateId::Simple);
        assert!(texts(&sheet).iter().any(|t| t == "INVOICE"));
        let sheet = compose(TemplateId::Modern);
        assert!(texts(&sheet).iter().any(|t| t == "御請求書"));
    }

    #[test]
    fn monochrome_title_is_black() {
        let sheet = compose(TemplateId::Monochrome);
        let title_color = sheet.ops.iter().find_map(|op| match op {
            DrawOp::Text { text, color, .. } if text == "御請求書" => Some(*color),
            _ => None,
        });
        assert_eq!(title_color, Some(palette::BLACK));
    }

    #[test]
    fn reduced_items_carry_the_badge() {
        let sheet = compose(TemplateId::Modern);
        assert!(texts(&sheet).iter().any(|t| t == "軽減8%"));
    }

    #[test]
    fn table_pads_to_minimum_rows() {
        // Two items on a min-8 template leave six padding hairlines drawn
        // in the lighter rule color.
        let sheet = compose(TemplateId::Modern);
        let pad_rules = sheet
            .ops
            .iter()
            .filter(
                |op| matches!(op, DrawOp::Rule { color, .. } if *color == palette::SLATE_50),
            )
            .count();
        assert_eq!(pad_rules, 6);
    }

    #[test]
    fn compact_pads_two_more_rows() {
        let sheet = compose(TemplateId::Compact);
        // Bordered grid row boundaries: header top and bottom, two data
        // rows, eight padding rows.
        let grid_rows = sheet
            .ops
            .iter()
            .filter(
                |op| matches!(op, DrawOp::Rule { color, x1, x2, .. } if *color == palette::SLATE_300 && x1 != x2),
            )
            .count();
        assert_eq!(grid_rows, 12);
    }

    #[test]
    fn totals_block_lists_both_rates() {
        let sheet = compose(TemplateId::Modern);
        let all = texts(&sheet).join("\n");
        assert!(all.contains("10% 対象"));
        assert!(all.contains("8% 対象"));
        assert!(all.contains("小計 (税抜)"));
        assert!(all.contains("消費税計"));
        assert!(all.contains("合計"));
    }

    #[test]
    fn banner_shows_tax_included_amount() {
        let sheet = compose(TemplateId::Modern);
        let all = texts(&sheet).join("\n");
        assert!(all.contains("ご請求金額 (税込)"));
        // 100000 + 5000 subtotal, tax 10000 + 400.
        assert!(all.contains("¥115,400"));
    }

    #[test]
    fn empty_notes_fall_back() {
        let sheet = compose(TemplateId::Modern);
        assert!(texts(&sheet).iter().any(|t| t == "特記事項なし"));
    }

    #[test]
    fn seal_is_synthesized_when_no_image() {
        let sheet = compose(TemplateId::Modern);
        let strokes = sheet
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::RectStroke { color, .. } if *color == palette::VERMILION))
            .count();
        assert_eq!(strokes, 2);
    }

    #[test]
    fn disabled_stamp_draws_nothing() {
        let mut data = sample();
        data.issuer.enable_stamp = false;
        let totals = tax::aggregate(&data.items);
        let sheet = compose_a4(
            &data,
            &totals,
            TemplateId::Modern,
            crate::template::accent_color(crate::template::DEFAULT_ACCENT),
            &TextMeasure::Estimate,
        );
        let strokes = sheet
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::RectStroke { color, .. } if *color == palette::VERMILION))
            .count();
        assert_eq!(strokes, 0);
    }

    #[test]
    fn long_item_lists_stretch_the_sheet() {
        let mut data = sample();
        let item = data.items[0].clone();
        data.items = (0..40)
            .map(|i| LineItem {
                id: i.to_string(),
                ..item.clone()
            })
            .collect();
        let totals = tax::aggregate(&data.items);
        let sheet = compose_a4(
            &data,
            &totals,
            TemplateId::Modern,
            crate::template::accent_color(crate::template::DEFAULT_ACCENT),
            &TextMeasure::Estimate,
        );
        assert!(sheet.height_mm > A4_HEIGHT_MM);
    }
}
