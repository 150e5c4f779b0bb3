//! End-to-end export tests: draft in, PDF file and history out, all
//! through the public API.

use seikyu::editor::Editor;
use seikyu::model::{default_invoice, InvoiceData, LineItem, TaxRate};
use seikyu::pdf::FontSource;
use seikyu::store::Store;
use seikyu::template::TemplateId;

fn sample_invoice() -> InvoiceData {
    let mut data = default_invoice();
    data.invoice_number = "INV-202508-007".into();
    data.date = "2025-08-22".into();
    data.due_date = "2025-09-05".into();
    data.issuer.name = "スタジオ蒼".into();
    data.issuer.registration_number = "T1234567890123".into();
    data.issuer.zip_code = "150-0041".into();
    data.issuer.address = "東京都渋谷区神南1-2-3".into();
    data.issuer.email = "ao@example.jp".into();
    data.issuer.bank_info = "みずほ銀行 渋谷支店 (普) 1234567".into();
    data.client.name = "株式会社ひかり商事".into();
    data.client.zip_code = Some("100-0001".into());
    data.client.address = Some("東京都千代田区千代田1-1".into());
    data.notes = "お振込手数料は貴社にてご負担願います。".into();

    let mut development = LineItem::blank();
    development.description = "Webサイト制作費".into();
    development.unit_price = 300_000.0;

    let mut supplies = LineItem::blank();
    supplies.description = "撮影用菓子材料".into();
    supplies.quantity = 2.0;
    supplies.unit_price = 5_000.0;
    supplies.unit = "個".into();
    supplies.tax_rate = TaxRate::Reduced;

    data.items = vec![development, supplies];
    data
}

fn editor_in(dir: &std::path::Path) -> Editor {
    let store = Store::open(&dir.join("seikyu.db")).unwrap();
    Editor::new(store).unwrap()
}

#[tokio::test]
async fn export_writes_a_wellformed_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());
    editor.update(|d| *d = sample_invoice()).unwrap();

    let totals = editor.totals();
    assert_eq!(totals.subtotal, 310_000.0);
    assert_eq!(totals.total_tax, 30_800.0);
    assert_eq!(totals.grand_total, 340_800.0);

    let outcome = editor
        .export(&FontSource::Builtin, dir.path())
        .await
        .unwrap();
    assert_eq!(
        outcome.path.file_name().unwrap().to_string_lossy(),
        "御請求書_INV-202508-007.pdf"
    );
    assert_eq!(outcome.pages, 1);

    let bytes = std::fs::read(&outcome.path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(outcome.bytes, bytes.len());
}

#[tokio::test]
async fn long_item_lists_paginate() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());
    editor
        .update(|d| {
            *d = sample_invoice();
            d.items = (0..45)
                .map(|n| {
                    let mut item = LineItem::blank();
                    item.description = format!("作業項目 その{n}");
                    item.unit_price = 10_000.0;
                    item
                })
                .collect();
        })
        .unwrap();

    let outcome = editor
        .export(&FontSource::Builtin, dir.path())
        .await
        .unwrap();
    assert!(outcome.pages >= 2, "expected pagination, got {} page(s)", outcome.pages);
}

#[tokio::test]
async fn receipt_template_exports_through_the_same_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());
    editor.update(|d| *d = sample_invoice()).unwrap();
    editor.set_template(TemplateId::Receipt);

    let outcome = editor
        .export(&FontSource::Builtin, dir.path())
        .await
        .unwrap();
    let bytes = std::fs::read(&outcome.path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn store_file_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("seikyu.db");

    {
        let mut editor = Editor::new(Store::open(&db).unwrap()).unwrap();
        editor.register("ao", "蒼", "1234").unwrap();
        editor.update(|d| *d = sample_invoice()).unwrap();
        editor
            .export(&FontSource::Builtin, dir.path())
            .await
            .unwrap();
    }

    let editor = Editor::new(Store::open(&db).unwrap()).unwrap();
    assert_eq!(editor.session().map(|u| u.email.as_str()), Some("ao@local"));
    assert_eq!(editor.data().invoice_number, "INV-202508-007");
    assert_eq!(editor.history().len(), 1);
    assert_eq!(editor.history()[0].data.client.name, "株式会社ひかり商事");
}

#[tokio::test]
async fn failed_export_leaves_no_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());
    editor.update(|d| *d = sample_invoice()).unwrap();

    let missing = FontSource::File(dir.path().join("no-such-font.ttf"));
    assert!(editor.export(&missing, dir.path()).await.is_err());
    assert!(!editor.is_exporting());

    let leftovers: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".pdf") || n.ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
}

#[tokio::test]
async fn export_feeds_the_email_draft() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = editor_in(dir.path());
    editor.update(|d| *d = sample_invoice()).unwrap();
    editor
        .export(&FontSource::Builtin, dir.path())
        .await
        .unwrap();

    let draft = editor.email_draft();
    assert_eq!(draft.subject, "【請求書送付のご案内】御請求書 (スタジオ蒼)");
    assert!(draft.body.contains("請求金額：¥340,800 (税込)"));
    assert!(draft.body.contains("お支払い期限：2025-09-05"));
}
