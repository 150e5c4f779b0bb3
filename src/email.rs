//! Courtesy-mail synthesis for a finished document.
//!
//! After an export the user gets a ready-to-send Japanese business mail:
//! subject, plain-text body, and (when the PDF bytes are at hand) a full
//! RFC 5322 message with the file attached. Transport is out of scope;
//! callers copy the text, open a `mailto:` link, or save an `.eml` file.

use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;

use crate::error::{Error, Result};
use crate::format::format_yen;
use crate::model::{InvoiceData, InvoiceTotals};
use crate::pdf::document_filename;

const RULE: &str = "--------------------------------------------------";
const SIGNATURE_RULE: &str = "==================================================";

/// Ready-to-copy mail draft accompanying an exported document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

impl EmailDraft {
    /// Builds the draft from the document and its computed totals. The
    /// quoted amount is the tax-inclusive grand total; the due date is
    /// passed through as entered.
    pub fn new(data: &InvoiceData, totals: &InvoiceTotals) -> Self {
        let subject = format!(
            "【請求書送付のご案内】{} ({})",
            data.title, data.issuer.name
        );

        let mut body = String::new();
        body.push_str(&format!("{} 御中\n\n", data.client.name));
        body.push_str("お世話になっております。\n");
        body.push_str(&format!("{}です。\n\n", data.issuer.name));
        body.push_str(&format!(
            "表題の件、{}を送付させていただきます。\n",
            data.title
        ));
        body.push_str("ご査収のほど、よろしくお願い申し上げます。\n\n");
        body.push_str(RULE);
        body.push('\n');
        body.push_str(&format!(
            "請求金額：{} (税込)\n",
            format_yen(totals.grand_total)
        ));
        body.push_str(&format!("お支払い期限：{}\n", data.due_date));
        body.push_str(RULE);
        body.push_str("\n\n");
        body.push_str("ご不明な点がございましたら、お気軽にお問い合わせください。\n");
        body.push_str("今後ともよろしくお願い申し上げます。\n\n");
        body.push_str(SIGNATURE_RULE);
        body.push('\n');
        body.push_str(&data.issuer.name);
        body.push('\n');
        if !data.issuer.email.is_empty() {
            body.push_str(&format!("Email: {}\n", data.issuer.email));
        }
        if !data.issuer.phone.is_empty() {
            body.push_str(&format!("Tel: {}\n", data.issuer.phone));
        }
        body.push_str(SIGNATURE_RULE);

        EmailDraft { subject, body }
    }

    /// Full text for the copy-to-clipboard button.
    pub fn clipboard_text(&self) -> String {
        format!("件名：{}\n\n{}", self.subject, self.body)
    }

    /// `mailto:` URL that opens the user's mail client with the draft
    /// filled in.
    pub fn mailto_url(&self) -> String {
        format!(
            "mailto:?subject={}&body={}",
            urlencoding::encode(&self.subject),
            urlencoding::encode(&self.body)
        )
    }
}

/// Assembles the complete message: multipart/alternative text plus, when
/// given, the exported PDF as an `application/pdf` attachment named after
/// the document.
pub fn build_message(
    draft: &EmailDraft,
    from: &str,
    to: &str,
    data: &InvoiceData,
    pdf_bytes: Option<Vec<u8>>,
) -> Result<Message> {
    let from_mailbox: Mailbox = from
        .parse()
        .map_err(|_| Error::Email(format!("invalid sender address: {from}")))?;
    let to_mailbox: Mailbox = to
        .parse()
        .map_err(|_| Error::Email(format!("invalid recipient address: {to}")))?;

    let alternative = MultiPart::alternative()
        .singlepart(SinglePart::plain(draft.body.clone()))
        .singlepart(SinglePart::html(html_body(&draft.body)));

    let builder = Message::builder()
        .from(from_mailbox)
        .to(to_mailbox)
        .subject(draft.subject.clone());

    let message = match pdf_bytes {
        Some(bytes) => {
            let content_type = ContentType::parse("application/pdf")
                .map_err(|e| Error::Email(format!("attachment content type: {e}")))?;
            let attachment = Attachment::new(document_filename(data)).body(bytes, content_type);
            builder
                .multipart(
                    MultiPart::mixed()
                        .multipart(alternative)
                        .singlepart(attachment),
                )
                .map_err(|e| Error::Email(format!("message assembly: {e}")))?
        }
        None => builder
            .multipart(alternative)
            .map_err(|e| Error::Email(format!("message assembly: {e}")))?,
    };

    Ok(message)
}

/// Writes the message in wire format so it can be opened by a mail client.
pub fn write_eml(message: &Message, path: &Path) -> Result<()> {
    std::fs::write(path, message.formatted())?;
    Ok(())
}

/// The body is authored as plain text; the HTML alternative preserves its
/// spacing verbatim.
fn html_body(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!("<pre style=\"font-family: inherit; white-space: pre-wrap;\">{escaped}</pre>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_invoice;

    fn fixture() -> (InvoiceData, InvoiceTotals) {
        let mut data = default_invoice();
        data.title = "御請求書".into();
        data.invoice_number = "INV-2025-08-001".into();
        data.due_date = "2025-09-30".into();
        data.issuer.name = "スタジオ蒼".into();
        data.issuer.email = "ao@example.jp".into();
        data.issuer.phone = "03-1234-5678".into();
        data.client.name = "株式会社ひかり商事".into();
        let totals = InvoiceTotals {
            subtotal: 105_000.0,
            total_tax: 10_500.0,
            grand_total: 115_500.0,
            tax_summaries: vec![],
        };
        (data, totals)
    }

    #[test]
    fn subject_names_title_and_issuer() {
        let (data, totals) = fixture();
        let draft = EmailDraft::new(&data, &totals);
        assert_eq!(draft.subject, "【請求書送付のご案内】御請求書 (スタジオ蒼)");
    }

    #[test]
    fn body_opens_with_the_recipient() {
        let (data, totals) = fixture();
        let draft = EmailDraft::new(&data, &totals);
        assert!(draft.body.starts_with("株式会社ひかり商事 御中\n\n"));
    }

    #[test]
    fn body_quotes_the_grand_total_and_due_date() {
        let (data, totals) = fixture();
        let draft = EmailDraft::new(&data, &totals);
        assert!(draft.body.contains("請求金額：¥115,500 (税込)\n"));
        assert!(draft.body.contains("お支払い期限：2025-09-30\n"));
    }

    #[test]
    fn separator_rules_are_fifty_chars() {
        let (data, totals) = fixture();
        let draft = EmailDraft::new(&data, &totals);
        let dashes: Vec<&str> = draft
            .body
            .lines()
            .filter(|l| !l.is_empty() && l.chars().all(|c| c == '-'))
            .collect();
        let equals: Vec<&str> = draft
            .body
            .lines()
            .filter(|l| !l.is_empty() && l.chars().all(|c| c == '='))
            .collect();
        assert_eq!(dashes.len(), 2);
        assert_eq!(equals.len(), 2);
        assert!(dashes.iter().chain(equals.iter()).all(|l| l.len() == 50));
    }

    #[test]
    fn signature_lists_contact_lines_in_order() {
        let (data, totals) = fixture();
        let draft = EmailDraft::new(&data, &totals);
        assert!(draft
            .body
            .contains("スタジオ蒼\nEmail: ao@example.jp\nTel: 03-1234-5678\n="));
        assert!(draft.body.ends_with(SIGNATURE_RULE));
    }

    #[test]
    fn signature_skips_empty_contact_fields() {
        let (mut data, totals) = fixture();
        data.issuer.email.clear();
        data.issuer.phone.clear();
        let draft = EmailDraft::new(&data, &totals);
        assert!(!draft.body.contains("Email:"));
        assert!(!draft.body.contains("Tel:"));
        assert!(draft
            .body
            .ends_with(&format!("スタジオ蒼\n{SIGNATURE_RULE}")));
    }

    #[test]
    fn clipboard_text_prefixes_the_subject() {
        let (data, totals) = fixture();
        let draft = EmailDraft::new(&data, &totals);
        let text = draft.clipboard_text();
        assert!(text.starts_with("件名：【請求書送付のご案内】"));
        assert!(text.contains("\n\n株式会社ひかり商事 御中"));
    }

    #[test]
    fn mailto_url_is_percent_encoded() {
        let (data, totals) = fixture();
        let draft = EmailDraft::new(&data, &totals);
        let url = draft.mailto_url();
        assert!(url.starts_with("mailto:?subject=%E3%80%90"));
        assert!(url.contains("&body="));
        assert!(!url.contains('【'));
        assert!(!url.contains(' '));
    }

    #[test]
    fn message_carries_the_pdf_attachment() {
        let (data, totals) = fixture();
        let draft = EmailDraft::new(&data, &totals);
        let message = build_message(
            &draft,
            "billing@example.jp",
            "hikari@example.co.jp",
            &data,
            Some(b"%PDF-1.3 stub".to_vec()),
        )
        .unwrap();
        let wire = String::from_utf8_lossy(&message.formatted()).into_owned();
        assert!(wire.contains("multipart/mixed"));
        assert!(wire.contains("multipart/alternative"));
        assert!(wire.contains("application/pdf"));
        // base64 of the %PDF magic
        assert!(wire.contains("JVBE"));
    }

    #[test]
    fn message_without_pdf_is_alternative_only() {
        let (data, totals) = fixture();
        let draft = EmailDraft::new(&data, &totals);
        let message =
            build_message(&draft, "billing@example.jp", "hikari@example.co.jp", &data, None)
                .unwrap();
        let wire = String::from_utf8_lossy(&message.formatted()).into_owned();
        assert!(wire.contains("multipart/alternative"));
        assert!(!wire.contains("application/pdf"));
    }

    #[test]
    fn bad_addresses_are_rejected() {
        let (data, totals) = fixture();
        let draft = EmailDraft::new(&data, &totals);
        let err = build_message(&draft, "not an address", "hikari@example.co.jp", &data, None)
            .unwrap_err();
        assert!(matches!(err, Error::Email(_)));
    }

    #[test]
    fn html_alternative_escapes_markup() {
        let html = html_body("a<b & c>d");
        assert!(html.contains("a&lt;b &amp; c&gt;d"));
        assert!(html.starts_with("<pre"));
    }

    #[test]
    fn eml_file_round_trips_to_disk() {
        let (data, totals) = fixture();
        let draft = EmailDraft::new(&data, &totals);
        let message =
            build_message(&draft, "billing@example.jp", "hikari@example.co.jp", &data, None)
                .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.eml");
        write_eml(&message, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("MIME-Version: 1.0"));
    }
}
