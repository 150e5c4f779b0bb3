//! Form/state controller. Owns the working document, the selected
//! template and accent, the session, the history cache, and the export
//! busy flag. Every mutation autosaves the draft for the active scope, so
//! closing the app never loses work.

use std::path::Path;

use rand::Rng;
use time::{Duration, OffsetDateTime};
use tracing::warn;
use uuid::Uuid;

use crate::address::AddressClient;
use crate::email::EmailDraft;
use crate::error::{Error, Result};
use crate::model::{
    default_invoice, ymd, DocumentKind, InvoiceData, InvoiceTotals, LineItem, SavedInvoice,
    UserProfile,
};
use crate::pdf::{self, ExportOutcome, FontSource};
use crate::preset;
use crate::store::{CloudStore, Store, GUEST_SCOPE};
use crate::tax;
use crate::template::{TemplateId, DEFAULT_ACCENT};

/// Which party's address a zip lookup fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipTarget {
    Issuer,
    Client,
}

pub struct Editor {
    data: InvoiceData,
    template: TemplateId,
    // last non-receipt pick, restored when converting away from 領収書
    previous_template: TemplateId,
    accent: String,
    session: Option<UserProfile>,
    history: Vec<SavedInvoice>,
    exporting: bool,
    store: Store,
    cloud: Option<Box<dyn CloudStore>>,
}

impl Editor {
    /// Opens the editor: restores the signed-in session if one exists,
    /// then that scope's draft. A missing draft starts from the defaults.
    pub fn new(store: Store) -> Result<Editor> {
        let session = store.current_user()?;
        let scope = scope_of(session.as_ref());
        let data = store.load_draft(&scope)?.unwrap_or_else(default_invoice);
        let history = match &session {
            Some(user) => store.list_history(&user.email)?,
            None => Vec::new(),
        };
        Ok(Editor {
            data,
            template: TemplateId::Modern,
            previous_template: TemplateId::Modern,
            accent: DEFAULT_ACCENT.to_string(),
            session,
            history,
            exporting: false,
            store,
            cloud: None,
        })
    }

    /// Attaches an optional remote history mirror.
    pub fn with_cloud(mut self, cloud: Box<dyn CloudStore>) -> Editor {
        self.cloud = Some(cloud);
        self
    }

    pub fn data(&self) -> &InvoiceData {
        &self.data
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    pub fn accent(&self) -> &str {
        &self.accent
    }

    pub fn session(&self) -> Option<&UserProfile> {
        self.session.as_ref()
    }

    pub fn history(&self) -> &[SavedInvoice] {
        &self.history
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Totals for the document as it stands. Computed on demand; the item
    /// list is the only input.
    pub fn totals(&self) -> InvoiceTotals {
        tax::aggregate(&self.data.items)
    }

    /// Draft of the hand-off mail for the document as it stands.
    pub fn email_draft(&self) -> EmailDraft {
        EmailDraft::new(&self.data, &self.totals())
    }

    /// Runs an edit over the document, then autosaves the draft for the
    /// active scope. All form mutations funnel through here.
    pub fn update(&mut self, f: impl FnOnce(&mut InvoiceData)) -> Result<()> {
        f(&mut self.data);
        self.autosave()
    }

    pub fn add_item(&mut self) -> Result<()> {
        self.update(|d| d.items.push(LineItem::blank()))
    }

    pub fn remove_item(&mut self, item_id: &str) -> Result<()> {
        self.update(|d| d.items.retain(|i| i.id != item_id))
    }

    /// Appends a copy of the row under a fresh id. Unknown ids are a no-op.
    pub fn duplicate_item(&mut self, item_id: &str) -> Result<()> {
        self.update(|d| {
            if let Some(src) = d.items.iter().find(|i| i.id == item_id) {
                let mut copy = src.clone();
                copy.id = Uuid::new_v4().to_string();
                d.items.push(copy);
            }
        })
    }

    /// Edits one row in place. Unknown ids are a no-op.
    pub fn update_item(&mut self, item_id: &str, f: impl FnOnce(&mut LineItem)) -> Result<()> {
        self.update(|d| {
            if let Some(item) = d.items.iter_mut().find(|i| i.id == item_id) {
                f(item);
            }
        })
    }

    /// Replaces the item list with a fresh copy of an industry preset.
    /// Returns false when the id names no preset.
    pub fn apply_preset(&mut self, preset_id: &str) -> Result<bool> {
        match preset::find_preset(preset_id) {
            Some(p) => {
                let items = p.to_items();
                self.update(|d| d.items = items)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_template(&mut self, template: TemplateId) {
        if !template.is_receipt() {
            self.previous_template = template;
        }
        self.template = template;
    }

    pub fn set_accent(&mut self, hex: impl Into<String>) {
        self.accent = hex.into();
    }

    /// Re-titles the document as another kind: the kind's number prefix
    /// with a fresh random 3-digit suffix, issue date today, due date in
    /// 14 days. Items, parties, and notes carry over. Converting to 領収書
    /// also switches to the thermal template; converting away restores the
    /// previous pick.
    pub fn convert(&mut self, kind: DocumentKind) -> Result<()> {
        let number = fresh_number(kind);
        let today = OffsetDateTime::now_utc();
        let due = today + Duration::days(14);
        self.update(|d| {
            d.title = kind.title().to_string();
            d.invoice_number = number;
            d.date = ymd(today);
            d.due_date = ymd(due);
        })?;
        if kind == DocumentKind::Receipt {
            if !self.template.is_receipt() {
                self.previous_template = self.template;
            }
            self.template = TemplateId::Receipt;
        } else if self.template.is_receipt() {
            self.template = self.previous_template;
        }
        Ok(())
    }

    /// Fills in the selected party's address when the zip resolves.
    /// Misses and network failures leave the field alone and return false.
    pub async fn apply_zip(&mut self, client: &AddressClient, target: ZipTarget) -> Result<bool> {
        let zip = match target {
            ZipTarget::Issuer => self.data.issuer.zip_code.clone(),
            ZipTarget::Client => self.data.client.zip_code.clone().unwrap_or_default(),
        };
        if zip.is_empty() {
            return Ok(false);
        }
        match client.lookup(&zip).await {
            Some(address) => {
                self.update(|d| match target {
                    ZipTarget::Issuer => d.issuer.address = address,
                    ZipTarget::Client => d.client.address = Some(address),
                })?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Creates an account and signs it in.
    pub fn register(&mut self, username: &str, display_name: &str, pin: &str) -> Result<UserProfile> {
        let profile = self.store.register(username, display_name, pin)?;
        self.enter_session(profile.clone())?;
        Ok(profile)
    }

    /// Signs in: the account's saved issuer defaults replace the form's
    /// issuer block, and its history is loaded.
    pub fn login(&mut self, username: &str, pin: &str) -> Result<UserProfile> {
        let profile = self.store.login(username, pin)?;
        self.enter_session(profile.clone())?;
        Ok(profile)
    }

    /// Ends the session. The working document stays in the form and drops
    /// back to autosaving under the guest slot; history is user-scoped so
    /// the cache empties.
    pub fn logout(&mut self) -> Result<()> {
        self.store.logout()?;
        self.session = None;
        self.history.clear();
        self.autosave()
    }

    /// Stores the current issuer block as the signed-in account's
    /// defaults. Returns false when nobody is signed in.
    pub fn save_preferences(&self) -> Result<bool> {
        match &self.session {
            Some(user) => {
                self.store.save_preferences(&user.email, &self.data.issuer)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reopens a history snapshot in the form, restoring its template.
    pub fn load_snapshot(&mut self, invoice_id: &str) -> Result<bool> {
        let Some(saved) = self.history.iter().find(|h| h.id == invoice_id).cloned() else {
            return Ok(false);
        };
        self.set_template(saved.template_id);
        self.update(|d| *d = saved.data)?;
        Ok(true)
    }

    /// Deletes a history snapshot locally and, best-effort, from the
    /// cloud mirror.
    pub async fn delete_snapshot(&mut self, invoice_id: &str) -> Result<bool> {
        let Some(user) = self.session.clone() else {
            return Ok(false);
        };
        let removed = self.store.delete_history(&user.email, invoice_id)?;
        if removed {
            self.history.retain(|h| h.id != invoice_id);
            if let Some(cloud) = &self.cloud {
                if let Err(e) = cloud.delete(&user.id, invoice_id).await {
                    warn!(error = %e, "cloud history delete failed");
                }
            }
        }
        Ok(removed)
    }

    /// Renders and writes the PDF. A second export requested while one is
    /// running is rejected; the flag clears on success and failure alike.
    /// On success the snapshot goes to the signed-in user's history and,
    /// best-effort, to the cloud mirror.
    pub async fn export(&mut self, source: &FontSource, out_dir: &Path) -> Result<ExportOutcome> {
        if self.exporting {
            return Err(Error::ExportInProgress);
        }
        self.exporting = true;
        let result = self.export_inner(source, out_dir).await;
        self.exporting = false;
        result
    }

    async fn export_inner(&mut self, source: &FontSource, out_dir: &Path) -> Result<ExportOutcome> {
        let totals = self.totals();
        let outcome = pdf::export_document(
            &self.data,
            &totals,
            self.template,
            &self.accent,
            source,
            out_dir,
        )?;
        if let Some(user) = self.session.clone() {
            let saved = SavedInvoice::snapshot(&self.data, self.template);
            self.store.upsert_history(&user.email, &saved)?;
            if let Some(cloud) = &self.cloud {
                if let Err(e) = cloud.upsert(&user.id, &saved).await {
                    warn!(error = %e, "cloud history mirror failed");
                }
            }
            self.history.insert(0, saved);
        }
        Ok(outcome)
    }

    fn autosave(&self) -> Result<()> {
        let scope = scope_of(self.session.as_ref());
        self.store.save_draft(&scope, &self.data)
    }

    fn enter_session(&mut self, profile: UserProfile) -> Result<()> {
        if let Some(issuer) = self.store.load_preferences(&profile.email)? {
            self.data.issuer = issuer;
        }
        self.history = self.store.list_history(&profile.email)?;
        self.session = Some(profile);
        self.autosave()
    }

    #[cfg(test)]
    fn force_exporting(&mut self, v: bool) {
        self.exporting = v;
    }
}

fn scope_of(session: Option<&UserProfile>) -> String {
    session.map_or_else(|| GUEST_SCOPE.to_string(), |u| u.email.clone())
}

fn fresh_number(kind: DocumentKind) -> String {
    let today = OffsetDateTime::now_utc();
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!(
        "{}-{:04}{:02}-{:03}",
        kind.number_prefix(),
        today.year(),
        u8::from(today.month()),
        suffix
    )
}
