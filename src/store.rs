//! SQLite-backed persistence: the current draft, per-user issuer
//! preferences, export history, and local accounts. Rows carry a few
//! queryable columns plus the full record as JSON, so schema churn stays
//! cheap.
//!
//! Data is scoped by user email, with [`GUEST_SCOPE`] for everything done
//! before login. A `CloudStore` mirror can shadow the history table; local
//! writes always happen first.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{InvoiceData, Issuer, SavedInvoice, UserProfile};

/// Scope key for data saved before any login.
pub const GUEST_SCOPE: &str = "guest";

const CURRENT_USER_KEY: &str = "current_user";

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Store> {
        let conn = Connection::open(path)?;
        Store::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Store> {
        Store::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Store> {
        configure_sqlite(&conn)?;
        init_schema(&conn)?;
        apply_migrations(&conn)?;
        Ok(Store { conn })
    }

    // --- Accounts ---

    /// Create a local account and start a session for it.
    pub fn register(&self, username: &str, display_name: &str, pin: &str) -> Result<UserProfile> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT username FROM accounts WHERE username = ?1",
                params![username],
                |r| r.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(Error::AccountExists(username.to_string()));
        }

        let profile = UserProfile {
            id: Uuid::new_v4().to_string(),
            name: display_name.to_string(),
            email: format!("{username}@local"),
            avatar_url: avatar_url(display_name),
        };
        let profile_json = serde_json::to_string(&profile)?;
        self.conn.execute(
            "INSERT INTO accounts(username, pinHash, profileJson, createdAt) VALUES(?1, ?2, ?3, ?4)",
            params![username, hash_pin(pin), profile_json, now_iso()],
        )?;
        self.set_meta(CURRENT_USER_KEY, &profile_json)?;
        debug!(username, "registered account");
        Ok(profile)
    }

    /// Check a pin and start a session.
    pub fn login(&self, username: &str, pin: &str) -> Result<UserProfile> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT pinHash, profileJson FROM accounts WHERE username = ?1",
                params![username],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let (pin_hash, profile_json) = row.ok_or(Error::UnknownUser)?;
        if pin_hash != hash_pin(pin) {
            return Err(Error::WrongPin);
        }
        let profile: UserProfile = serde_json::from_str(&profile_json)?;
        self.set_meta(CURRENT_USER_KEY, &profile_json)?;
        Ok(profile)
    }

    pub fn logout(&self) -> Result<()> {
        self.conn.execute(
            "DELETE FROM app_meta WHERE key = ?1",
            params![CURRENT_USER_KEY],
        )?;
        Ok(())
    }

    /// The session persisted by the last register/login, if any.
    pub fn current_user(&self) -> Result<Option<UserProfile>> {
        let json = self.get_meta(CURRENT_USER_KEY)?;
        Ok(json.and_then(|j| serde_json::from_str::<UserProfile>(&j).ok()))
    }

    // --- Draft ---

    pub fn save_draft(&self, scope: &str, data: &InvoiceData) -> Result<()> {
        let json = serde_json::to_string(data)?;
        self.conn.execute(
            "INSERT INTO drafts(scope, dataJson, updatedAt) VALUES(?1, ?2, ?3)
             ON CONFLICT(scope) DO UPDATE SET dataJson = excluded.dataJson, updatedAt = excluded.updatedAt",
            params![scope, json, now_iso()],
        )?;
        Ok(())
    }

    /// A draft that no longer parses is treated as absent rather than an
    /// error; the caller falls back to a fresh document.
    pub fn load_draft(&self, scope: &str) -> Result<Option<InvoiceData>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT dataJson FROM drafts WHERE scope = ?1",
                params![scope],
                |r| r.get(0),
            )
            .optional()?;
        Ok(json.and_then(|j| serde_json::from_str::<InvoiceData>(&j).ok()))
    }

    // --- Issuer preferences ---

    pub fn save_preferences(&self, scope: &str, issuer: &Issuer) -> Result<()> {
        let json = serde_json::to_string(issuer)?;
        self.conn.execute(
            "INSERT INTO preferences(scope, issuerJson, updatedAt) VALUES(?1, ?2, ?3)
             ON CONFLICT(scope) DO UPDATE SET issuerJson = excluded.issuerJson, updatedAt = excluded.updatedAt",
            params![scope, json, now_iso()],
        )?;
        Ok(())
    }

    pub fn load_preferences(&self, scope: &str) -> Result<Option<Issuer>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT issuerJson FROM preferences WHERE scope = ?1",
                params![scope],
                |r| r.get(0),
            )
            .optional()?;
        Ok(json.and_then(|j| serde_json::from_str::<Issuer>(&j).ok()))
    }

    // --- Export history ---

    /// Insert or replace by invoice id.
    pub fn upsert_history(&self, scope: &str, invoice: &SavedInvoice) -> Result<()> {
        let json = serde_json::to_string(invoice)?;
        self.conn.execute(
            "INSERT INTO history(id, scope, createdAt, templateId, dataJson) VALUES(?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 scope = excluded.scope,
                 createdAt = excluded.createdAt,
                 templateId = excluded.templateId,
                 dataJson = excluded.dataJson",
            params![
                invoice.id,
                scope,
                invoice.created_at,
                invoice.template_id.id(),
                json,
            ],
        )?;
        Ok(())
    }

    /// Newest first. Rows that no longer parse are skipped.
    pub fn list_history(&self, scope: &str) -> Result<Vec<SavedInvoice>> {
        let mut stmt = self.conn.prepare(
            "SELECT dataJson FROM history WHERE scope = ?1 ORDER BY createdAt DESC",
        )?;
        let mut rows = stmt.query(params![scope])?;
        let mut out: Vec<SavedInvoice> = Vec::new();
        while let Some(row) = rows.next()? {
            let json: String = row.get(0)?;
            if let Ok(saved) = serde_json::from_str::<SavedInvoice>(&json) {
                out.push(saved);
            }
        }
        Ok(out)
    }

    pub fn delete_history(&self, scope: &str, invoice_id: &str) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM history WHERE scope = ?1 AND id = ?2",
            params![scope, invoice_id],
        )?;
        Ok(n > 0)
    }

    // --- app_meta ---

    fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM app_meta WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO app_meta(key, value) VALUES(?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Optional remote mirror of the history table. Implementations are
/// expected to be best-effort: the local row is already written when any
/// of these run, and failures are logged, not propagated to the user.
#[async_trait]
pub trait CloudStore: Send + Sync {
    async fn upsert(&self, user_id: &str, invoice: &SavedInvoice) -> anyhow::Result<()>;
    async fn list(&self, user_id: &str) -> anyhow::Result<Vec<SavedInvoice>>;
    async fn delete(&self, user_id: &str, invoice_id: &str) -> anyhow::Result<()>;
}

fn configure_sqlite(conn: &Connection) -> std::result::Result<(), rusqlite::Error> {
    // PRAGMAs apply on open, outside any transaction.
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;\n\
         PRAGMA synchronous = NORMAL;\n\
         PRAGMA foreign_keys = ON;\n\
         PRAGMA temp_store = MEMORY;\n\
         PRAGMA busy_timeout = 5000;\n",
    )?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn init_schema(conn: &Connection) -> std::result::Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS app_meta (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS accounts (
            username TEXT PRIMARY KEY NOT NULL,
            pinHash TEXT NOT NULL,
            profileJson TEXT NOT NULL,
            createdAt TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS drafts (
            scope TEXT PRIMARY KEY NOT NULL,
            dataJson TEXT NOT NULL,
            updatedAt TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS preferences (
            scope TEXT PRIMARY KEY NOT NULL,
            issuerJson TEXT NOT NULL,
            updatedAt TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS history (
            id TEXT PRIMARY KEY NOT NULL,
            scope TEXT NOT NULL,
            createdAt INTEGER NOT NULL,
            templateId TEXT NOT NULL,
            dataJson TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_history_scope ON history(scope, createdAt);
        "#,
    )?;
    Ok(())
}

fn apply_migrations(conn: &Connection) -> std::result::Result<(), rusqlite::Error> {
    let v: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if v == 0 {
        conn.execute_batch("PRAGMA user_version = 1;")?;
    }
    Ok(())
}

fn hash_pin(pin: &str) -> String {
    hex::encode(Sha256::digest(pin.as_bytes()))
}

fn avatar_url(display_name: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=random&color=fff&size=128",
        urlencoding::encode(display_name)
    )
}

fn now_iso() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
