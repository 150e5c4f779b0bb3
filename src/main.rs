use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seikyu::address::AddressClient;
use seikyu::editor::{Editor, ZipTarget};
use seikyu::format::format_yen;
use seikyu::model::{default_invoice, registration_number_valid, DocumentKind, InvoiceData};
use seikyu::pdf::FontSource;
use seikyu::preset::INDUSTRY_PRESETS;
use seikyu::store::Store;
use seikyu::template::{TemplateId, DEFAULT_ACCENT};

#[derive(Parser, Debug)]
#[command(name = "seikyu", about = "請求書・見積書・領収書 PDF generator")]
struct Cli {
    /// SQLite store holding the draft, accounts, and history.
    #[arg(long, global = true, default_value = "seikyu.db")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a fresh document, replacing the current draft.
    New,

    /// Print the current draft as JSON.
    Draft,

    /// Replace the current draft from a JSON file.
    Load {
        file: PathBuf,
    },

    /// Totals and qualified-invoice checks for the current draft.
    Inspect,

    /// List the template catalog.
    Templates,

    /// List the industry presets, or apply one to the draft.
    Presets {
        /// Preset id to apply (see the list).
        #[arg(long)]
        apply: Option<String>,
    },

    /// Re-title the draft as another document kind.
    Convert {
        #[arg(value_enum)]
        kind: KindArg,
    },

    /// Resolve a Japanese postal code to an address.
    Lookup {
        /// Code to resolve; omit it with --fill to use the one already on
        /// the draft.
        zip: Option<String>,

        /// Write the result into the draft (issuer or client address).
        #[arg(long, value_enum)]
        fill: Option<FillTarget>,
    },

    /// Compose the PDF and report page count and size without writing it.
    Render(RenderArgs),

    /// Write the PDF, record it in history, and print the email draft.
    Export {
        #[command(flatten)]
        render: RenderArgs,

        /// Output directory.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// List export history, or reopen/delete a snapshot.
    History {
        /// Snapshot id to reopen in the draft.
        #[arg(long)]
        load: Option<String>,

        /// Snapshot id to delete.
        #[arg(long, conflicts_with = "load")]
        delete: Option<String>,
    },

    /// Create an account and sign in.
    Register {
        username: String,

        /// Display name; defaults to the user id.
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        pin: String,
    },

    /// Sign in.
    Login {
        username: String,

        #[arg(long)]
        pin: String,
    },

    /// Sign out.
    Logout,

    /// Save the draft's issuer block as the signed-in account's defaults.
    SavePrefs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Template id (see `templates`).
    #[arg(long)]
    template: Option<TemplateId>,

    /// Accent color as #rrggbb.
    #[arg(long, default_value = DEFAULT_ACCENT)]
    accent: String,

    /// Japanese TTF used for metrics and embedding. Without one the
    /// builtin PDF fonts are used, which carry no CJK glyphs.
    #[arg(long)]
    font: Option<PathBuf>,
}

impl RenderArgs {
    fn font_source(&self) -> FontSource {
        match &self.font {
            Some(path) => FontSource::File(path.clone()),
            None => FontSource::Builtin,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FillTarget {
    Issuer,
    Client,
}

impl From<FillTarget> for ZipTarget {
    fn from(t: FillTarget) -> ZipTarget {
        match t {
            FillTarget::Issuer => ZipTarget::Issuer,
            FillTarget::Client => ZipTarget::Client,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Invoice,
    Estimate,
    Delivery,
    Receipt,
    Acceptance,
}

impl From<KindArg> for DocumentKind {
    fn from(k: KindArg) -> DocumentKind {
        match k {
            KindArg::Invoice => DocumentKind::Invoice,
            KindArg::Estimate => DocumentKind::Estimate,
            KindArg::Delivery => DocumentKind::DeliveryNote,
            KindArg::Receipt => DocumentKind::Receipt,
            KindArg::Acceptance => DocumentKind::Acceptance,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,seikyu=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = ?e, "command failed");
        eprintln!("エラーが発生しました: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let store = Store::open(&cli.store)
        .with_context(|| format!("opening store {}", cli.store.display()))?;
    let mut editor = Editor::new(store).context("restoring the draft")?;

    match cli.command {
        Command::New => {
            editor.update(|d| *d = default_invoice())?;
            println!("新しい書類を作成しました: {}", editor.data().invoice_number);
        }

        Command::Draft => {
            println!("{}", serde_json::to_string_pretty(editor.data())?);
        }

        Command::Load { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let data: InvoiceData = serde_json::from_str(&json).context("parsing the draft")?;
            editor.update(|d| *d = data)?;
            println!("下書きを読み込みました: {}", editor.data().invoice_number);
        }

        Command::Inspect => print_inspection(&editor),

        Command::Templates => {
            for t in TemplateId::ALL {
                println!("{:<12} {}", t.id(), t.label());
            }
        }

        Command::Presets { apply } => match apply {
            Some(id) => {
                if !editor.apply_preset(&id)? {
                    anyhow::bail!("unknown preset id: {id}");
                }
                println!(
                    "プリセットを適用しました: {id} ({} 明細)",
                    editor.data().items.len()
                );
            }
            None => {
                for p in INDUSTRY_PRESETS {
                    println!("{} {:<14} {} ({} 明細)", p.icon, p.id, p.label, p.items.len());
                }
            }
        },

        Command::Convert { kind } => {
            let kind = DocumentKind::from(kind);
            editor.convert(kind)?;
            println!(
                "{}として複製を作成しました (番号: {})",
                kind.title(),
                editor.data().invoice_number
            );
        }

        Command::Lookup { zip, fill } => {
            let client = AddressClient::new();
            match fill {
                Some(target) => {
                    if let Some(z) = zip {
                        editor.update(|d| match target {
                            FillTarget::Issuer => d.issuer.zip_code = z,
                            FillTarget::Client => d.client.zip_code = Some(z),
                        })?;
                    }
                    if !editor.apply_zip(&client, target.into()).await? {
                        anyhow::bail!("住所が見つかりませんでした");
                    }
                    let filled = match target {
                        FillTarget::Issuer => editor.data().issuer.address.clone(),
                        FillTarget::Client => {
                            editor.data().client.address.clone().unwrap_or_default()
                        }
                    };
                    println!("住所を設定しました: {filled}");
                }
                None => {
                    let z = zip.ok_or_else(|| anyhow::anyhow!("zip code required"))?;
                    match client.lookup(&z).await {
                        Some(address) => println!("{address}"),
                        None => anyhow::bail!("住所が見つかりませんでした: {z}"),
                    }
                }
            }
        }

        Command::Render(render) => {
            if let Some(t) = render.template {
                editor.set_template(t);
            }
            editor.set_accent(render.accent.clone());
            let rendered = seikyu::pdf::render_document(
                editor.data(),
                &editor.totals(),
                editor.template(),
                editor.accent(),
                &render.font_source(),
            )?;
            println!(
                "{}: {}ページ, {} bytes",
                seikyu::pdf::document_filename(editor.data()),
                rendered.pages,
                rendered.bytes.len()
            );
        }

        Command::Export { render, out } => {
            if let Some(t) = render.template {
                editor.set_template(t);
            }
            editor.set_accent(render.accent.clone());
            let outcome = editor.export(&render.font_source(), &out).await?;
            println!(
                "PDFをダウンロードしました ✨ {} ({}ページ, {} bytes)",
                outcome.path.display(),
                outcome.pages,
                outcome.bytes
            );
            println!("※いかなる損害についても当サービスは責任を負いません。");
            println!();
            println!("{}", editor.email_draft().clipboard_text());
        }

        Command::History { load, delete } => {
            if let Some(id) = load {
                if !editor.load_snapshot(&id)? {
                    anyhow::bail!("no snapshot with id {id}");
                }
                println!("履歴を読み込みました: {}", editor.data().invoice_number);
            } else if let Some(id) = delete {
                if !editor.delete_snapshot(&id).await? {
                    anyhow::bail!("no snapshot with id {id}");
                }
                println!("履歴を削除しました: {id}");
            } else if editor.history().is_empty() {
                println!("履歴はありません");
            } else {
                for h in editor.history() {
                    println!(
                        "{}  {}  {}  {}  [{}]",
                        h.id,
                        h.data.invoice_number,
                        h.data.client.name,
                        h.template_id.id(),
                        h.created_at
                    );
                }
            }
        }

        Command::Register { username, name, pin } => {
            let display = name.unwrap_or_else(|| username.clone());
            let profile = editor.register(&username, &display, &pin)?;
            println!("ようこそ、{}さん ({})", profile.name, profile.email);
        }

        Command::Login { username, pin } => {
            let profile = editor.login(&username, &pin)?;
            println!("おかえりなさい、{}さん", profile.name);
        }

        Command::Logout => {
            editor.logout()?;
            println!("ログアウトしました");
        }

        Command::SavePrefs => {
            if !editor.save_preferences()? {
                anyhow::bail!("ログインしていません");
            }
            println!("発行者情報を保存しました");
        }
    }

    Ok(())
}

fn print_inspection(editor: &Editor) {
    let data = editor.data();
    let totals = editor.totals();

    println!("{} {}", data.title, data.invoice_number);
    println!("発行日: {} / 支払期限: {}", data.date, data.due_date);
    println!("明細 {} 件", data.items.len());
    println!("小計 (税抜): {}", format_yen(totals.subtotal));
    for summary in &totals.tax_summaries {
        let pct = (summary.rate * 100.0).round() as i64;
        println!(
            "  {}% 対象: {} (税額 {})",
            pct,
            format_yen(summary.taxable_amount),
            format_yen(summary.tax_amount)
        );
    }
    println!("消費税計: {}", format_yen(totals.total_tax));
    println!("合計 (税込): {}", format_yen(totals.grand_total));

    let reg = &data.issuer.registration_number;
    if reg.is_empty() {
        println!("登録番号: 未入力");
    } else if registration_number_valid(reg) {
        println!("登録番号: {reg} (適格)");
    } else {
        println!("登録番号: {reg} (形式不正: T+13桁)");
    }
}
