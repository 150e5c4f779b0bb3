pub mod address;
pub mod editor;
pub mod email;
pub mod error;
pub mod format;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod preset;
pub mod store;
pub mod tax;
pub mod template;
pub mod text;

pub use error::{Error, Result};
pub use model::{InvoiceData, InvoiceTotals, LineItem, SavedInvoice, TaxRate, UserProfile};
pub use template::TemplateId;
