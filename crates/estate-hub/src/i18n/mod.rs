//! Translation resolution for the marketplace UI.
//!
//! Lookups never fail: a key that cannot be resolved degrades to a readable label built from
//! the key itself, and the miss is handed to the [`MissingTranslationReporter`] when one is
//! attached.

pub mod catalog;
pub mod interpolate;
pub mod key;
pub mod missing_log;
pub mod reporter;
pub mod router;
pub mod search;
pub mod translator;
pub mod tree;

pub use catalog::{CatalogError, Locale, MessageCatalog, UnsupportedLocale};
pub use interpolate::TranslationValues;
pub use key::{format_key, KeyError, TranslationKey};
pub use missing_log::{MissingLogEntry, MissingTranslationLog};
pub use reporter::{
    BatchMode, DeliveryState, HttpReportTransport, MissingTranslation, MissingTranslationBatch,
    MissingTranslationReporter, MissingTranslationStore, ReportOutcome, ReportTransport,
    RetryPolicy, TransportError,
};
pub use router::{i18n_router, I18nState};
pub use search::find;
pub use translator::{
    FlexibleTranslator, MissingKeySink, Resolution, ResolutionVerbosity, Translated,
};
pub use tree::{MessageNode, MessageTree};
