use super::catalog::Locale;
use super::interpolate::{format_message, substitute_placeholders, TranslationValues};
use super::key::{format_key, TranslationKey};
use super::search;
use super::tree::MessageTree;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Whether every resolution branch is logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolutionVerbosity {
    #[default]
    Quiet,
    Verbose,
}

/// Branch of the fallback chain that produced a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Namespace,
    Root,
    Flexible,
    Default,
    Formatted,
}

impl Resolution {
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Namespace => "namespace",
            Resolution::Root => "root",
            Resolution::Flexible => "flexible",
            Resolution::Default => "default",
            Resolution::Formatted => "formatted",
        }
    }

    /// True when nothing in the message tree matched the key.
    pub fn is_miss(&self) -> bool {
        matches!(self, Resolution::Default | Resolution::Formatted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Translated {
    pub text: String,
    pub resolution: Resolution,
}

/// Receives keys that could not be resolved from the message tree.
pub trait MissingKeySink: Send + Sync {
    fn missing(&self, locale: Locale, key: &str);
}

/// Resolves keys for one locale, degrading through the fallback chain instead of failing.
#[derive(Clone)]
pub struct FlexibleTranslator {
    locale: Locale,
    messages: Arc<MessageTree>,
    verbosity: ResolutionVerbosity,
    sink: Option<Arc<dyn MissingKeySink>>,
}

impl fmt::Debug for FlexibleTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlexibleTranslator")
            .field("locale", &self.locale)
            .field("verbosity", &self.verbosity)
            .field("reports_missing", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl FlexibleTranslator {
    pub fn new(locale: Locale, messages: Arc<MessageTree>) -> Self {
        Self {
            locale,
            messages,
            verbosity: ResolutionVerbosity::default(),
            sink: None,
        }
    }

    pub fn with_verbosity(mut self, verbosity: ResolutionVerbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_missing_sink(mut self, sink: Arc<dyn MissingKeySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn translate(
        &self,
        key: &str,
        namespace: Option<&str>,
        values: &TranslationValues,
    ) -> String {
        self.resolve(key, namespace, values).text
    }

    pub fn resolve(
        &self,
        key: &str,
        namespace: Option<&str>,
        values: &TranslationValues,
    ) -> Translated {
        let namespace = namespace.map(str::trim).filter(|ns| !ns.is_empty());
        let scoped = namespace.and_then(|ns| self.messages.subtree(ns));

        let resolved = if let Some(text) = scoped.and_then(|tree| tree.lookup(key)) {
            Translated {
                text: format_message(text, values),
                resolution: Resolution::Namespace,
            }
        } else if let Some(text) = self.messages.lookup(key) {
            Translated {
                text: format_message(text, values),
                resolution: Resolution::Root,
            }
        } else if let Some(text) = scoped
            .and_then(|tree| search::find(tree, key))
            .or_else(|| search::find(&self.messages, key))
        {
            Translated {
                text: substitute_placeholders(text, values),
                resolution: Resolution::Flexible,
            }
        } else if let Some(text) = values.default_text() {
            Translated {
                text: text.to_string(),
                resolution: Resolution::Default,
            }
        } else {
            Translated {
                text: format_key(key),
                resolution: Resolution::Formatted,
            }
        };

        if self.verbosity == ResolutionVerbosity::Verbose {
            info!(
                locale = self.locale.code(),
                key,
                namespace = namespace.unwrap_or_default(),
                branch = resolved.resolution.label(),
                "translation resolved"
            );
        }

        if resolved.resolution.is_miss() {
            if let Some(sink) = &self.sink {
                sink.missing(self.locale, &TranslationKey::qualified(namespace, key));
            }
        }

        resolved
    }
}
