use super::translator::{FlexibleTranslator, MissingKeySink, ResolutionVerbosity};
use super::tree::MessageTree;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use unic_langid::LanguageIdentifier;

/// Locales the marketplace ships message documents for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ru,
    Th,
    Es,
    Ar,
    Cmn,
    Fr,
    Ind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale '{0}'")]
pub struct UnsupportedLocale(pub String);

impl Locale {
    pub const ALL: [Locale; 8] = [
        Locale::En,
        Locale::Ru,
        Locale::Th,
        Locale::Es,
        Locale::Ar,
        Locale::Cmn,
        Locale::Fr,
        Locale::Ind,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ru => "ru",
            Locale::Th => "th",
            Locale::Es => "es",
            Locale::Ar => "ar",
            Locale::Cmn => "cmn",
            Locale::Fr => "fr",
            Locale::Ind => "ind",
        }
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self, Locale::Ar)
    }

    /// Maps a BCP 47 tag (`en-US`, `zh-Hans`, `id`) onto a supported locale.
    /// Malformed tags match nothing.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let langid: LanguageIdentifier = tag.trim().parse().ok()?;

        match langid.language.as_str() {
            "en" => Some(Locale::En),
            "ru" => Some(Locale::Ru),
            "th" => Some(Locale::Th),
            "es" => Some(Locale::Es),
            "ar" => Some(Locale::Ar),
            "cmn" | "zh" => Some(Locale::Cmn),
            "fr" => Some(Locale::Fr),
            "ind" | "id" | "in" => Some(Locale::Ind),
            _ => None,
        }
    }

    /// Picks the best supported locale from an `Accept-Language` header value.
    pub fn negotiate(accept_language: &str) -> Option<Self> {
        let mut candidates: Vec<(f32, usize, Locale)> = accept_language
            .split(',')
            .enumerate()
            .filter_map(|(position, part)| {
                let mut pieces = part.split(';');
                let tag = pieces.next()?.trim();
                if tag.is_empty() || tag == "*" {
                    return None;
                }
                let quality = pieces
                    .find_map(|param| param.trim().strip_prefix("q="))
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                if quality <= 0.0 {
                    return None;
                }
                Locale::from_tag(tag).map(|locale| (quality, position, locale))
            })
            .collect();

        candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        candidates.first().map(|(_, _, locale)| *locale)
    }
}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Locale::ALL
            .into_iter()
            .find(|locale| locale.code() == normalized)
            .ok_or_else(|| UnsupportedLocale(raw.to_string()))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read locale document {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("locale document {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("no message document found for fallback locale '{0}'")]
    MissingFallback(Locale),
}

/// Message trees for every loaded locale, read-only once built.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    trees: HashMap<Locale, Arc<MessageTree>>,
    fallback: Locale,
}

impl MessageCatalog {
    pub fn new(fallback: Locale) -> Self {
        Self {
            trees: HashMap::new(),
            fallback,
        }
    }

    pub fn with_messages(mut self, locale: Locale, tree: MessageTree) -> Self {
        self.insert(locale, tree);
        self
    }

    pub fn insert(&mut self, locale: Locale, tree: MessageTree) {
        self.trees.insert(locale, Arc::new(tree));
    }

    /// Loads `<dir>/<code>.json` for every supported locale. Missing documents are skipped,
    /// except for the fallback locale.
    pub fn load_dir<P: AsRef<Path>>(dir: P, fallback: Locale) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let mut catalog = Self::new(fallback);

        for locale in Locale::ALL {
            let path = dir.join(format!("{}.json", locale.code()));
            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    warn!(locale = locale.code(), path = %path.display(), "locale document missing");
                    continue;
                }
                Err(source) => return Err(CatalogError::Io { path, source }),
            };

            let tree = MessageTree::from_json_str(&raw)
                .map_err(|source| CatalogError::Parse {
                    path: path.clone(),
                    source,
                })?;
            info!(
                locale = locale.code(),
                messages = tree.leaf_count(),
                "loaded locale messages"
            );
            catalog.insert(locale, tree);
        }

        if !catalog.trees.contains_key(&fallback) {
            return Err(CatalogError::MissingFallback(fallback));
        }

        Ok(catalog)
    }

    pub fn fallback(&self) -> Locale {
        self.fallback
    }

    pub fn has_locale(&self, locale: Locale) -> bool {
        self.trees.contains_key(&locale)
    }

    pub fn locales(&self) -> Vec<Locale> {
        let mut locales: Vec<Locale> = self.trees.keys().copied().collect();
        locales.sort();
        locales
    }

    /// Messages for `locale`, falling back to the fallback locale and then to an empty tree.
    pub fn messages(&self, locale: Locale) -> Arc<MessageTree> {
        self.trees
            .get(&locale)
            .or_else(|| self.trees.get(&self.fallback))
            .cloned()
            .unwrap_or_else(|| Arc::new(MessageTree::empty()))
    }

    pub fn translator(
        &self,
        locale: Locale,
        verbosity: ResolutionVerbosity,
        sink: Option<Arc<dyn MissingKeySink>>,
    ) -> FlexibleTranslator {
        let translator =
            FlexibleTranslator::new(locale, self.messages(locale)).with_verbosity(verbosity);
        match sink {
            Some(sink) => translator.with_missing_sink(sink),
            None => translator,
        }
    }
}
