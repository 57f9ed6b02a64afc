use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dot-delimited translation key such as `Projects.form.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TranslationKey(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("translation key is empty")]
    Empty,
    #[error("translation key '{0}' contains an empty segment")]
    EmptySegment(String),
}

impl TranslationKey {
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(KeyError::Empty);
        }
        if trimmed.split('.').any(str::is_empty) {
            return Err(KeyError::EmptySegment(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.segments().next().unwrap_or_default()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Key relative to its namespace, or `None` for single-segment keys.
    pub fn relative(&self) -> Option<&str> {
        self.0.split_once('.').map(|(_, rest)| rest)
    }

    /// Prefixes the key with a namespace when one is given.
    pub fn qualified(namespace: Option<&str>, key: &str) -> String {
        match namespace.map(str::trim).filter(|ns| !ns.is_empty()) {
            Some(ns) => format!("{ns}.{key}"),
            None => key.to_string(),
        }
    }
}

impl FromStr for TranslationKey {
    type Err = KeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl TryFrom<String> for TranslationKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TranslationKey> for String {
    fn from(key: TranslationKey) -> Self {
        key.0
    }
}

impl fmt::Display for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns a key into display text when no translation exists.
///
/// Tokens are split on dots, whitespace and before every uppercase letter, then each token
/// is capitalized: `Foo.barBaz` becomes `Foo Bar Baz`.
pub fn format_key(key: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in key.chars() {
        if ch == '.' || ch.is_whitespace() {
            flush_token(&mut tokens, &mut current);
            continue;
        }
        if ch.is_uppercase() {
            flush_token(&mut tokens, &mut current);
        }
        current.push(ch);
    }
    flush_token(&mut tokens, &mut current);

    tokens.join(" ").trim().to_string()
}

fn flush_token(tokens: &mut Vec<String>, current: &mut String) {
    if current.is_empty() {
        return;
    }
    tokens.push(capitalize(current));
    current.clear();
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_dotted_camel_keys() {
        assert_eq!(format_key("Foo.barBaz"), "Foo Bar Baz");
        assert_eq!(format_key("Projects.form.buildingName"), "Projects Form Building Name");
        assert_eq!(format_key("UNITS"), "U N I T S");
        assert_eq!(format_key("  spaced . key  "), "Spaced Key");
    }

    #[test]
    fn formatting_empty_key_yields_empty_string() {
        assert_eq!(format_key(""), "");
        assert_eq!(format_key("..."), "");
    }

    #[test]
    fn formatting_is_deterministic() {
        let key = "Layouts.floorPlan.windowView";
        assert_eq!(format_key(key), format_key(key));
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert_eq!(TranslationKey::parse("  "), Err(KeyError::Empty));
        assert_eq!(
            TranslationKey::parse("Projects..name"),
            Err(KeyError::EmptySegment("Projects..name".to_string()))
        );
    }

    #[test]
    fn namespace_is_first_segment() {
        let key = TranslationKey::parse("Projects.form.name").expect("valid key");
        assert_eq!(key.namespace(), "Projects");
        assert_eq!(key.relative(), Some("form.name"));
        assert_eq!(key.segments().count(), 3);

        let single = TranslationKey::parse("title").expect("valid key");
        assert_eq!(single.namespace(), "title");
        assert_eq!(single.relative(), None);
    }

    #[test]
    fn qualified_joins_namespace() {
        assert_eq!(TranslationKey::qualified(Some("Units"), "status"), "Units.status");
        assert_eq!(TranslationKey::qualified(Some(" "), "status"), "status");
        assert_eq!(TranslationKey::qualified(None, "status"), "status");
    }
}
