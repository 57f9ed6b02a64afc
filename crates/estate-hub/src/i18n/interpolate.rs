use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

const DEFAULT_KEY: &str = "default";

/// Parameters passed alongside a translation lookup.
///
/// The `default` entry is kept apart from the substitution parameters: it is the caller's
/// fallback text and is returned verbatim when no message matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct TranslationValues {
    params: BTreeMap<String, String>,
    default: Option<String>,
}

impl TranslationValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_default(mut self, text: impl Into<String>) -> Self {
        self.default = Some(text.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl fmt::Display) {
        self.params.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn default_text(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.default.is_none()
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl From<Map<String, Value>> for TranslationValues {
    fn from(map: Map<String, Value>) -> Self {
        let mut values = Self::default();
        for (name, value) in map {
            let text = stringify(value);
            if name == DEFAULT_KEY {
                values.default = Some(text);
            } else {
                values.params.insert(name, text);
            }
        }
        values
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Replaces every `{{name}}` token whose name is a known parameter.
pub fn substitute_placeholders(template: &str, values: &TranslationValues) -> String {
    values
        .params()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{{{name}}}}}"), value)
        })
}

/// Message formatting for direct catalog hits: `{{name}}` tokens first, then simple
/// `{name}` arguments. Anything that is not a known argument is left untouched, including
/// plural/select blocks.
pub fn format_message(template: &str, values: &TranslationValues) -> String {
    if values.params.is_empty() {
        return template.to_string();
    }

    let substituted = substitute_placeholders(template, values);
    replace_simple_arguments(&substituted, values)
}

fn replace_simple_arguments(template: &str, values: &TranslationValues) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            output.push_str(&rest[open..]);
            rest = "";
            break;
        };

        let inner = &after[..close];
        let name = inner.trim();
        match values.get(name).filter(|_| is_argument_name(name)) {
            Some(value) => output.push_str(value),
            None => {
                output.push('{');
                output.push_str(inner);
                output.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    output.push_str(rest);
    output
}

fn is_argument_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-')
}
