//! Tolerant lookup over a [`MessageTree`].
//!
//! Order of attempts, first hit wins:
//! 1. the exact dotted path;
//! 2. whole-key case variants ([`KeyVariant::ORDER`]), then a segment-by-segment walk that
//!    tries [`SegmentVariant::ORDER`] at every level;
//! 3. the same search repeated inside every nested namespace, in document order.

use super::tree::{MessageNode, MessageTree};

/// Whole-key rewrites tried after the exact path misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyVariant {
    Identity,
    Lowercase,
    Uppercase,
    TitleSegments,
    FirstSegmentLower,
    FirstSegmentUpper,
}

impl KeyVariant {
    pub const ORDER: [KeyVariant; 6] = [
        KeyVariant::Identity,
        KeyVariant::Lowercase,
        KeyVariant::Uppercase,
        KeyVariant::TitleSegments,
        KeyVariant::FirstSegmentLower,
        KeyVariant::FirstSegmentUpper,
    ];

    pub fn apply(self, key: &str) -> String {
        match self {
            KeyVariant::Identity => key.to_string(),
            KeyVariant::Lowercase => key.to_lowercase(),
            KeyVariant::Uppercase => key.to_uppercase(),
            KeyVariant::TitleSegments => map_segments(key, |_, segment| capitalize(segment)),
            KeyVariant::FirstSegmentLower => map_segments(key, |index, segment| {
                if index == 0 {
                    segment.to_lowercase()
                } else {
                    segment.to_string()
                }
            }),
            KeyVariant::FirstSegmentUpper => map_segments(key, |index, segment| {
                if index == 0 {
                    segment.to_uppercase()
                } else {
                    segment.to_string()
                }
            }),
        }
    }
}

/// Per-segment rewrites used when no whole-key variant matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentVariant {
    Identity,
    Lowercase,
    Uppercase,
    Capitalized,
    LowerFirst,
    UpperFirst,
}

impl SegmentVariant {
    pub const ORDER: [SegmentVariant; 6] = [
        SegmentVariant::Identity,
        SegmentVariant::Lowercase,
        SegmentVariant::Uppercase,
        SegmentVariant::Capitalized,
        SegmentVariant::LowerFirst,
        SegmentVariant::UpperFirst,
    ];

    pub fn apply(self, segment: &str) -> String {
        match self {
            SegmentVariant::Identity => segment.to_string(),
            SegmentVariant::Lowercase => segment.to_lowercase(),
            SegmentVariant::Uppercase => segment.to_uppercase(),
            SegmentVariant::Capitalized => capitalize(segment),
            SegmentVariant::LowerFirst => map_first_char(segment, char::to_lowercase),
            SegmentVariant::UpperFirst => map_first_char(segment, char::to_uppercase),
        }
    }
}

/// Whole-key variants in [`KeyVariant::ORDER`], duplicates removed.
pub fn key_variants(key: &str) -> Vec<String> {
    let mut variants: Vec<String> = Vec::with_capacity(KeyVariant::ORDER.len());
    for variant in KeyVariant::ORDER {
        let candidate = variant.apply(key);
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

pub fn find<'t>(tree: &'t MessageTree, key: &str) -> Option<&'t str> {
    let node = match tree {
        MessageTree::Leaf(text) => return Some(text.as_str()),
        MessageTree::Node(node) => node,
    };

    tree.lookup(key)
        .or_else(|| find_case_variant(tree, key))
        .or_else(|| deep_search(node, key))
}

fn find_case_variant<'t>(tree: &'t MessageTree, key: &str) -> Option<&'t str> {
    key_variants(key)
        .iter()
        .find_map(|variant| tree.lookup(variant))
        .or_else(|| {
            let segments: Vec<&str> = key.split('.').collect();
            walk_segment_variants(tree, &segments)
        })
}

fn walk_segment_variants<'t>(tree: &'t MessageTree, segments: &[&str]) -> Option<&'t str> {
    let Some((first, rest)) = segments.split_first() else {
        return tree.as_leaf();
    };
    let node = tree.as_node()?;

    let mut tried: Vec<String> = Vec::with_capacity(SegmentVariant::ORDER.len());
    for variant in SegmentVariant::ORDER {
        let candidate = variant.apply(first);
        if tried.contains(&candidate) {
            continue;
        }
        if let Some(found) = node
            .get(&candidate)
            .and_then(|child| walk_segment_variants(child, rest))
        {
            return Some(found);
        }
        tried.push(candidate);
    }

    None
}

fn deep_search<'t>(node: &'t MessageNode, key: &str) -> Option<&'t str> {
    node.iter()
        .filter(|(_, child)| matches!(child, MessageTree::Node(_)))
        .find_map(|(_, child)| find(child, key))
}

fn map_segments<F>(key: &str, mut transform: F) -> String
where
    F: FnMut(usize, &str) -> String,
{
    key.split('.')
        .enumerate()
        .map(|(index, segment)| transform(index, segment))
        .collect::<Vec<_>>()
        .join(".")
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn map_first_char<I, F>(segment: &str, transform: F) -> String
where
    I: Iterator<Item = char>,
    F: Fn(char) -> I,
{
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => transform(first).chain(chars).collect(),
        None => String::new(),
    }
}
