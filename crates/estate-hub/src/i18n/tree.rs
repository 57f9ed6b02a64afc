use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::io::Read;

/// Nested message document for a single locale.
///
/// Leaves are always strings. Anything else found in a source document (numbers, booleans,
/// arrays, null) is dropped while loading, so lookups only ever see strings or sub-namespaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTree {
    Leaf(String),
    Node(MessageNode),
}

/// Sub-namespace entries in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct MessageNode {
    entries: IndexMap<String, MessageTree>,
}

impl MessageNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&MessageTree> {
        self.entries.get(key)
    }

    /// Inserts or replaces an entry. Replacing keeps the original position.
    pub fn insert(&mut self, key: impl Into<String>, value: MessageTree) -> Option<MessageTree> {
        self.entries.insert(key.into(), value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MessageTree)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MessageTree {
    pub fn empty() -> Self {
        Self::Node(MessageNode::default())
    }

    pub fn leaf(text: impl Into<String>) -> Self {
        Self::Leaf(text.into())
    }

    /// Parses a locale document. A document whose root is neither a string nor an object
    /// yields an empty tree.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let parsed: Lenient = serde_json::from_str(raw)?;
        Ok(parsed.0.unwrap_or_else(Self::empty))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        let parsed: Lenient = serde_json::from_reader(reader)?;
        Ok(parsed.0.unwrap_or_else(Self::empty))
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Self::Leaf(text) => Some(text),
            Self::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&MessageNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Leaf(_) => None,
        }
    }

    pub fn child(&self, segment: &str) -> Option<&MessageTree> {
        self.as_node().and_then(|node| node.get(segment))
    }

    pub fn walk<'k, I>(&self, segments: I) -> Option<&MessageTree>
    where
        I: IntoIterator<Item = &'k str>,
    {
        segments
            .into_iter()
            .try_fold(self, |current, segment| current.child(segment))
    }

    /// Exact dotted-path lookup that only succeeds on a string leaf.
    pub fn lookup(&self, path: &str) -> Option<&str> {
        self.walk(path.split('.')).and_then(Self::as_leaf)
    }

    pub fn subtree(&self, namespace: &str) -> Option<&MessageTree> {
        self.walk(namespace.split('.'))
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Node(node) => node.iter().map(|(_, child)| child.leaf_count()).sum(),
        }
    }
}

impl Default for MessageTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for MessageTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(text) => serializer.serialize_str(text),
            Self::Node(node) => node.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for MessageTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Lenient::deserialize(deserializer)?
            .0
            .ok_or_else(|| de::Error::custom("message tree must be a string or an object"))
    }
}

/// A tree position that may hold an unsupported value.
struct Lenient(Option<MessageTree>);

impl<'de> Deserialize<'de> for Lenient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LenientVisitor)
    }
}

struct LenientVisitor;

impl<'de> Visitor<'de> for LenientVisitor {
    type Value = Lenient;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a message string or a nested message object")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Lenient, E> {
        Ok(Lenient(Some(MessageTree::Leaf(value.to_owned()))))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Lenient, E> {
        Ok(Lenient(Some(MessageTree::Leaf(value))))
    }

    fn visit_bool<E: de::Error>(self, _value: bool) -> Result<Lenient, E> {
        Ok(Lenient(None))
    }

    fn visit_i64<E: de::Error>(self, _value: i64) -> Result<Lenient, E> {
        Ok(Lenient(None))
    }

    fn visit_u64<E: de::Error>(self, _value: u64) -> Result<Lenient, E> {
        Ok(Lenient(None))
    }

    fn visit_f64<E: de::Error>(self, _value: f64) -> Result<Lenient, E> {
        Ok(Lenient(None))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Lenient, E> {
        Ok(Lenient(None))
    }

    fn visit_none<E: de::Error>(self) -> Result<Lenient, E> {
        Ok(Lenient(None))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Lenient, D::Error> {
        Lenient::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Lenient, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Lenient(None))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Lenient, A::Error> {
        let mut node = MessageNode {
            entries: IndexMap::with_capacity(map.size_hint().unwrap_or(0)),
        };
        while let Some((key, value)) = map.next_entry::<String, Lenient>()? {
            if let Some(tree) = value.0 {
                node.insert(key, tree);
            }
        }
        Ok(Lenient(Some(MessageTree::Node(node))))
    }
}
