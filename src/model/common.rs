use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Declared relation kind, normalized across both mapping paradigms.
///
/// A closed enumeration: every consumer matches exhaustively, so a new
/// paradigm means new variants here rather than scattered type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    BelongsTo,
    HasOne,
    HasMany,
    ManyToMany,
    EmbedsOne,
    EmbedsMany,
}

impl Cardinality {
    pub fn is_to_many(self) -> bool {
        matches!(self, Self::HasMany | Self::ManyToMany | Self::EmbedsMany)
    }

    pub fn is_embedded(self) -> bool {
        matches!(self, Self::EmbedsOne | Self::EmbedsMany)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BelongsTo => "belongs_to",
            Self::HasOne => "has_one",
            Self::HasMany => "has_many",
            Self::ManyToMany => "many_to_many",
            Self::EmbedsOne => "embeds_one",
            Self::EmbedsMany => "embeds_many",
        }
    }
}

/// Paradigm-independent relation metadata, computed on demand from a model
/// class. The inverse side of an embedding (`embedded_in`) is never surfaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    pub name: String,
    pub target_class: String,
    pub cardinality: Cardinality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverse_of: Option<String>,
    pub is_embedded: bool,
}

/// Raw attribute value as held by the host mapping layer, before JSON-safe
/// normalization. Temporal and opaque-identifier values keep their native
/// types here so serialization decisions happen in exactly one place.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Time(DateTime<Utc>),
    ObjectId(Uuid),
    Array(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// Identifier form of the value, used when reading foreign keys.
    /// Blank strings count as absent, matching the presence convention of
    /// the host mapping layers.
    pub fn id_string(&self) -> Option<String> {
        match self {
            Self::Int(i) => Some(i.to_string()),
            Self::Str(s) if !s.is_empty() => Some(s.clone()),
            Self::ObjectId(u) => Some(u.to_string()),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Materialized record snapshot handed across the adapter boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub model: String,
    pub id: String,
    pub attributes: BTreeMap<String, AttrValue>,
    /// Embedded children keyed by relation name. Always empty under the
    /// relational paradigm.
    pub embedded: BTreeMap<String, Vec<Record>>,
}

impl Record {
    pub fn key(&self) -> String {
        node_key(&self.model, &self.id)
    }
}

/// Stable node identity: the same model + id always yields the same key, so
/// clients can deduplicate across repeated expansions.
pub fn node_key(model: &str, id: &str) -> String {
    format!("{}:{}", model, id)
}

/// Splits a node key at the first separator; record ids may themselves
/// contain separators.
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinality_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Cardinality::ManyToMany).unwrap(),
            "\"many_to_many\""
        );
        assert_eq!(
            serde_json::from_str::<Cardinality>("\"embeds_many\"").unwrap(),
            Cardinality::EmbedsMany
        );
    }

    #[test]
    fn id_string_covers_identifier_shapes() {
        assert_eq!(AttrValue::Int(7).id_string(), Some("7".to_string()));
        assert_eq!(AttrValue::Str("a1".into()).id_string(), Some("a1".to_string()));
        assert_eq!(AttrValue::Str(String::new()).id_string(), None);
        assert_eq!(AttrValue::Null.id_string(), None);
        assert_eq!(AttrValue::Bool(true).id_string(), None);

        let oid = Uuid::from_u128(42);
        assert_eq!(AttrValue::ObjectId(oid).id_string(), Some(oid.to_string()));
    }

    #[test]
    fn node_keys_split_at_first_separator() {
        let key = node_key("Post", "urn:42");
        assert_eq!(key, "Post:urn:42");
        assert_eq!(split_key(&key), Some(("Post", "urn:42")));
        assert_eq!(split_key("no-separator"), None);
    }
}
