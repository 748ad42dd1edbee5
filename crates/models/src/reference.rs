use serde::{Deserialize, Serialize};

/// A related document that the API may or may not have populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Populated(T),
    Id(String),
}

impl<T> Ref<T> {
    pub fn populated(&self) -> Option<&T> {
        match self {
            Ref::Populated(t) => Some(t),
            Ref::Id(_) => None,
        }
    }
}

/// Last six characters of a document id, upper-cased, as shown in tables.
pub fn short_id(id: &str) -> String {
    let start = id.char_indices().rev().nth(5).map(|(i, _)| i).unwrap_or(0);
    id[start..].to_uppercase()
}
