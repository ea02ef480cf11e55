use serde::{Deserialize, Serialize};

/// A named, independently queryable partition of the vector store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(String);

impl Collection {
    /// Returns `None` for empty or whitespace-only names.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One collection entry as declared by the store's schema listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDescriptor {
    pub name: String,
}

/// The store's schema document, in the order the store returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSchema {
    pub collections: Vec<CollectionDescriptor>,
}

impl StoreSchema {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collections: names
                .into_iter()
                .map(|name| CollectionDescriptor { name: name.into() })
                .collect(),
        }
    }
}
