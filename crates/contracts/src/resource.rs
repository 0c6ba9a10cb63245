//! Resource - process-level metadata flattened into every write

use crate::Tag;

/// Key/value metadata describing the emitting process.
///
/// Resource attributes are flattened in front of per-observation tags on
/// every write produced through a meter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resource {
    attrs: Vec<Tag>,
}

impl Resource {
    /// Create a resource from tags, keeping first occurrence of each key
    pub fn new(attrs: impl IntoIterator<Item = Tag>) -> Self {
        let mut res = Self::default();
        for attr in attrs {
            res.insert(attr);
        }
        res
    }

    /// Create a resource from string pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(pairs.into_iter().map(Tag::from))
    }

    /// Insert an attribute, replacing an existing value for the same key
    pub fn insert(&mut self, attr: Tag) {
        match self.attrs.iter_mut().find(|t| t.key == attr.key) {
            Some(existing) => existing.value = attr.value,
            None => self.attrs.push(attr),
        }
    }

    /// Merge `other` into this resource; `other` wins on key conflicts
    pub fn merge(mut self, other: Resource) -> Self {
        for attr in other.attrs {
            self.insert(attr);
        }
        self
    }

    /// Attributes in insertion order
    pub fn attrs(&self) -> &[Tag] {
        &self.attrs
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Flatten resource attributes and observation tags into one tag list,
    /// resource attributes first
    pub fn collect_tags(&self, tags: &[Tag]) -> Vec<Tag> {
        let mut all = Vec::with_capacity(self.attrs.len() + tags.len());
        all.extend_from_slice(&self.attrs);
        all.extend_from_slice(tags);
        all
    }
}
