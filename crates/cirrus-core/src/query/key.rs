use serde::{Deserialize, Serialize};

/// Identifier of a cached query result, e.g. `["directoryItems", "<uuid>"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Stable string form used as the durable storage key suffix.
    pub fn hash_key(&self) -> String {
        // A Vec<String> always serializes.
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

impl<S: Into<String>> From<Vec<S>> for QueryKey {
    fn from(segments: Vec<S>) -> Self {
        Self::new(segments)
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}
