use serde::{Deserialize, Serialize};

/// A subject the pipeline can produce a video about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// Stock footage search terms; empty means "derive from the script"
    #[serde(default)]
    pub visual_queries: Vec<String>,
}

impl Topic {
    /// A bare topic carrying only a title, used for ad-hoc overrides
    pub fn from_title(title: impl Into<String>) -> Self {
        Topic {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Ordered topics plus the persisted rotation index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCatalog {
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub last_used_index: usize,
}

impl TopicCatalog {
    pub fn new(topics: Vec<Topic>) -> Self {
        TopicCatalog {
            topics,
            last_used_index: 0,
        }
    }

    /// Finds the catalog entry an override title refers to.
    ///
    /// Matching is case-insensitive and accepts a catalog title contained
    /// in the override, so "AI tools in 2025" still picks up "AI tools".
    pub fn find_matching(&self, title: &str) -> Option<&Topic> {
        let needle = title.to_lowercase();
        self.topics
            .iter()
            .find(|t| !t.title.is_empty() && needle.contains(&t.title.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_deserializes_with_missing_fields() {
        let json = r#"{"topics": [{"title": "Rust"}]}"#;
        let catalog: TopicCatalog = serde_json::from_str(json).unwrap();

        assert_eq!(catalog.last_used_index, 0);
        assert_eq!(catalog.topics.len(), 1);
        assert!(catalog.topics[0].visual_queries.is_empty());
    }

    #[test]
    fn test_find_matching_is_case_insensitive() {
        let catalog = TopicCatalog::new(vec![
            Topic::from_title("Space Exploration"),
            Topic::from_title("Deep Sea Life"),
        ]);

        let found = catalog.find_matching("the future of SPACE EXPLORATION");
        assert_eq!(found.map(|t| t.title.as_str()), Some("Space Exploration"));
        assert!(catalog.find_matching("cooking").is_none());
    }
}
