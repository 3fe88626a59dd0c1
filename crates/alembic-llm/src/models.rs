//! Model selection
//!
//! Hosted model names come and go. Rather than pinning one, the analyzer asks
//! the API which models exist and takes the first preferred one that is
//! available.

use serde::Deserialize;

/// Preference order used to pick a model from a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPreference {
    /// Preferred models, best first
    pub preferred: Vec<String>,
    /// Used when discovery fails or lists nothing
    pub fallback: String,
}

impl ModelPreference {
    /// Pick from `available`: first preferred, else alphabetically first,
    /// else the fallback.
    pub fn choose(&self, available: &[String]) -> String {
        if let Some(preferred) = self
            .preferred
            .iter()
            .find(|name| available.iter().any(|a| a == *name))
        {
            return preferred.clone();
        }

        available
            .iter()
            .min()
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// `GET /models` response body
#[derive(Debug, Deserialize)]
pub(crate) struct ModelList {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelEntry {
    pub id: String,
}

impl ModelList {
    /// Listed ids with any `models/` resource prefix removed
    pub fn ids(self) -> Vec<String> {
        self.data
            .into_iter()
            .map(|entry| {
                entry
                    .id
                    .strip_prefix("models/")
                    .map(str::to_string)
                    .unwrap_or(entry.id)
            })
            .filter(|id| !id.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preference() -> ModelPreference {
        ModelPreference {
            preferred: vec!["gemini-3-flash-preview".into(), "gemini-2.5-flash".into()],
            fallback: "gemini-2.0-flash".into(),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_available_preferred_wins() {
        let available = names(&["gemini-2.5-flash", "gemini-3-flash-preview", "aqa"]);
        assert_eq!(preference().choose(&available), "gemini-3-flash-preview");
    }

    #[test]
    fn test_alphabetical_when_no_preferred() {
        let available = names(&["text-bison", "gemini-1.5-pro", "gemma-3"]);
        assert_eq!(preference().choose(&available), "gemini-1.5-pro");
    }

    #[test]
    fn test_fallback_when_empty() {
        assert_eq!(preference().choose(&[]), "gemini-2.0-flash");
    }

    #[test]
    fn test_ids_strip_resource_prefix() {
        let list: ModelList = serde_json::from_str(
            r#"{"object":"list","data":[{"id":"models/gemini-2.5-flash"},{"id":"gpt-4o"}]}"#,
        )
        .unwrap();
        assert_eq!(list.ids(), names(&["gemini-2.5-flash", "gpt-4o"]));
    }
}
