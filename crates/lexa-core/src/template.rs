//! Contract templates as listed by the catalog.

use serde::{Deserialize, Deserializer, Serialize};

use crate::variables::VariablesWire;

/// A stored contract skeleton with named fill-in slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Catalog identifier. Document stores report it as `_id`.
    #[serde(alias = "_id")]
    pub id: String,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Backend-relative filename used to resolve the template.
    ///
    /// Catalog documents may lack it; such entries are listed but cannot be
    /// selected (see [`Template::is_resolvable`]).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub filename: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Template {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            filename: filename.into(),
        }
    }

    /// A template can only bootstrap a session if it names a file.
    pub fn is_resolvable(&self) -> bool {
        !self.filename.trim().is_empty()
    }

    /// Matches by exact id or case-insensitive display name.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        self.id == query || self.name.to_lowercase() == query.to_lowercase()
    }
}

/// Finds a template in a catalog by id, name, or 1-based position.
pub fn find_template<'a>(catalog: &'a [Template], query: &str) -> Option<&'a Template> {
    if let Some(template) = catalog.iter().find(|t| t.matches(query)) {
        return Some(template);
    }
    query
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .and_then(|n| catalog.get(n - 1))
}

/// What the backend returns when a template is resolved.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateResolution {
    #[serde(default)]
    pub variables: VariablesWire,
    /// Raw template body. Older backends omit it.
    #[serde(default)]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Template> {
        vec![
            Template::new("t1", "NDA", "nda.docx"),
            Template::new("t2", "Hợp đồng thuê nhà", "thue_nha.docx"),
        ]
    }

    #[test]
    fn test_deserialize_with_mongo_id() {
        let template: Template = serde_json::from_str(
            r#"{"_id":"6650a1","name":"NDA","filename":"nda.docx","created_at":"2024-05-01"}"#,
        )
        .unwrap();
        assert_eq!(template, Template::new("6650a1", "NDA", "nda.docx"));
    }

    #[test]
    fn test_catalog_keeps_entries_without_filename() {
        let catalog: Vec<Template> = serde_json::from_str(
            r#"[
                {"_id":"a","name":"NDA","filename":"nda.docx"},
                {"_id":"b","name":"Draft"},
                {"_id":"c","name":null,"filename":null}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 3);
        assert!(catalog[0].is_resolvable());
        assert_eq!(catalog[1], Template::new("b", "Draft", ""));
        assert!(!catalog[1].is_resolvable());
        assert_eq!(catalog[2], Template::new("c", "", ""));
    }

    #[test]
    fn test_find_template_by_id_name_and_position() {
        let catalog = catalog();
        assert_eq!(find_template(&catalog, "t2").unwrap().id, "t2");
        assert_eq!(find_template(&catalog, "nda").unwrap().id, "t1");
        assert_eq!(find_template(&catalog, "2").unwrap().id, "t2");
        assert!(find_template(&catalog, "0").is_none());
        assert!(find_template(&catalog, "lease").is_none());
    }

    #[test]
    fn test_resolution_without_content() {
        let resolution: TemplateResolution =
            serde_json::from_str(r#"{"variables":{"party_a":""}}"#).unwrap();
        assert!(resolution.content.is_empty());
        assert!(matches!(resolution.variables, VariablesWire::Map(_)));
    }

    #[test]
    fn test_is_resolvable() {
        assert!(Template::new("t1", "NDA", "nda.docx").is_resolvable());
        assert!(!Template::new("t1", "NDA", " ").is_resolvable());
    }
}
