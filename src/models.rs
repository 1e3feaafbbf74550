//! Core data models used throughout the artefact index.
//!
//! These types represent the languages, categories, and catalog documents
//! that flow from manifest files into the store and back out through the
//! read API.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages the catalog is searchable in.
///
/// Adding a variant here makes every translation boundary (`tag`,
/// `from_tag`, text index rows) fail to compile until it is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "fr")]
    French,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::French];

    /// Tag used in manifest files and in the text index.
    pub fn tag(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
        }
    }

    /// Parse a manifest language tag. Tags are matched case-insensitively.
    pub fn from_tag(tag: &str) -> Option<Language> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::English),
            "fr" => Some(Language::French),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Language::from_tag(s).ok_or_else(|| {
            anyhow!(
                "Unknown language: '{}'. Supported: {}",
                s,
                Language::ALL.map(Language::tag).join(", ")
            )
        })
    }
}

/// A text in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub language: Language,
    pub text: String,
}

/// A list of texts (typically keywords) in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedTextList {
    pub language: Language,
    pub text: Vec<String>,
}

/// Category of an artefact. Manifests may omit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtefactType {
    BaseMap,
    Data,
}

impl ArtefactType {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtefactType::BaseMap => "base-map",
            ArtefactType::Data => "data",
        }
    }
}

impl FromStr for ArtefactType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "base-map" => Ok(ArtefactType::BaseMap),
            "data" => Ok(ArtefactType::Data),
            other => Err(anyhow!("Unknown artefact type: '{}'", other)),
        }
    }
}

/// Closed set of category filters accepted by the read API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtefactFilter {
    /// Every artefact, including uncategorized ones.
    #[default]
    All,
    OnlyBaseMaps,
    OnlyData,
}

impl ArtefactFilter {
    pub const ALL: [ArtefactFilter; 3] = [
        ArtefactFilter::All,
        ArtefactFilter::OnlyBaseMaps,
        ArtefactFilter::OnlyData,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArtefactFilter::All => "all",
            ArtefactFilter::OnlyBaseMaps => "only-base-maps",
            ArtefactFilter::OnlyData => "only-data",
        }
    }

    /// The single category this filter restricts to, or `None` for no restriction.
    pub fn artefact_type(self) -> Option<ArtefactType> {
        match self {
            ArtefactFilter::All => None,
            ArtefactFilter::OnlyBaseMaps => Some(ArtefactType::BaseMap),
            ArtefactFilter::OnlyData => Some(ArtefactType::Data),
        }
    }

    pub fn matches(self, artefact_type: Option<ArtefactType>) -> bool {
        match self.artefact_type() {
            None => true,
            Some(wanted) => artefact_type == Some(wanted),
        }
    }
}

impl fmt::Display for ArtefactFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtefactFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ArtefactFilter::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                anyhow!(
                    "Unknown filter: '{}'. Use {}.",
                    s,
                    ArtefactFilter::ALL.map(ArtefactFilter::as_str).join(", ")
                )
            })
    }
}

/// Case-folded form of a text, used for prefix matching and sorting.
pub fn fold_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Persistent catalog entry for one artefact directory.
///
/// `license`, `files` and `previews` are relative to the data-store root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtefactDocument {
    pub id: String,
    pub directory_path: String,
    pub artefact_type: Option<ArtefactType>,
    pub name: Vec<LocalizedText>,
    pub description: Vec<LocalizedText>,
    pub keywords: Vec<LocalizedTextList>,
    pub license: String,
    pub attributions: Vec<String>,
    pub provider: String,
    pub link: String,
    pub files: Vec<String>,
    pub previews: Vec<String>,
    pub weight: Option<f64>,
}

/// The localized fields of a document in a single language.
#[derive(Debug, Clone, Default)]
pub struct LocalizedFields<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub keywords: Vec<&'a str>,
}

impl LocalizedFields<'_> {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.keywords.is_empty()
    }
}

impl ArtefactDocument {
    /// English name if present, otherwise the first name entry.
    pub fn display_name(&self) -> &str {
        first_text(&self.name, Language::English)
            .or_else(|| self.name.first().map(|t| t.text.as_str()))
            .unwrap_or("")
    }

    /// Key used by listing and the prefix fallback: folded display name.
    pub fn sort_name(&self) -> String {
        fold_text(self.display_name())
    }

    /// Localized fields for `language`. Name and description use the first
    /// matching entry; keywords from every matching entry are kept.
    pub fn texts(&self, language: Language) -> LocalizedFields<'_> {
        LocalizedFields {
            name: first_text(&self.name, language),
            description: first_text(&self.description, language),
            keywords: self
                .keywords
                .iter()
                .filter(|k| k.language == language)
                .flat_map(|k| k.text.iter().map(String::as_str))
                .collect(),
        }
    }
}

fn first_text(texts: &[LocalizedText], language: Language) -> Option<&str> {
    texts
        .iter()
        .find(|t| t.language == language)
        .map(|t| t.text.as_str())
}

/// Public read model returned to callers of the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artefact {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub artefact_type: Option<ArtefactType>,
    pub name: Vec<LocalizedText>,
    pub description: Vec<LocalizedText>,
    pub keywords: Vec<LocalizedTextList>,
    pub license: String,
    pub attributions: Vec<String>,
    pub provider: String,
    pub link: String,
    pub files: Vec<String>,
    pub previews: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl From<ArtefactDocument> for Artefact {
    fn from(doc: ArtefactDocument) -> Self {
        Artefact {
            id: doc.id,
            artefact_type: doc.artefact_type,
            name: doc.name,
            description: doc.description,
            keywords: doc.keywords,
            license: doc.license,
            attributions: doc.attributions,
            provider: doc.provider,
            link: doc.link,
            files: doc.files,
            previews: doc.previews,
            weight: doc.weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(language: Language, text: &str) -> LocalizedText {
        LocalizedText {
            language,
            text: text.to_string(),
        }
    }

    fn doc_named(name: Vec<LocalizedText>) -> ArtefactDocument {
        ArtefactDocument {
            id: "id".to_string(),
            directory_path: "dir".to_string(),
            artefact_type: None,
            name,
            description: Vec::new(),
            keywords: Vec::new(),
            license: "dir/LICENSE".to_string(),
            attributions: Vec::new(),
            provider: String::new(),
            link: String::new(),
            files: Vec::new(),
            previews: Vec::new(),
            weight: None,
        }
    }

    #[test]
    fn test_language_tags() {
        for language in Language::ALL {
            assert_eq!(Language::from_tag(language.tag()), Some(language));
        }
        assert_eq!(Language::from_tag(" FR "), Some(Language::French));
        assert_eq!(Language::from_tag("de"), None);
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn test_filter_parse_rejects_unknown() {
        assert_eq!(
            "only-base-maps".parse::<ArtefactFilter>().unwrap(),
            ArtefactFilter::OnlyBaseMaps
        );
        let err = "only-icons".parse::<ArtefactFilter>().unwrap_err();
        assert!(err.to_string().contains("only-icons"));
    }

    #[test]
    fn test_filter_matches() {
        assert!(ArtefactFilter::All.matches(None));
        assert!(ArtefactFilter::All.matches(Some(ArtefactType::Data)));
        assert!(ArtefactFilter::OnlyData.matches(Some(ArtefactType::Data)));
        assert!(!ArtefactFilter::OnlyData.matches(Some(ArtefactType::BaseMap)));
        assert!(!ArtefactFilter::OnlyBaseMaps.matches(None));
    }

    #[test]
    fn test_display_name_prefers_english() {
        let doc = doc_named(vec![
            text(Language::French, "Fond de carte"),
            text(Language::English, "Base map"),
        ]);
        assert_eq!(doc.display_name(), "Base map");
        assert_eq!(doc.sort_name(), "base map");

        let doc = doc_named(vec![text(Language::French, "Fond de carte")]);
        assert_eq!(doc.display_name(), "Fond de carte");
    }

    #[test]
    fn test_texts_first_match() {
        let mut doc = doc_named(vec![
            text(Language::English, "First"),
            text(Language::English, "Second"),
        ]);
        doc.keywords = vec![
            LocalizedTextList {
                language: Language::English,
                text: vec!["roads".to_string()],
            },
            LocalizedTextList {
                language: Language::French,
                text: vec!["routes".to_string()],
            },
        ];
        let fields = doc.texts(Language::English);
        assert_eq!(fields.name, Some("First"));
        assert_eq!(fields.keywords, vec!["roads"]);
        assert!(doc.texts(Language::French).name.is_none());
    }

    #[test]
    fn test_artefact_json_shape() {
        let mut doc = doc_named(vec![text(Language::English, "Rivers")]);
        doc.artefact_type = Some(ArtefactType::BaseMap);
        let json = serde_json::to_value(Artefact::from(doc)).unwrap();
        assert_eq!(json["type"], "base-map");
        assert_eq!(json["name"][0]["language"], "en");
        assert!(json.get("directoryPath").is_none());
        assert!(json.get("weight").is_none());
    }
}
