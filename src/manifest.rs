//! Artefact manifest reading and validation.
//!
//! A manifest (`artefact.yml` / `artefact.yaml`) describes one artefact
//! directory. Reading is all-or-nothing: a manifest with an unknown key,
//! an unsupported language tag, or a reference to a file that does not
//! exist yields a [`ManifestError`] and no partial result.
//!
//! ```yaml
//! version: 0.1
//! artefact:
//!   name:
//!     - language: en
//!       text: Countries of the world
//!   type: data
//!   license: LICENSE.txt
//!   attributions: [Natural Earth]
//!   provider: Natural Earth
//!   link: https://www.naturalearthdata.com
//!   files: [countries.zip]
//! ```

use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task::JoinSet;

use crate::models::{ArtefactType, Language};

/// Errors that make a manifest unusable.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("{path}: unsupported language '{language}' in {field}")]
    UnsupportedLanguage {
        path: PathBuf,
        field: &'static str,
        language: String,
    },

    #[error("{path}: reference '{reference}' must be relative to the manifest directory")]
    AbsoluteReference { path: PathBuf, reference: String },

    #[error("{path}: referenced file '{reference}' does not exist")]
    MissingFile { path: PathBuf, reference: String },

    #[error("{path}: referenced file '{reference}' is not a regular file")]
    NotAFile { path: PathBuf, reference: String },

    #[error("{path}: file check did not complete: {source}")]
    Task {
        path: PathBuf,
        source: tokio::task::JoinError,
    },
}

/// A parsed and validated manifest.
///
/// Language tags are kept as written; they are known to be supported
/// once [`read_manifest`] returns.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
    pub artefact: ManifestArtefact,
    /// Absolute path of the manifest file itself.
    #[serde(skip)]
    pub source_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestArtefact {
    pub name: Vec<ManifestText>,
    #[serde(rename = "type", default)]
    pub artefact_type: Option<ArtefactType>,
    #[serde(default)]
    pub description: Vec<ManifestText>,
    #[serde(default)]
    pub keywords: Vec<ManifestTextList>,
    pub license: String,
    pub attributions: Vec<String>,
    pub provider: String,
    pub link: String,
    pub files: Vec<String>,
    #[serde(default)]
    pub previews: Vec<String>,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestText {
    pub language: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestTextList {
    pub language: String,
    pub text: Vec<String>,
}

impl Manifest {
    /// Directory all references are resolved against.
    pub fn directory(&self) -> &Path {
        self.source_path.parent().unwrap_or(Path::new(""))
    }
}

impl ManifestArtefact {
    /// Every file path the manifest points at: license, files, previews.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.license.as_str())
            .chain(self.files.iter().map(String::as_str))
            .chain(self.previews.iter().map(String::as_str))
    }
}

/// Accept `version: 1`, `version: 0.1` and `version: "1.0"` alike.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        _ => Err(serde::de::Error::custom("version must be a scalar")),
    }
}

/// Read, parse and validate the manifest at `path`.
pub async fn read_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let source_path = std::path::absolute(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let content =
        tokio::fs::read_to_string(&source_path)
            .await
            .map_err(|source| ManifestError::Io {
                path: source_path.clone(),
                source,
            })?;

    let mut manifest: Manifest =
        serde_yaml::from_str(&content).map_err(|source| ManifestError::Parse {
            path: source_path.clone(),
            source,
        })?;
    manifest.source_path = source_path;

    check_languages(&manifest)?;
    check_references(&manifest).await?;

    Ok(manifest)
}

fn check_languages(manifest: &Manifest) -> Result<(), ManifestError> {
    let artefact = &manifest.artefact;
    let tagged = artefact
        .name
        .iter()
        .map(|t| ("name", &t.language))
        .chain(artefact.description.iter().map(|t| ("description", &t.language)))
        .chain(artefact.keywords.iter().map(|t| ("keywords", &t.language)));

    for (field, language) in tagged {
        if Language::from_tag(language).is_none() {
            return Err(ManifestError::UnsupportedLanguage {
                path: manifest.source_path.clone(),
                field,
                language: language.clone(),
            });
        }
    }
    Ok(())
}

/// Check every referenced file concurrently; the first failure wins and
/// the remaining checks are aborted.
async fn check_references(manifest: &Manifest) -> Result<(), ManifestError> {
    let directory = manifest.directory();
    let mut checks = JoinSet::new();

    for reference in manifest.artefact.references() {
        if Path::new(reference).is_absolute() {
            return Err(ManifestError::AbsoluteReference {
                path: manifest.source_path.clone(),
                reference: reference.to_string(),
            });
        }

        let target = directory.join(reference);
        let path = manifest.source_path.clone();
        let reference = reference.to_string();
        checks.spawn(async move {
            match tokio::fs::metadata(&target).await {
                Ok(meta) if meta.is_file() => Ok(()),
                Ok(_) => Err(ManifestError::NotAFile { path, reference }),
                Err(_) => Err(ManifestError::MissingFile { path, reference }),
            }
        });
    }

    while let Some(joined) = checks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(source) => {
                return Err(ManifestError::Task {
                    path: manifest.source_path.clone(),
                    source,
                })
            }
        }
    }

    Ok(())
}
