//! Declarative dataset catalog.
//!
//! The set of datasets is data, not code: a TOML list of `[[dataset]]`
//! entries, each either spelling out its files or asking for them to be
//! scraped from the directory index at its base URL. The default catalog is
//! embedded in the binary.

pub mod index;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::dataset::{validate_dataset_name, DatasetJob, IndexedDataset, NameError, StaticDataset};
use crate::transport::Transport;

const BUILTIN: &str = include_str!("builtin.toml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("reading catalog {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("dataset {name:?}: invalid name: {source}")]
    InvalidName {
        name: String,
        #[source]
        source: NameError,
    },
    #[error("dataset {0:?} appears more than once")]
    Duplicate(String),
    #[error("dataset {name}: invalid base_url {url:?}: {source}")]
    InvalidUrl {
        name: String,
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("dataset {0}: index listing needs a base_url ending in '/'")]
    IndexNeedsDirectory(String),
    #[error("dataset {0}: set exactly one of `files` or `listing = \"index\"`")]
    AmbiguousListing(String),
    #[error("unknown dataset {0:?}")]
    Unknown(String),
}

/// How a dataset's file list is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Listing {
    /// Scrape the directory index page at `base_url`.
    Index,
}

/// One `[[dataset]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub name: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Static listing; `""` entries are kept and skipped at download time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<Listing>,
}

impl DatasetEntry {
    /// Short label for the listing source, for display.
    pub fn listing_label(&self) -> String {
        match (&self.files, self.listing) {
            (Some(files), _) => format!("{} file(s)", files.len()),
            (None, Some(Listing::Index)) => "index".to_string(),
            (None, None) => "-".to_string(),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        validate_dataset_name(&self.name).map_err(|source| CatalogError::InvalidName {
            name: self.name.clone(),
            source,
        })?;
        url::Url::parse(&self.base_url).map_err(|source| CatalogError::InvalidUrl {
            name: self.name.clone(),
            url: self.base_url.clone(),
            source,
        })?;
        match (&self.files, self.listing) {
            (Some(_), None) => Ok(()),
            (None, Some(Listing::Index)) => {
                if self.base_url.ends_with('/') {
                    Ok(())
                } else {
                    Err(CatalogError::IndexNeedsDirectory(self.name.clone()))
                }
            }
            _ => Err(CatalogError::AmbiguousListing(self.name.clone())),
        }
    }

    fn into_job(self, transport: &Arc<dyn Transport>) -> Arc<dyn DatasetJob> {
        match self.files {
            Some(files) => Arc::new(StaticDataset::new(self.name, self.base_url, files)),
            None => Arc::new(IndexedDataset::new(
                self.name,
                self.base_url,
                Arc::clone(transport),
            )),
        }
    }
}

/// Validated, ordered list of datasets with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "dataset")]
    datasets: Vec<DatasetEntry>,
}

impl Catalog {
    /// Parse and validate a catalog document.
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&text)?;
        tracing::debug!(
            "loaded catalog {} ({} datasets)",
            path.display(),
            catalog.len()
        );
        Ok(catalog)
    }

    /// The embedded default catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN)
    }

    /// Load `path` if given, otherwise the builtin catalog.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for entry in &self.datasets {
            entry.validate()?;
            if !seen.insert(entry.name.as_str()) {
                return Err(CatalogError::Duplicate(entry.name.clone()));
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.datasets
    }

    pub fn get(&self, name: &str) -> Option<&DatasetEntry> {
        self.datasets.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Keep only the named datasets (catalog order). An empty selection keeps all.
    pub fn select(self, names: &[String]) -> Result<Self, CatalogError> {
        if names.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(CatalogError::Unknown(unknown.clone()));
        }
        let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
        let datasets = self
            .datasets
            .into_iter()
            .filter(|d| wanted.contains(d.name.as_str()))
            .collect();
        Ok(Catalog { datasets })
    }

    /// Build one job per entry; index-listed datasets fetch through `transport`.
    pub fn into_jobs(self, transport: Arc<dyn Transport>) -> Vec<Arc<dyn DatasetJob>> {
        self.datasets
            .into_iter()
            .map(|entry| entry.into_job(&transport))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::CurlTransport;

    const SAMPLE: &str = r#"
        [[dataset]]
        name = "alpha"
        base_url = "https://x/a/"
        files = ["1.csv", "2.csv"]

        [[dataset]]
        name = "beta"
        base_url = "https://x/b/"
        files = [""]

        [[dataset]]
        name = "gamma"
        description = "scraped"
        base_url = "https://x/g/"
        listing = "index"
    "#;

    #[test]
    fn parses_static_and_index_entries() {
        let cat = Catalog::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cat.len(), 3);
        let alpha = cat.get("alpha").unwrap();
        assert_eq!(alpha.files.as_deref(), Some(&["1.csv".to_string(), "2.csv".to_string()][..]));
        assert_eq!(alpha.listing_label(), "2 file(s)");
        let gamma = cat.get("gamma").unwrap();
        assert_eq!(gamma.listing, Some(Listing::Index));
        assert_eq!(gamma.description.as_deref(), Some("scraped"));
        assert_eq!(gamma.listing_label(), "index");
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let cat = Catalog::builtin().unwrap();
        assert_eq!(cat.len(), 51);
        let cu = cat.get("consumer_price_index_all_urban").unwrap();
        assert_eq!(cu.base_url, "https://download.bls.gov/pub/time.series/cu/");
        assert!(cat
            .entries()
            .iter()
            .all(|d| d.listing == Some(Listing::Index) && d.base_url.ends_with('/')));
    }

    #[test]
    fn empty_document_is_empty_catalog() {
        let cat = Catalog::from_toml_str("").unwrap();
        assert!(cat.is_empty());
    }

    #[test]
    fn rejects_duplicate_names() {
        let text = r#"
            [[dataset]]
            name = "a"
            base_url = "https://x/"
            files = []
            [[dataset]]
            name = "a"
            base_url = "https://y/"
            files = []
        "#;
        assert!(matches!(
            Catalog::from_toml_str(text),
            Err(CatalogError::Duplicate(n)) if n == "a"
        ));
    }

    #[test]
    fn rejects_unsafe_name() {
        let text = r#"
            [[dataset]]
            name = "../escape"
            base_url = "https://x/"
            files = []
        "#;
        assert!(matches!(
            Catalog::from_toml_str(text),
            Err(CatalogError::InvalidName { .. })
        ));
    }

    #[test]
    fn rejects_reserved_chars_in_names() {
        for name in ["a:b", "a*b", "what?", "x<y>", "p|q", "\"q\""] {
            let text = format!(
                "[[dataset]]\nname = '{}'\nbase_url = \"https://x/a/\"\nfiles = []\n",
                name
            );
            assert!(
                matches!(
                    Catalog::from_toml_str(&text),
                    Err(CatalogError::InvalidName { .. })
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_bad_url_and_ambiguous_listing() {
        let bad_url = r#"
            [[dataset]]
            name = "a"
            base_url = "x/a/"
            files = []
        "#;
        assert!(matches!(
            Catalog::from_toml_str(bad_url),
            Err(CatalogError::InvalidUrl { .. })
        ));

        let both = r#"
            [[dataset]]
            name = "a"
            base_url = "https://x/a/"
            files = []
            listing = "index"
        "#;
        assert!(matches!(
            Catalog::from_toml_str(both),
            Err(CatalogError::AmbiguousListing(_))
        ));

        let neither = r#"
            [[dataset]]
            name = "a"
            base_url = "https://x/a/"
        "#;
        assert!(matches!(
            Catalog::from_toml_str(neither),
            Err(CatalogError::AmbiguousListing(_))
        ));
    }

    #[test]
    fn index_listing_requires_directory_url() {
        let text = r#"
            [[dataset]]
            name = "a"
            base_url = "https://x/a"
            listing = "index"
        "#;
        assert!(matches!(
            Catalog::from_toml_str(text),
            Err(CatalogError::IndexNeedsDirectory(_))
        ));
    }

    #[test]
    fn unknown_listing_kind_is_parse_error() {
        let text = r#"
            [[dataset]]
            name = "a"
            base_url = "https://x/a/"
            listing = "ftp"
        "#;
        assert!(matches!(
            Catalog::from_toml_str(text),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn select_keeps_catalog_order_and_rejects_unknown() {
        let cat = Catalog::from_toml_str(SAMPLE).unwrap();
        let picked = cat
            .clone()
            .select(&["gamma".to_string(), "alpha".to_string()])
            .unwrap();
        let names: Vec<_> = picked.entries().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "gamma"]);

        assert_eq!(cat.clone().select(&[]).unwrap().len(), 3);
        assert!(matches!(
            cat.select(&["delta".to_string()]),
            Err(CatalogError::Unknown(n)) if n == "delta"
        ));
    }

    #[test]
    fn into_jobs_preserves_order_and_names() {
        let cat = Catalog::from_toml_str(SAMPLE).unwrap();
        let jobs = cat.into_jobs(Arc::new(CurlTransport::default()));
        let names: Vec<_> = jobs.iter().map(|j| j.name().to_string()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
        assert_eq!(jobs[0].list_files().unwrap(), vec!["1.csv", "2.csv"]);
        assert_eq!(jobs[1].list_files().unwrap(), vec![""]);
        assert_eq!(jobs[2].base_url(), "https://x/g/");
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Catalog::load(&missing),
            Err(CatalogError::Io { .. })
        ));
        std::fs::write(dir.path().join("c.toml"), SAMPLE).unwrap();
        assert_eq!(Catalog::load(&dir.path().join("c.toml")).unwrap().len(), 3);
        assert_eq!(
            Catalog::load_or_builtin(None).unwrap(),
            Catalog::builtin().unwrap()
        );
    }
}
