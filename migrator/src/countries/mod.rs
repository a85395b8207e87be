//! Reference list of countries used to turn free-text country names into ISO codes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// ISO 3166-1 alpha-2 list embedded in the binary.
const EMBEDDED_COUNTRIES: &str = include_str!("../../resources/countries.json");

#[derive(Error, Debug)]
pub enum CountryError {
    #[error("Failed to read country list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse country list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Country list is empty")]
    Empty,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub country_name: String,
    pub country_code: String,
}

/// Ordered list of known countries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCatalogue {
    countries: Vec<Country>,
}

impl CountryCatalogue {
    pub fn new(countries: Vec<Country>) -> Result<Self, CountryError> {
        if countries.is_empty() {
            return Err(CountryError::Empty);
        }
        Ok(Self { countries })
    }

    /// Catalogue shipped with the binary.
    pub fn embedded() -> Result<Self, CountryError> {
        Self::from_json(EMBEDDED_COUNTRIES)
    }

    pub fn from_json(json: &str) -> Result<Self, CountryError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, CountryError> {
        let json =
            std::fs::read_to_string(path).map_err(|source| CountryError::Io { path: path.to_path_buf(), source })?;
        let catalogue = Self::from_json(&json)?;
        debug!(path = %path.display(), count = catalogue.len(), "Loaded country list");
        Ok(catalogue)
    }

    /// Embedded catalogue unless a replacement file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, CountryError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::embedded(),
        }
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    /// Code of the first country whose name matches exactly, or `country_name` itself.
    pub fn find_country_code_or_return_name<'a>(&'a self, country_name: &'a str) -> &'a str {
        self.countries
            .iter()
            .find(|country| country.country_name == country_name)
            .map_or(country_name, |country| country.country_code.as_str())
    }
}
