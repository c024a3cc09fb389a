//! The tracked-model catalog.
//!
//! The catalog YAML file is the single source of truth for which bat models
//! the pipeline follows. Seeding copies it into the database; collection runs
//! read the database rows, not this file.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::Certification;
use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub models: Vec<CatalogModel>,
}

/// One tracked bat model as declared in the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogModel {
    pub brand: String,
    pub series: String,
    pub year: i32,
    pub certification: Certification,
    pub material: String,
    pub construction: String,
    /// Barrel diameter in display form, e.g. `2 5/8"`.
    pub barrel_size: String,
    /// Seed ASIN for variation discovery, when one is known.
    #[serde(default)]
    pub amazon_asin: Option<String>,
    /// Product page URL on the bat-specialty retailer, when one is known.
    #[serde(default)]
    pub justbats_url: Option<String>,
}

impl CatalogModel {
    /// Display name used in logs and reports, e.g.
    /// `2024 DeMarini Voodoo One BBCOR`.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!(
            "{} {} {} {}",
            self.year, self.brand, self.series, self.certification
        )
    }
}

/// Load and validate the model catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or if any
/// model fails validation (blank identity fields, implausible year, or a
/// duplicate brand/series/year/certification combination).
pub fn load_catalog(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: CatalogFile = serde_yaml::from_str(&content)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

fn validate_catalog(catalog: &CatalogFile) -> Result<(), ConfigError> {
    if catalog.models.is_empty() {
        return Err(ConfigError::Validation(
            "catalog contains no models".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for model in &catalog.models {
        for (field, value) in [
            ("brand", &model.brand),
            ("series", &model.series),
            ("material", &model.material),
            ("construction", &model.construction),
            ("barrel_size", &model.barrel_size),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "model '{}' has an empty {field}",
                    model.display_name()
                )));
            }
        }

        if !(2000..=2100).contains(&model.year) {
            return Err(ConfigError::Validation(format!(
                "model '{} {}' has implausible year {}",
                model.brand, model.series, model.year
            )));
        }

        let identity = (
            model.brand.clone(),
            model.series.clone(),
            model.year,
            model.certification,
        );
        if !seen.insert(identity) {
            return Err(ConfigError::Validation(format!(
                "duplicate catalog entry: {}",
                model.display_name()
            )));
        }
    }

    Ok(())
}
