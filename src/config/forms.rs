//! Form access map loading from forms.toml
//!
//! Each form that unlocks something names the feature it grants and, optionally,
//! the product the feature belongs to and the features an entity must already
//! hold before the form is open to it. When no file is present the built-in map
//! is used.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Product a grant falls under when the form's entry names none.
pub const DEFAULT_PRODUCT_ID: &str = "pitch-to-grant";

/// Default location of the access map file
pub const DEFAULT_FORMS_CONFIG: &str = "forms.toml";

/// A (product, feature) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRef {
    /// Product identifier
    pub product_id: String,
    /// Feature identifier within the product
    pub feature_id: String,
}

impl FeatureRef {
    /// Builds a reference from borrowed ids.
    #[must_use]
    pub fn new(product_id: &str, feature_id: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            feature_id: feature_id.to_string(),
        }
    }
}

/// What completing a form grants, and what opening it requires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormAccess {
    /// Product of the granted feature; [`DEFAULT_PRODUCT_ID`] when absent
    #[serde(default)]
    pub product_id: Option<String>,
    /// Feature granted on submit
    pub feature_id: String,
    /// Features the entity must already hold to open the form
    #[serde(default)]
    pub requires: Vec<FeatureRef>,
}

impl FormAccess {
    /// Product the grant is recorded under.
    #[must_use]
    pub fn product_id(&self) -> &str {
        self.product_id.as_deref().unwrap_or(DEFAULT_PRODUCT_ID)
    }

    /// The granted (product, feature) pair with the product default applied.
    #[must_use]
    pub fn grant(&self) -> FeatureRef {
        FeatureRef::new(self.product_id(), &self.feature_id)
    }
}

/// Form id to access entry, the whole of forms.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormAccessMap {
    /// Entries keyed by form id
    #[serde(default)]
    pub forms: BTreeMap<String, FormAccess>,
}

impl FormAccessMap {
    /// Looks up a form's entry.
    #[must_use]
    pub fn get(&self, form_id: &str) -> Option<&FormAccess> {
        self.forms.get(form_id)
    }

    /// Parses a map from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse forms config: {e}"),
        })
    }
}

impl Default for FormAccessMap {
    fn default() -> Self {
        let mut forms = BTreeMap::new();
        forms.insert(
            "pitch_deck".to_string(),
            FormAccess {
                product_id: None,
                feature_id: "pitch-to-grant".to_string(),
                requires: Vec::new(),
            },
        );
        forms.insert(
            "grant_application".to_string(),
            FormAccess {
                product_id: Some("grant-matching".to_string()),
                feature_id: "application-tracker".to_string(),
                requires: vec![FeatureRef::new(DEFAULT_PRODUCT_ID, "pitch-to-grant")],
            },
        );
        forms.insert(
            "catalyzor_onboarding".to_string(),
            FormAccess {
                product_id: Some("catalyzor-hub".to_string()),
                feature_id: "deal-flow".to_string(),
                requires: Vec::new(),
            },
        );
        Self { forms }
    }
}

/// Loads the access map from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - An entry is missing `feature_id`
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FormAccessMap> {
    let path = path.as_ref();
    debug!("Loading form access map from {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read forms config {}: {e}", path.display()),
    })?;
    FormAccessMap::from_toml_str(&contents)
}

/// Loads the file named by `FORMS_CONFIG` (or ./forms.toml), falling back to
/// the built-in map when that file does not exist.
pub fn load_default_config() -> Result<FormAccessMap> {
    let path = std::env::var("FORMS_CONFIG").unwrap_or_else(|_| DEFAULT_FORMS_CONFIG.to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        info!("No forms config at {}, using built-in access map.", path);
        Ok(FormAccessMap::default())
    }
}
