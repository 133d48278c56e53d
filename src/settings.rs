use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::require_fields;
use crate::error::BuildError;
use crate::fs_util::read_json;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub default_dataset_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Settings plus the fields derived during a build. Constructed from a loaded
/// [`Settings`] value; the loaded value itself is never mutated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSettings {
    pub default_dataset_name: String,
    pub default_dataset_name_friendly: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    pub fn load(path: &Utf8Path) -> Result<Self, BuildError> {
        let value = read_json(path)?;
        require_fields(&value, &["defaultDatasetName"], path)?;
        serde_json::from_value(value).map_err(|err| BuildError::Parse {
            path: path.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn resolve(self, default_dataset_name_friendly: Option<String>) -> ResolvedSettings {
        ResolvedSettings {
            default_dataset_name: self.default_dataset_name,
            default_dataset_name_friendly,
            extra: self.extra,
        }
    }
}
