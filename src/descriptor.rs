use std::collections::BTreeMap;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BuildError;
use crate::fs_util::read_json;

pub const DATASET_DESCRIPTOR_FILE: &str = "dataset.json";
pub const VERSION_DESCRIPTOR_FILE: &str = "metadata.json";

/// One dataset as declared by a `dataset.json` file. Fields beyond the
/// required ones are carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDescriptor {
    pub name: String,
    pub name_friendly: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One published version of a dataset as declared by a `metadata.json` file.
/// `datetime` doubles as sort key and path segment; `files` maps a file-type
/// label to a physical filename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionDescriptor {
    pub datetime: String,
    pub files: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DatasetDescriptor {
    pub fn load(path: &Utf8Path) -> Result<Self, BuildError> {
        let value = read_json(path)?;
        require_fields(&value, &["name", "nameFriendly"], path)?;
        from_value(value, path)
    }

    /// The full descriptor as a JSON object, typed fields included.
    pub fn to_object(&self) -> Map<String, Value> {
        let mut object = self.extra.clone();
        object.insert("name".to_string(), Value::String(self.name.clone()));
        object.insert(
            "nameFriendly".to_string(),
            Value::String(self.name_friendly.clone()),
        );
        object
    }
}

impl VersionDescriptor {
    pub fn load(path: &Utf8Path) -> Result<Self, BuildError> {
        let value = read_json(path)?;
        require_fields(&value, &["datetime", "files"], path)?;
        from_value(value, path)
    }

    pub fn to_object(&self) -> Map<String, Value> {
        let mut object = self.extra.clone();
        object.insert("datetime".to_string(), Value::String(self.datetime.clone()));
        let files = self
            .files
            .iter()
            .map(|(file_type, filename)| (file_type.clone(), Value::String(filename.clone())))
            .collect();
        object.insert("files".to_string(), Value::Object(files));
        object
    }
}

/// Shallow merge forming the per-version tag document. Version fields are the
/// base; dataset fields override on key collision.
pub fn merge_tag(version: &VersionDescriptor, dataset: &DatasetDescriptor) -> Map<String, Value> {
    let mut merged = version.to_object();
    for (key, value) in dataset.to_object() {
        merged.insert(key, value);
    }
    merged
}

pub(crate) fn require_fields(
    value: &Value,
    fields: &[&'static str],
    path: &Utf8Path,
) -> Result<(), BuildError> {
    let Some(object) = value.as_object() else {
        return Err(BuildError::Parse {
            path: path.to_owned(),
            message: "expected a JSON object".to_string(),
        });
    };
    for &field in fields {
        if !object.contains_key(field) {
            return Err(BuildError::MissingField {
                path: path.to_owned(),
                field,
            });
        }
    }
    Ok(())
}

fn from_value<T: serde::de::DeserializeOwned>(
    value: Value,
    path: &Utf8Path,
) -> Result<T, BuildError> {
    serde_json::from_value(value).map_err(|err| BuildError::Parse {
        path: path.to_owned(),
        message: err.to_string(),
    })
}
