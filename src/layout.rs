use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};

use crate::descriptor::{DatasetDescriptor, VersionDescriptor};
use crate::error::BuildError;

pub const DATA_INPUT_DIR: &str = "data";
pub const DATA_OUTPUT_DIR: &str = "data_output";
pub const SETTINGS_FILE: &str = "settings.json";
pub const INDEX_FILE: &str = "index.json";
pub const TAG_FILE: &str = "tag.json";
pub const LATEST_DIR: &str = "latest";

/// Input and output roots of the data tree plus the path conventions shared
/// by both sides.
#[derive(Debug, Clone)]
pub struct Layout {
    input_root: Utf8PathBuf,
    output_root: Utf8PathBuf,
}

impl Layout {
    pub fn new() -> Result<Self, BuildError> {
        let cwd = std::env::current_dir().map_err(|err| BuildError::Filesystem(err.to_string()))?;
        let root = Utf8PathBuf::from_path_buf(cwd)
            .map_err(|_| BuildError::Filesystem("non-utf8 working directory".to_string()))?;
        Ok(Self {
            input_root: root.join(DATA_INPUT_DIR),
            output_root: root.join(DATA_OUTPUT_DIR),
        })
    }

    pub fn new_with_roots(input_root: Utf8PathBuf, output_root: Utf8PathBuf) -> Self {
        Self {
            input_root,
            output_root,
        }
    }

    pub fn input_root(&self) -> &Utf8Path {
        &self.input_root
    }

    pub fn output_root(&self) -> &Utf8Path {
        &self.output_root
    }

    pub fn settings_path(&self) -> Utf8PathBuf {
        self.input_root.join(SETTINGS_FILE)
    }

    pub fn index_path(&self) -> Utf8PathBuf {
        self.output_root.join(INDEX_FILE)
    }

    pub fn latest_dir(&self, dataset: &DatasetDescriptor) -> Utf8PathBuf {
        self.output_root
            .join(&dataset.name)
            .join("versions")
            .join(LATEST_DIR)
    }

    /// Resolve every path and public URL for one (dataset, version) pair.
    /// Pure computation over the two descriptors and the configured roots.
    pub fn resolve(&self, dataset: &DatasetDescriptor, version: &VersionDescriptor) -> VersionPaths {
        let versions_dir = format!("{}/versions", dataset.name);
        let files_dir = format!("{versions_dir}/{}/files", version.datetime);

        let file_urls = version
            .files
            .iter()
            .map(|(file_type, filename)| (file_type.clone(), format!("/{files_dir}/{filename}")))
            .collect();

        let zip_dir = format!("{versions_dir}/{}/zip-bundle", version.datetime);
        let zip_file_name = format!(
            "nextclade_dataset_{}_{}.zip",
            dataset.name, version.datetime
        );
        let zip_bundle_url = format!("/{zip_dir}/{zip_file_name}");
        let output_files_dir = self.output_root.join(&files_dir);

        VersionPaths {
            file_urls,
            input_files_dir: self.input_root.join(&files_dir),
            zip_path: self.output_root.join(&zip_dir).join(&zip_file_name),
            zip_src_dir: output_files_dir.clone(),
            output_files_dir,
            zip_bundle_url,
            versions_dir,
            files_dir,
        }
    }
}

/// Derived paths and URLs for one dataset version. Never persisted;
/// recomputed from the descriptors whenever needed.
#[derive(Debug, Clone)]
pub struct VersionPaths {
    pub versions_dir: String,
    pub files_dir: String,
    pub file_urls: BTreeMap<String, String>,
    pub input_files_dir: Utf8PathBuf,
    pub output_files_dir: Utf8PathBuf,
    pub zip_path: Utf8PathBuf,
    pub zip_src_dir: Utf8PathBuf,
    pub zip_bundle_url: String,
}
