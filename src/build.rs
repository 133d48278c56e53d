use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::descriptor::{
    self, DATASET_DESCRIPTOR_FILE, DatasetDescriptor, VERSION_DESCRIPTOR_FILE, VersionDescriptor,
};
use crate::error::BuildError;
use crate::fs_util;
use crate::layout::{Layout, TAG_FILE, VersionPaths};
use crate::scan;
use crate::settings::{ResolvedSettings, Settings};

/// The aggregated `index.json` document consumed by downstream clients.
#[derive(Debug, Clone, Serialize)]
pub struct IndexDocument {
    pub settings: ResolvedSettings,
    pub datasets: Vec<IndexDataset>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDataset {
    pub name: String,
    pub name_friendly: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub versions: Vec<IndexVersion>,
}

/// One version entry in the index: the original descriptor fields with the
/// `files` mapping replaced by resolved public URLs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexVersion {
    pub datetime: String,
    pub files: BTreeMap<String, String>,
    pub zip_bundle: String,
    pub latest: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BuildSummary {
    pub datasets: usize,
    pub versions: usize,
}

pub struct Builder {
    layout: Layout,
}

impl Builder {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Wipe the output tree, materialize every version of every dataset, and
    /// write the aggregated index. Any error aborts the run; the next run
    /// regenerates the output from scratch.
    pub fn run(&self) -> Result<BuildSummary, BuildError> {
        fs_util::remove_dir_all_if_exists(self.layout.output_root())?;

        let settings = Settings::load(&self.layout.settings_path())?;
        let descriptor_paths =
            scan::find_files(self.layout.input_root(), |name| name == DATASET_DESCRIPTOR_FILE)?;
        info!(count = descriptor_paths.len(), "discovered dataset descriptors");

        let mut seen = BTreeMap::<String, Utf8PathBuf>::new();
        let mut datasets = Vec::new();
        let mut default_name_friendly = None;
        let mut version_count = 0usize;

        for descriptor_path in descriptor_paths {
            let dataset = DatasetDescriptor::load(&descriptor_path)?;
            if let Some(first) = seen.insert(dataset.name.clone(), descriptor_path.clone()) {
                return Err(BuildError::DuplicateDataset {
                    name: dataset.name,
                    first,
                    second: descriptor_path,
                });
            }
            if dataset.name == settings.default_dataset_name {
                default_name_friendly = Some(dataset.name_friendly.clone());
            }

            let versions = self.build_dataset(&dataset, &descriptor_path)?;
            version_count += versions.len();
            datasets.push(IndexDataset {
                name: dataset.name,
                name_friendly: dataset.name_friendly,
                extra: dataset.extra,
                versions,
            });
        }

        let index = IndexDocument {
            settings: settings.resolve(default_name_friendly),
            datasets,
        };
        fs_util::write_json(&index, &self.layout.index_path())?;
        info!(path = %self.layout.index_path(), "index written");

        Ok(BuildSummary {
            datasets: index.datasets.len(),
            versions: version_count,
        })
    }

    fn build_dataset(
        &self,
        dataset: &DatasetDescriptor,
        descriptor_path: &Utf8Path,
    ) -> Result<Vec<IndexVersion>, BuildError> {
        let dataset_dir = descriptor_path.parent().ok_or_else(|| {
            BuildError::Filesystem(format!("no parent directory for {descriptor_path}"))
        })?;
        let metadata_paths = scan::find_files(dataset_dir, |name| name == VERSION_DESCRIPTOR_FILE)?;

        let mut versions = metadata_paths
            .iter()
            .map(|path| VersionDescriptor::load(path))
            .collect::<Result<Vec<_>, _>>()?;
        // Newest first; index 0 becomes the `latest` alias.
        versions.sort_by(|a, b| b.datetime.cmp(&a.datetime));

        let mut indexed = Vec::with_capacity(versions.len());
        for (i, version) in versions.into_iter().enumerate() {
            let latest = i == 0;
            let paths = self.layout.resolve(dataset, &version);
            debug!(dataset = %dataset.name, version = %version.datetime, latest, "materializing version");
            self.materialize_version(dataset, &version, &paths, latest)?;
            indexed.push(IndexVersion {
                datetime: version.datetime,
                files: paths.file_urls,
                zip_bundle: paths.zip_bundle_url,
                latest,
                extra: version.extra,
            });
        }
        Ok(indexed)
    }

    /// Write `tag.json`, copy the declared files, produce the zip bundle and,
    /// for the newest version, the `latest` alias directory.
    fn materialize_version(
        &self,
        dataset: &DatasetDescriptor,
        version: &VersionDescriptor,
        paths: &VersionPaths,
        latest: bool,
    ) -> Result<(), BuildError> {
        let tag = descriptor::merge_tag(version, dataset);
        fs_util::write_json(&tag, &paths.output_files_dir.join(TAG_FILE))?;

        for filename in version.files.values() {
            let source = paths.input_files_dir.join(filename);
            let dest = paths.output_files_dir.join(filename);
            fs_util::copy_file(&source, &dest)?;
        }

        // The zip source is the output files dir, so the bundle includes the
        // tag document written above.
        fs_util::zip_dir(&paths.zip_src_dir, &paths.zip_path)?;

        if latest {
            fs_util::copy_dir_recursive(&paths.output_files_dir, &self.layout.latest_dir(dataset))?;
        }
        Ok(())
    }
}
