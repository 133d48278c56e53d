use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

use crate::error::BuildError;

/// Recursively collect the files under `root` whose name satisfies `matches`.
/// Traversal is sorted by file name at every level, so the result order does
/// not depend on the underlying filesystem.
pub fn find_files<M>(root: &Utf8Path, matches: M) -> Result<Vec<Utf8PathBuf>, BuildError>
where
    M: Fn(&str) -> bool,
{
    if !root.is_dir() {
        return Err(BuildError::InputDirMissing(root.to_owned()));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root.as_std_path())
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| BuildError::Filesystem(err.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            return Err(BuildError::Filesystem(format!(
                "non-utf8 file name under {root}"
            )));
        };
        if !matches(name) {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(entry.into_path()).map_err(|path| {
            BuildError::Filesystem(format!("non-utf8 path: {}", path.display()))
        })?;
        found.push(path);
    }
    Ok(found)
}
