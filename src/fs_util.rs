use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde_json::Value;
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::BuildError;

pub fn read_json(path: &Utf8Path) -> Result<Value, BuildError> {
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|err| BuildError::Filesystem(format!("read {path}: {err}")))?;
    serde_json::from_str(&content).map_err(|err| BuildError::Parse {
        path: path.to_owned(),
        message: err.to_string(),
    })
}

/// Write `value` as deterministic JSON: sorted keys, 2-space indentation,
/// trailing newline. Goes through a temp file in the target directory so an
/// aborted run never leaves a half-written document behind.
pub fn write_json<T: Serialize>(value: &T, path: &Utf8Path) -> Result<(), BuildError> {
    // Round-tripping through Value sorts object keys; serde_json's default
    // map is ordered.
    let value = serde_json::to_value(value).map_err(|err| BuildError::Filesystem(err.to_string()))?;
    let mut content =
        serde_json::to_vec_pretty(&value).map_err(|err| BuildError::Filesystem(err.to_string()))?;
    content.push(b'\n');
    write_bytes_atomic(path, &content)
}

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), BuildError> {
    let parent = path
        .parent()
        .ok_or_else(|| BuildError::Filesystem("invalid destination path".to_string()))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| BuildError::Filesystem(err.to_string()))?;
    let temp = tempfile::Builder::new()
        .prefix("dataset-builder-json")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| BuildError::Filesystem(err.to_string()))?;
    fs::write(temp.path(), content).map_err(|err| BuildError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| BuildError::Filesystem(err.to_string()))?;
    Ok(())
}

/// Copy one file, carrying over the source modification time.
pub fn copy_file(source: &Utf8Path, dest: &Utf8Path) -> Result<(), BuildError> {
    if !source.is_file() {
        return Err(BuildError::SourceFileMissing(source.to_owned()));
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| BuildError::Filesystem(err.to_string()))?;
    }
    let modified = fs::metadata(source.as_std_path())
        .and_then(|meta| meta.modified())
        .map_err(|err| BuildError::Filesystem(format!("stat {source}: {err}")))?;
    fs::copy(source.as_std_path(), dest.as_std_path())
        .map_err(|err| BuildError::Filesystem(format!("copy {source} -> {dest}: {err}")))?;
    let file = fs::File::options()
        .write(true)
        .open(dest.as_std_path())
        .map_err(|err| BuildError::Filesystem(err.to_string()))?;
    file.set_modified(modified)
        .map_err(|err| BuildError::Filesystem(err.to_string()))?;
    Ok(())
}

pub fn copy_dir_recursive(source: &Utf8Path, dest: &Utf8Path) -> Result<(), BuildError> {
    fs::create_dir_all(dest.as_std_path())
        .map_err(|err| BuildError::Filesystem(err.to_string()))?;
    for entry in WalkDir::new(source.as_std_path())
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| BuildError::Filesystem(err.to_string()))?;
        let is_dir = entry.file_type().is_dir();
        let entry_path = Utf8PathBuf::from_path_buf(entry.into_path()).map_err(|path| {
            BuildError::Filesystem(format!("non-utf8 path: {}", path.display()))
        })?;
        let relative = entry_path
            .strip_prefix(source)
            .map_err(|err| BuildError::Filesystem(err.to_string()))?;
        if relative.as_str().is_empty() {
            continue;
        }
        let target = dest.join(relative);
        if is_dir {
            fs::create_dir_all(target.as_std_path())
                .map_err(|err| BuildError::Filesystem(err.to_string()))?;
        } else {
            copy_file(&entry_path, &target)?;
        }
    }
    Ok(())
}

pub fn remove_dir_all_if_exists(path: &Utf8Path) -> Result<(), BuildError> {
    if path.as_std_path().exists() {
        fs::remove_dir_all(path.as_std_path())
            .map_err(|err| BuildError::Filesystem(format!("remove {path}: {err}")))?;
    }
    Ok(())
}

/// Zip the contents of `source_dir` into `zip_path`. Member names are
/// relative to `source_dir`; the archive has no wrapper directory.
pub fn zip_dir(source_dir: &Utf8Path, zip_path: &Utf8Path) -> Result<(), BuildError> {
    if let Some(parent) = zip_path.parent() {
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| BuildError::Filesystem(err.to_string()))?;
    }
    let file = fs::File::create(zip_path.as_std_path())
        .map_err(|err| BuildError::Filesystem(format!("create zip {zip_path}: {err}")))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for entry in WalkDir::new(source_dir.as_std_path())
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| BuildError::Filesystem(err.to_string()))?;
        let is_dir = entry.file_type().is_dir();
        let entry_path = Utf8PathBuf::from_path_buf(entry.into_path()).map_err(|path| {
            BuildError::Filesystem(format!("non-utf8 path: {}", path.display()))
        })?;
        let relative = entry_path
            .strip_prefix(source_dir)
            .map_err(|err| BuildError::Filesystem(err.to_string()))?;
        if relative.as_str().is_empty() {
            continue;
        }
        if is_dir {
            writer
                .add_directory(relative.as_str(), options)
                .map_err(|err| BuildError::Filesystem(err.to_string()))?;
            continue;
        }
        writer
            .start_file(relative.as_str(), options)
            .map_err(|err| BuildError::Filesystem(err.to_string()))?;
        let mut input = fs::File::open(entry_path.as_std_path())
            .map_err(|err| BuildError::Filesystem(format!("open {entry_path}: {err}")))?;
        io::copy(&mut input, &mut writer)
            .map_err(|err| BuildError::Filesystem(err.to_string()))?;
    }

    writer
        .finish()
        .map_err(|err| BuildError::Filesystem(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn utf8_root(temp: &tempfile::TempDir) -> &Utf8Path {
        Utf8Path::from_path(temp.path()).unwrap()
    }

    #[test]
    fn write_json_is_deterministic() {
        let temp = tempfile::tempdir().unwrap();
        let path = utf8_root(&temp).join("out.json");

        let value = json!({"b": 1, "a": {"d": 2, "c": 3}});
        write_json(&value, &path).unwrap();

        let content = fs::read_to_string(path.as_std_path()).unwrap();
        assert_eq!(
            content,
            "{\n  \"a\": {\n    \"c\": 3,\n    \"d\": 2\n  },\n  \"b\": 1\n}\n"
        );
    }

    #[test]
    fn write_json_leaves_no_temp_files() {
        let temp = tempfile::tempdir().unwrap();
        let path = utf8_root(&temp).join("out.json");
        write_json(&json!({"a": 1}), &path).unwrap();

        let entries: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, ["out.json"]);
    }

    #[test]
    fn copy_file_preserves_mtime() {
        let temp = tempfile::tempdir().unwrap();
        let source = utf8_root(&temp).join("a.txt");
        let dest = utf8_root(&temp).join("nested/b.txt");
        fs::write(source.as_std_path(), b"payload").unwrap();

        copy_file(&source, &dest).unwrap();

        let source_mtime = fs::metadata(source.as_std_path()).unwrap().modified().unwrap();
        let dest_mtime = fs::metadata(dest.as_std_path()).unwrap().modified().unwrap();
        assert_eq!(source_mtime, dest_mtime);
        assert_eq!(fs::read(dest.as_std_path()).unwrap(), b"payload");
    }

    #[test]
    fn copy_file_missing_source() {
        let temp = tempfile::tempdir().unwrap();
        let source = utf8_root(&temp).join("absent.txt");
        let dest = utf8_root(&temp).join("b.txt");

        let err = copy_file(&source, &dest).unwrap_err();
        assert_matches!(err, BuildError::SourceFileMissing(_));
    }

    #[test]
    fn zip_dir_members_are_relative() {
        let temp = tempfile::tempdir().unwrap();
        let source = utf8_root(&temp).join("files");
        fs::create_dir_all(source.join("inner").as_std_path()).unwrap();
        fs::write(source.join("tag.json").as_std_path(), b"{}\n").unwrap();
        fs::write(source.join("inner/ref.fasta").as_std_path(), b">ref\n").unwrap();

        let zip_path = utf8_root(&temp).join("bundle.zip");
        zip_dir(&source, &zip_path).unwrap();

        let file = fs::File::open(zip_path.as_std_path()).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        let mut names: Vec<_> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(names, ["inner/", "inner/ref.fasta", "tag.json"]);
    }

    #[test]
    fn copy_dir_recursive_mirrors_tree() {
        let temp = tempfile::tempdir().unwrap();
        let source = utf8_root(&temp).join("src");
        fs::create_dir_all(source.join("sub").as_std_path()).unwrap();
        fs::write(source.join("a.txt").as_std_path(), b"a").unwrap();
        fs::write(source.join("sub/b.txt").as_std_path(), b"b").unwrap();

        let dest = utf8_root(&temp).join("dst");
        copy_dir_recursive(&source, &dest).unwrap();

        assert_eq!(fs::read(dest.join("a.txt").as_std_path()).unwrap(), b"a");
        assert_eq!(fs::read(dest.join("sub/b.txt").as_std_path()).unwrap(), b"b");
    }
}
