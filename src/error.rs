use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("input directory not found: {0}")]
    InputDirMissing(Utf8PathBuf),

    #[error("declared dataset file not found: {0}")]
    SourceFileMissing(Utf8PathBuf),

    #[error("failed to parse {path}: {message}")]
    Parse { path: Utf8PathBuf, message: String },

    #[error("{path} is missing required field `{field}`")]
    MissingField {
        path: Utf8PathBuf,
        field: &'static str,
    },

    #[error("duplicate dataset name `{name}`: {first} and {second}")]
    DuplicateDataset {
        name: String,
        first: Utf8PathBuf,
        second: Utf8PathBuf,
    },
}
