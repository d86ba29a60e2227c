//! Errors which abort the current operation.
//!
//! Conditions which can be recovered from (incomplete configuration, unknown
//! surface labels, unknown materials) are not errors: they are reported with
//! `tracing::warn!` and the operation carries on or is skipped.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum FatalError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot read `{}`: {source}", path.display())]
    File { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Binary(#[from] binrw::Error),

    #[error("corrupt compressed payload: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),

    #[error(transparent)]
    UnknownUnit(#[from] units::UnitError),

    #[error(transparent)]
    Mesh(#[from] geometry::MeshError),

    #[error("the up vector is parallel to the source-detector axis")]
    DegenerateDetectorBasis,

    #[error("a source point coincides with the detector position or lies in its plane")]
    SourceAtDetector,

    #[error("at least one rotation angle is required")]
    ZeroAngles,

    #[error("{}:{line}: {msg}", path.display())]
    Parse { path: PathBuf, line: usize, msg: String },

    #[error("malformed image file: {0}")]
    Format(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FatalError>;

impl FatalError {
    pub(crate) fn file(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::File { path, source }
    }
}
