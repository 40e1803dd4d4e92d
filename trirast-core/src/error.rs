//! Error types for rendering, encoding and scene loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while decoding a BMP file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BmpError {
    #[error("not a BMP file (missing 'BM' magic)")]
    InvalidMagic,

    #[error("unexpected end of BMP data")]
    UnexpectedEnd,

    #[error("unsupported BMP layout: {0}")]
    Unsupported(String),

    #[error("{width}x{height} image does not fit the BMP header fields")]
    TooLarge { width: usize, height: usize },
}

/// Errors that can occur while parsing an STL mesh.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StlError {
    #[error("file too small to be a valid STL ({0} bytes)")]
    TooSmall(usize),

    #[error("unexpected end of file after {parsed} of {expected} facets")]
    Truncated { parsed: usize, expected: usize },

    #[error("failed to parse ASCII STL: {0}")]
    Ascii(String),
}

/// Errors surfaced by the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid camera configuration: {0}")]
    InvalidCamera(String),

    #[error("invalid target dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("failed to allocate a {width}x{height} render target")]
    Allocation { width: usize, height: usize },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Bmp(#[from] BmpError),

    #[error("failed to load mesh {path}: {source}")]
    Stl {
        path: PathBuf,
        #[source]
        source: StlError,
    },

    #[error("invalid scene configuration: {0}")]
    Config(String),

    #[error("deadline exceeded before frame {frame}")]
    DeadlineExceeded { frame: usize },
}

impl RenderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RenderError::Io {
            path: path.into(),
            source,
        }
    }
}
