use chisel_blob::BlobError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("toml write: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid share data: {0}")]
    Share(String),
    #[error("document uses side {found}, world uses {expected}")]
    SideMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Blob(#[from] BlobError),
}
