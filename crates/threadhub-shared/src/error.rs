use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Invalid key bytes")]
    InvalidKeyBytes,

    #[error("Key file error: {0}")]
    KeyFile(String),
}

/// Failure to parse a textual thread id or owner key.
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Empty value")]
    Empty,

    #[error("Unsupported thread id version: {0:#04x}")]
    UnsupportedVersion(u8),

    #[error("Unknown thread variant: {0:#04x}")]
    UnknownVariant(u8),

    #[error("Thread id too short: {0} bytes")]
    TooShort(usize),
}
