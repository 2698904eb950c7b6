use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("parse error at {path}:{line}: {msg}")]
    Parse {
        path: String,
        line: usize,
        msg: String,
    },
    #[error("unknown feature template: {0}")]
    UnknownTemplate(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("decode error: {0}")]
    Decode(String),
}
