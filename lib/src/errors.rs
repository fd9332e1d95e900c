use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum D2sError {
    #[error("the file {0:?} does not exist")]
    InputNotFound(PathBuf),
    #[error("kmer sizes are different between the two datasets: {left}:{left_len} {right}:{right_len}")]
    KmerLengthMismatch {
        left: String,
        left_len: usize,
        right: String,
        right_len: usize,
    },
    #[error("malformed frequency file (line {line}): {reason}")]
    MalformedFrequencyFile { line: usize, reason: String },
    #[error("failed to parse line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("kmers not sorted: key {current} on line {line} does not follow {previous}")]
    UnsortedInput {
        line: usize,
        previous: u128,
        current: u128,
    },
    #[error("no frequency for character {0:?}")]
    UnknownCharacter(char),
    #[error("failed to load/read/write file: {0:?}")]
    Io(#[from] std::io::Error),
    #[error("D2S error: {0}")]
    Message(String),
}

pub type D2sResult<T> = StdResult<T, D2sError>;

#[doc(hidden)]
#[macro_export]
macro_rules! format_err {
    ($($arg:tt)*) => { $crate::errors::D2sError::Message(format!($($arg)*)) }
}
