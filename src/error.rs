use thiserror::Error;

/// Why a page produced no usable screenplay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("no <pre> screenplay block found in document")]
    NoContentFound,

    #[error("screenplay body too short ({chars} non-whitespace chars)")]
    EmptyOrTooShort { chars: usize },
}
