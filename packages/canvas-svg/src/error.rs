/// Errors produced while reading presentation attributes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid length: {0:?}")]
    InvalidLength(String),

    #[error("Unsupported length unit in {0:?}")]
    UnsupportedUnit(String),

    #[error("Invalid transform: {0:?}")]
    InvalidTransform(String),

    #[error("Transform {name} expects {expected} arguments, got {got}")]
    TransformArity {
        name: String,
        expected: &'static str,
        got: usize,
    },
}
