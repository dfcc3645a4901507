use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("randomness source: {0}")]
    Source(String),
    #[error("generated digits are not a number: {0}")]
    Parse(String),
}
