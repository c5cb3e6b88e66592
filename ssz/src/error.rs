use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum BitError {
    #[error("expected bit list to have no more than {maximum} bits, found {actual} bits")]
    ListTooLong { maximum: usize, actual: usize },
    #[error("bit index {index} is out of bounds (length: {length})")]
    IndexOutOfBounds { index: usize, length: usize },
}
