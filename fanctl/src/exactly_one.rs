use thiserror::Error as ThisError;

/// Trait for implementing something similar to
/// <https://docs.rs/itertools/latest/itertools/trait.Itertools.html#method.exactly_one>
/// but reporting how many items there were on ambiguity.
pub trait ExactlyOneIter: Iterator + Sized {
    fn exactly_one(mut self) -> Result<Self::Item, ExactlyOneError> {
        match (self.next(), self.next()) {
            (None, _) => Err(ExactlyOneError::Zero),
            (Some(item), None) => Ok(item),
            (Some(_), Some(_)) => Err(ExactlyOneError::MoreThanOne(2 + self.count())),
        }
    }
}

impl<T> ExactlyOneIter for T where T: Iterator {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum ExactlyOneError {
    #[error("zero items found")]
    Zero,
    #[error("{0} items found")]
    MoreThanOne(usize),
}
