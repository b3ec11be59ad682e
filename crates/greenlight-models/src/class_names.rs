//! Class index to label lookup table.

use crate::error::{ModelError, ModelResult};

/// Ordered label table for a detection model's output classes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Label for a class index.
    pub fn label(&self, index: usize) -> ModelResult<&str> {
        self.names
            .get(index)
            .map(String::as_str)
            .ok_or(ModelError::UnknownClassIndex {
                index,
                len: self.names.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ClassNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
