use std::collections::VecDeque;

use super::Document;

/// Result set of an example query.
///
/// `count()` reports the full size of the result set, independent of how
/// many documents have been consumed.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    documents: VecDeque<Document>,
    count: usize,
}

impl Cursor {
    pub fn new(documents: Vec<Document>) -> Self {
        let count = documents.len();
        Self {
            documents: documents.into(),
            count,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Remaining documents.
    pub fn all(self) -> Vec<Document> {
        self.documents.into()
    }
}

impl Iterator for Cursor {
    type Item = Document;

    fn next(&mut self) -> Option<Self::Item> {
        self.documents.pop_front()
    }
}
