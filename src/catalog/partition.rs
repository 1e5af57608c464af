//! Query partitioning for windowed search enumeration.
//!
//! The search endpoint caps how many results any one query can page through,
//! so the catalog is sliced into many narrower queries: each lowercase letter,
//! each digit, and finally the empty query as a catch-all.

/// Label used for the empty catch-all fragment in reports.
pub const CATCH_ALL_LABEL: &str = "(other)";

/// Produces the fixed, finite sequence of query fragments.
///
/// # Example
///
/// ```
/// use mixamo_core::catalog::QueryPartitioner;
///
/// let fragments: Vec<String> = QueryPartitioner::new().collect();
/// assert_eq!(fragments.len(), 37);
/// assert_eq!(fragments[0], "a");
/// assert_eq!(fragments[26], "0");
/// assert_eq!(fragments[36], "");
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryPartitioner {
    position: usize,
}

const LETTERS: usize = 26;
const DIGITS: usize = 10;

impl QueryPartitioner {
    /// Creates a partitioner positioned at the first fragment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of fragments in the sequence.
    #[must_use]
    pub const fn total() -> usize {
        LETTERS + DIGITS + 1
    }

    /// Human-readable label for a fragment (the catch-all has no text).
    #[must_use]
    pub fn label(fragment: &str) -> &str {
        if fragment.is_empty() {
            CATCH_ALL_LABEL
        } else {
            fragment
        }
    }
}

impl Iterator for QueryPartitioner {
    type Item = String;

    #[allow(clippy::cast_possible_truncation)]
    fn next(&mut self) -> Option<String> {
        let index = self.position;
        let fragment = if index < LETTERS {
            char::from(b'a' + index as u8).to_string()
        } else if index < LETTERS + DIGITS {
            char::from(b'0' + (index - LETTERS) as u8).to_string()
        } else if index == LETTERS + DIGITS {
            String::new()
        } else {
            return None;
        };
        self.position += 1;
        Some(fragment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = Self::total().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for QueryPartitioner {}
