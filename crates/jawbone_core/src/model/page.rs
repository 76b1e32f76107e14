//! Source page record.

use serde::{Deserialize, Serialize};

/// One page of the source text, keyed by its page number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: i64,
    pub content: String,
    /// Epoch milliseconds of the last content write.
    pub updated_at: i64,
}
