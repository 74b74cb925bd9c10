pub mod state;
pub mod text_box;

pub use state::{PageState, Stroke};
pub use text_box::{FontStyle, TextBox};

use serde::{Deserialize, Serialize};

/// Stable page identity, allocated monotonically by the document.
///
/// History entries and in-flight regenerations refer to pages by id, never
/// by position, so page reordering and deletion cannot redirect them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub u64);

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page#{}", self.0)
    }
}
