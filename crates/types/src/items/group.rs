use serde::{Deserialize, Serialize};

use super::{DisplayItem, ItemBase};

/// Container for an ordered list of child items.
///
/// A group has no geometry of its own; its bounds are derived from its
/// children. A locked group keeps its children from being moved out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupItem {
    #[serde(flatten)]
    pub base: ItemBase,
    /// Editor tree state
    #[serde(default = "default_expanded")]
    pub expanded: bool,
    #[serde(default)]
    pub items: Vec<DisplayItem>,
}

fn default_expanded() -> bool {
    true
}

impl GroupItem {
    pub fn new(name: impl Into<String>, items: Vec<DisplayItem>) -> Self {
        Self {
            base: ItemBase::new(name, 0, 0, 0, 0),
            expanded: true,
            items,
        }
    }
}
