use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    error::AppResult,
    models::ItemId,
    storage::BookmarkSlot,
};

/// What a toggle did, decided by membership before the toggle
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkAction {
    Added,
    Removed,
}

/// The user's bookmarked item IDs
///
/// Serialized as a JSON array of integers in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkSet {
    ids: BTreeSet<ItemId>,
}

impl BookmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the set from a slot. A missing slot is an empty set; so is an
    /// unreadable or malformed one, which is logged and left to be
    /// overwritten by the next toggle.
    pub fn load(slot: &dyn BookmarkSlot) -> Self {
        let contents = match slot.read() {
            Ok(Some(contents)) => contents,
            Ok(None) => return Self::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read bookmarks, starting empty");
                return Self::new();
            }
        };

        match Self::from_json(&contents) {
            Ok(set) => {
                tracing::info!(count = set.len(), "Loaded bookmarks");
                set
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed bookmarks, starting empty");
                Self::new()
            }
        }
    }

    pub fn from_json(contents: &str) -> AppResult<Self> {
        let ids: Vec<ItemId> = serde_json::from_str(contents)?;
        Ok(ids.into_iter().collect())
    }

    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string(&self.ids)?)
    }

    /// Writes the whole set to the slot
    pub fn persist(&self, slot: &dyn BookmarkSlot) -> AppResult<()> {
        slot.write(&self.to_json()?)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    /// Removes `id` if present, adds it otherwise
    pub fn toggle(&mut self, id: ItemId) -> BookmarkAction {
        if self.ids.remove(&id) {
            BookmarkAction::Removed
        } else {
            self.ids.insert(id);
            BookmarkAction::Added
        }
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.ids.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<ItemId> for BookmarkSet {
    fn from_iter<I: IntoIterator<Item = ItemId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
