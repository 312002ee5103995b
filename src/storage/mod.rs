pub mod bookmarks;
pub mod slot;

pub use bookmarks::{BookmarkAction, BookmarkSet};
pub use slot::{BookmarkSlot, FileSlot, MemorySlot};
