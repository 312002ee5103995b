use crate::{models::Item, storage::BookmarkSet};

/// The list the grid shows: the fetched list as-is, or, in bookmarks-only
/// mode, the bookmarked subset in fetch order.
pub fn displayed_items<'a>(
    items: &'a [Item],
    bookmarks: &BookmarkSet,
    bookmarks_only: bool,
) -> Vec<&'a Item> {
    items
        .iter()
        .filter(|item| !bookmarks_only || bookmarks.contains(item.id))
        .collect()
}
