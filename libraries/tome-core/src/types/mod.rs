mod bookmark;
mod item;

pub use bookmark::{Bookmark, BookmarkKind};
pub use item::{Chapter, PlayableItem};
