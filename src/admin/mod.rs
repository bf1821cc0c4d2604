//! Admin-side helpers: the controls command emitter and cursor-list
//! pagination for list views.

pub mod emitter;
pub mod pager;

pub use emitter::AdminCommandEmitter;
pub use pager::{CursorPager, EventPages, PageSource, WishPages};
