mod nav_bar;
mod page;
mod status_bar;

pub use nav_bar::NavBarWidget;
pub use page::PageWidget;
pub use status_bar::StatusBarWidget;

use unicode_width::UnicodeWidthStr;

/// Spaces needed to push `right` to the edge of a `width`-cell line
fn padding(width: u16, left: &str, right: &str) -> String {
    let used = UnicodeWidthStr::width(left) + UnicodeWidthStr::width(right);
    " ".repeat((width as usize).saturating_sub(used))
}
