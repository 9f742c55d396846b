use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::error::BlogError;
use crate::helper::pagination::{Page, PageWindow};
use crate::helper::visibility::{self, FeedFilter};
use crate::models::db_operations::posts_db_operations;
use crate::models::PostEntry;

/// Counts, paginates and loads one page of a feed. A page outside the
/// listing is not-found.
pub fn fetch_feed_page(
    conn: &Connection,
    filter: &FeedFilter,
    requested_page: Option<&str>,
    per_page: u32,
) -> Result<Page<PostEntry>, BlogError> {
    let total = posts_db_operations::count_feed(conn, filter)?;
    let window = PageWindow::resolve(requested_page, total, per_page).ok_or(BlogError::NotFound)?;
    let posts = posts_db_operations::read_feed(conn, filter, window.per_page, window.offset())?;
    Ok(Page::new(&window, posts))
}

/// Fetch-or-404 with the visibility check applied: a post the viewer may not
/// see is reported exactly like a missing one.
pub fn load_visible_post(
    conn: &Connection,
    post_id: i64,
    viewer_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<PostEntry, BlogError> {
    let post = posts_db_operations::read_post_entry(conn, post_id)?.ok_or(BlogError::NotFound)?;
    if visibility::can_view(&post, viewer_id, now) {
        Ok(post)
    } else {
        Err(BlogError::NotFound)
    }
}
