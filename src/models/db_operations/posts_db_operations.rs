use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::helper::visibility::FeedFilter;
use crate::models::db_operations::{db_timestamp, timestamp_at, DbError};
use crate::models::{CategoryLabel, LocationLabel, Post, PostDraft, PostEntry};

const POST_COLUMNS: &str =
    "id, title, text, pub_date, is_published, author_id, category_id, location_id, created_at";

// Shared by the feeds and the detail view; column order is what `entry_from_row` reads.
const ENTRY_SELECT: &str = "SELECT p.id, p.title, p.text, p.pub_date, p.is_published, p.created_at,
        p.author_id, u.username,
        p.category_id, c.title, c.slug, c.is_published,
        p.location_id, l.name, l.is_published,
        (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id";

const ENTRY_ORDER: &str = "ORDER BY p.pub_date DESC, p.id DESC";

fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        pub_date: timestamp_at(row, 3)?,
        is_published: row.get(4)?,
        author_id: row.get(5)?,
        category_id: row.get(6)?,
        location_id: row.get(7)?,
        created_at: timestamp_at(row, 8)?,
    })
}

fn entry_from_row(row: &Row) -> rusqlite::Result<PostEntry> {
    let category = match row.get::<_, Option<i64>>(8)? {
        Some(id) => Some(CategoryLabel {
            id,
            title: row.get(9)?,
            slug: row.get(10)?,
            is_published: row.get(11)?,
        }),
        None => None,
    };
    let location = match row.get::<_, Option<i64>>(12)? {
        Some(id) => Some(LocationLabel {
            id,
            name: row.get(13)?,
            is_published: row.get(14)?,
        }),
        None => None,
    };

    Ok(PostEntry {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        pub_date: timestamp_at(row, 3)?,
        is_published: row.get(4)?,
        created_at: timestamp_at(row, 5)?,
        author_id: row.get(6)?,
        author_username: row.get(7)?,
        category,
        location,
        comment_count: row.get(15)?,
    })
}

pub fn create_post(conn: &Connection, author_id: i64, draft: &PostDraft) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO posts (title, text, pub_date, is_published, author_id, category_id, location_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            draft.title,
            draft.text,
            db_timestamp(&draft.pub_date),
            draft.is_published,
            author_id,
            draft.category_id,
            draft.location_id,
            db_timestamp(&Utc::now()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_post(conn: &Connection, post_id: i64) -> Result<Option<Post>, DbError> {
    let sql = format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS);
    Ok(conn.query_row(&sql, [post_id], post_from_row).optional()?)
}

pub fn read_post_entry(conn: &Connection, post_id: i64) -> Result<Option<PostEntry>, DbError> {
    let sql = format!("{} WHERE p.id = ?1", ENTRY_SELECT);
    Ok(conn.query_row(&sql, [post_id], entry_from_row).optional()?)
}

pub fn update_post(conn: &Connection, post_id: i64, draft: &PostDraft) -> Result<(), DbError> {
    let updated = conn.execute(
        "UPDATE posts SET title = ?1, text = ?2, pub_date = ?3, is_published = ?4, category_id = ?5, location_id = ?6
         WHERE id = ?7",
        params![
            draft.title,
            draft.text,
            db_timestamp(&draft.pub_date),
            draft.is_published,
            draft.category_id,
            draft.location_id,
            post_id,
        ],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("post {}", post_id)));
    }
    Ok(())
}

pub fn set_post_published(conn: &Connection, post_id: i64, is_published: bool) -> Result<usize, DbError> {
    Ok(conn.execute(
        "UPDATE posts SET is_published = ?1 WHERE id = ?2",
        params![is_published, post_id],
    )?)
}

/// Deletes the post; its comments go with it through the foreign key cascade.
pub fn delete_post(conn: &Connection, post_id: i64) -> Result<usize, DbError> {
    Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [post_id])?)
}

pub fn count_feed(conn: &Connection, filter: &FeedFilter) -> Result<u64, DbError> {
    let (conditions, values) = filter.sql_conditions();
    let sql = format!(
        "SELECT COUNT(*) FROM posts p LEFT JOIN categories c ON c.id = p.category_id WHERE {}",
        conditions
    );
    let count: i64 = conn.query_row(&sql, params_from_iter(values), |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

pub fn read_feed(
    conn: &Connection,
    filter: &FeedFilter,
    limit: u32,
    offset: u32,
) -> Result<Vec<PostEntry>, DbError> {
    let (conditions, mut values) = filter.sql_conditions();
    let sql = format!("{} WHERE {} {} LIMIT ? OFFSET ?", ENTRY_SELECT, conditions, ENTRY_ORDER);
    values.push(rusqlite::types::Value::Integer(i64::from(limit)));
    values.push(rusqlite::types::Value::Integer(i64::from(offset)));

    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(params_from_iter(values), entry_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(posts)
}

/// Every post regardless of visibility, for the administrative listing.
pub fn read_all_post_entries(conn: &Connection) -> Result<Vec<PostEntry>, DbError> {
    let sql = format!("{} {}", ENTRY_SELECT, ENTRY_ORDER);
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map([], entry_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(posts)
}
