use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::db_operations::{db_timestamp, timestamp_at, DbError};
use crate::models::{Comment, CommentEntry};

pub fn create_comment(conn: &Connection, post_id: i64, author_id: i64, text: &str) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO comments (text, created_at, author_id, post_id) VALUES (?1, ?2, ?3, ?4)",
        params![text, db_timestamp(&Utc::now()), author_id, post_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_comment(conn: &Connection, comment_id: i64) -> Result<Option<Comment>, DbError> {
    Ok(conn
        .query_row(
            "SELECT id, text, created_at, author_id, post_id FROM comments WHERE id = ?1",
            [comment_id],
            |row| {
                Ok(Comment {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    created_at: timestamp_at(row, 2)?,
                    author_id: row.get(3)?,
                    post_id: row.get(4)?,
                })
            },
        )
        .optional()?)
}

/// Comments of one post, oldest first, with their authors' usernames.
pub fn read_comments_for_post(conn: &Connection, post_id: i64) -> Result<Vec<CommentEntry>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT cm.id, cm.text, cm.created_at, cm.author_id, u.username, cm.post_id
         FROM comments cm JOIN users u ON u.id = cm.author_id
         WHERE cm.post_id = ?1
         ORDER BY cm.created_at, cm.id",
    )?;
    let comments = stmt
        .query_map([post_id], |row| {
            Ok(CommentEntry {
                id: row.get(0)?,
                text: row.get(1)?,
                created_at: timestamp_at(row, 2)?,
                author_id: row.get(3)?,
                author_username: row.get(4)?,
                post_id: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(comments)
}

pub fn update_comment(conn: &Connection, comment_id: i64, text: &str) -> Result<usize, DbError> {
    Ok(conn.execute(
        "UPDATE comments SET text = ?1 WHERE id = ?2",
        params![text, comment_id],
    )?)
}

pub fn delete_comment(conn: &Connection, comment_id: i64) -> Result<usize, DbError> {
    Ok(conn.execute("DELETE FROM comments WHERE id = ?1", [comment_id])?)
}
