use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::db_operations::{db_timestamp, timestamp_at, DbError};
use crate::models::{Category, CategoryDraft, Location, LocationDraft};

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        slug: row.get(3)?,
        is_published: row.get(4)?,
        created_at: timestamp_at(row, 5)?,
    })
}

fn location_from_row(row: &Row) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        is_published: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
    })
}

// --- Categories ---

pub fn create_category(conn: &Connection, draft: &CategoryDraft) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO categories (title, description, slug, is_published, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![draft.title, draft.description, draft.slug, draft.is_published, db_timestamp(&Utc::now())],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_all_categories(conn: &Connection) -> Result<Vec<Category>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, slug, is_published, created_at FROM categories ORDER BY title",
    )?;
    let categories = stmt
        .query_map([], category_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(categories)
}

/// Looks a category up by slug, hiding unpublished ones.
pub fn read_published_category_by_slug(conn: &Connection, slug: &str) -> Result<Option<Category>, DbError> {
    Ok(conn
        .query_row(
            "SELECT id, title, description, slug, is_published, created_at FROM categories
             WHERE slug = ?1 AND is_published = 1",
            [slug],
            category_from_row,
        )
        .optional()?)
}

pub fn update_category(conn: &Connection, category_id: i64, draft: &CategoryDraft) -> Result<usize, DbError> {
    Ok(conn.execute(
        "UPDATE categories SET title = ?1, description = ?2, slug = ?3, is_published = ?4 WHERE id = ?5",
        params![draft.title, draft.description, draft.slug, draft.is_published, category_id],
    )?)
}

pub fn delete_category(conn: &Connection, category_id: i64) -> Result<usize, DbError> {
    Ok(conn.execute("DELETE FROM categories WHERE id = ?1", [category_id])?)
}

// --- Locations ---

pub fn create_location(conn: &Connection, draft: &LocationDraft) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO locations (name, is_published, created_at) VALUES (?1, ?2, ?3)",
        params![draft.name, draft.is_published, db_timestamp(&Utc::now())],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_all_locations(conn: &Connection) -> Result<Vec<Location>, DbError> {
    let mut stmt = conn.prepare("SELECT id, name, is_published, created_at FROM locations ORDER BY name")?;
    let locations = stmt
        .query_map([], location_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(locations)
}

pub fn update_location(conn: &Connection, location_id: i64, draft: &LocationDraft) -> Result<usize, DbError> {
    Ok(conn.execute(
        "UPDATE locations SET name = ?1, is_published = ?2 WHERE id = ?3",
        params![draft.name, draft.is_published, location_id],
    )?)
}

pub fn delete_location(conn: &Connection, location_id: i64) -> Result<usize, DbError> {
    Ok(conn.execute("DELETE FROM locations WHERE id = ?1", [location_id])?)
}
