use bcrypt::{hash, verify};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::db_operations::{db_timestamp, optional_timestamp_at, timestamp_at, DbError};
use crate::models::{NewUser, ProfileChanges, User};

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, is_staff, date_joined, last_login";

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        is_staff: row.get(5)?,
        date_joined: timestamp_at(row, 6)?,
        last_login: optional_timestamp_at(row, 7)?,
    })
}

pub fn create_user(conn: &Connection, new_user: &NewUser, cost: u32) -> Result<i64, DbError> {
    let hashed_password = hash(&new_user.password, cost)?;
    conn.execute(
        "INSERT INTO users (username, password_hash, first_name, last_name, email, is_staff, date_joined)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            new_user.username,
            hashed_password,
            new_user.first_name,
            new_user.last_name,
            new_user.email,
            new_user.is_staff,
            db_timestamp(&Utc::now()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_user_by_id(conn: &Connection, user_id: i64) -> Result<Option<User>, DbError> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    Ok(conn.query_row(&sql, [user_id], user_from_row).optional()?)
}

pub fn read_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>, DbError> {
    let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
    Ok(conn.query_row(&sql, [username], user_from_row).optional()?)
}

pub fn read_staff_users(conn: &Connection) -> Result<Vec<User>, DbError> {
    let sql = format!("SELECT {} FROM users WHERE is_staff = 1 ORDER BY username", USER_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map([], user_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}

/// Returns the user only when the password matches the stored hash.
pub fn verify_credentials(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<Option<User>, DbError> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT password_hash FROM users WHERE username = ?1",
            [username],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        Some(password_hash) if verify(password, &password_hash).unwrap_or(false) => {
            read_user_by_username(conn, username)
        }
        _ => Ok(None),
    }
}

pub fn update_last_login(conn: &Connection, user_id: i64) -> Result<(), DbError> {
    conn.execute(
        "UPDATE users SET last_login = ?1 WHERE id = ?2",
        params![db_timestamp(&Utc::now()), user_id],
    )?;
    Ok(())
}

pub fn update_profile(conn: &Connection, user_id: i64, changes: &ProfileChanges) -> Result<usize, DbError> {
    Ok(conn.execute(
        "UPDATE users SET username = ?1, first_name = ?2, last_name = ?3, email = ?4 WHERE id = ?5",
        params![changes.username, changes.first_name, changes.last_name, changes.email, user_id],
    )?)
}

pub fn set_password(conn: &Connection, username: &str, new_password: &str, cost: u32) -> Result<usize, DbError> {
    let hashed_password = hash(new_password, cost)?;
    Ok(conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE username = ?2",
        params![hashed_password, username],
    )?)
}
