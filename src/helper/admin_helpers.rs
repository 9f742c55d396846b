use crate::models::db_operations::{posts_db_operations, taxonomy_db_operations, DbError};
use crate::models::{Category, CategoryDraft, Location, LocationDraft, PostEntry};
use crate::DbPool;
use actix_web::web;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminHelperError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Row not found")]
    NotFound,
}

impl AdminHelperError {
    /// Message shown to the administrator in the dashboard notification.
    pub fn user_message(&self) -> &'static str {
        match self {
            AdminHelperError::Database(e) if e.is_unique_violation() => "That slug is already in use.",
            AdminHelperError::NotFound => "The record no longer exists.",
            _ => "A database error occurred.",
        }
    }
}

#[derive(Serialize)]
pub struct Dashboard {
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
    pub posts: Vec<PostEntry>,
}

fn get_conn(pool: &web::Data<DbPool>) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>, AdminHelperError> {
    pool.get().map_err(AdminHelperError::Pool)
}

fn expect_one(changed: usize) -> Result<(), AdminHelperError> {
    if changed == 0 {
        Err(AdminHelperError::NotFound)
    } else {
        Ok(())
    }
}

pub fn fetch_dashboard(pool: &web::Data<DbPool>) -> Result<Dashboard, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(Dashboard {
        categories: taxonomy_db_operations::read_all_categories(&conn)?,
        locations: taxonomy_db_operations::read_all_locations(&conn)?,
        posts: posts_db_operations::read_all_post_entries(&conn)?,
    })
}

pub fn create_category(pool: &web::Data<DbPool>, draft: &CategoryDraft) -> Result<i64, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(taxonomy_db_operations::create_category(&conn, draft)?)
}

pub fn update_category(pool: &web::Data<DbPool>, category_id: i64, draft: &CategoryDraft) -> Result<(), AdminHelperError> {
    let conn = get_conn(pool)?;
    expect_one(taxonomy_db_operations::update_category(&conn, category_id, draft)?)
}

pub fn delete_category(pool: &web::Data<DbPool>, category_id: i64) -> Result<(), AdminHelperError> {
    let conn = get_conn(pool)?;
    expect_one(taxonomy_db_operations::delete_category(&conn, category_id)?)
}

pub fn create_location(pool: &web::Data<DbPool>, draft: &LocationDraft) -> Result<i64, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(taxonomy_db_operations::create_location(&conn, draft)?)
}

pub fn update_location(pool: &web::Data<DbPool>, location_id: i64, draft: &LocationDraft) -> Result<(), AdminHelperError> {
    let conn = get_conn(pool)?;
    expect_one(taxonomy_db_operations::update_location(&conn, location_id, draft)?)
}

pub fn delete_location(pool: &web::Data<DbPool>, location_id: i64) -> Result<(), AdminHelperError> {
    let conn = get_conn(pool)?;
    expect_one(taxonomy_db_operations::delete_location(&conn, location_id)?)
}

pub fn set_post_published(pool: &web::Data<DbPool>, post_id: i64, is_published: bool) -> Result<(), AdminHelperError> {
    let conn = get_conn(pool)?;
    expect_one(posts_db_operations::set_post_published(&conn, post_id, is_published)?)
}
