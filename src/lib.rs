use std::path::Path;

use actix_csrf::CsrfMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::http::Method;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rand::rngs::StdRng;

pub type DbPool = Pool<SqliteConnectionManager>;

pub mod config;
pub mod error;
pub mod helper;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod setup;

/// Opens a pooled SQLite store with foreign keys enforced on every connection.
pub fn open_pool(db_path: &Path) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    Pool::builder().build(manager)
}

pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build()
}

/// Issues a fresh CSRF cookie on every page that renders a form. The POST
/// handlers check the submitted `csrf_token` against it.
pub fn csrf_middleware() -> CsrfMiddleware<StdRng> {
    routes::PAGE_PATTERNS
        .iter()
        .fold(CsrfMiddleware::<StdRng>::new(), |csrf, pattern| csrf.set_cookie(Method::GET, *pattern))
}
