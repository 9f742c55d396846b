use crate::config::Config;
use crate::error::BlogError;
use crate::helper::form_helpers::{CommentForm, FieldErrors};
use crate::helper::public_helpers;
use crate::helper::render;
use crate::helper::visibility::FeedFilter;
use crate::middleware::Viewer;
use crate::models::db_operations::{comments_db_operations, taxonomy_db_operations, users_db_operations};
use crate::DbPool;
use actix_csrf::extractor::CsrfToken;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use tera::Tera;

#[derive(Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

pub fn config_public(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/category/{category_slug}/", web::get().to(category_posts))
        .route("/profile/{username}/", web::get().to(profile_posts))
        .route("/posts/{post_id:\\d+}/", web::get().to(post_detail));
}

async fn index(
    viewer: Viewer,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    let conn = pool.get()?;
    let filter = FeedFilter::home(Utc::now());
    let page = public_helpers::fetch_feed_page(&conn, &filter, query.page.as_deref(), config.posts_per_page)?;

    let mut ctx = render::base_context(viewer.user(), token.get());
    ctx.insert("page", &page);
    render::render(&tera, "blog/index.html", &ctx)
}

async fn category_posts(
    viewer: Viewer,
    slug: web::Path<String>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    let conn = pool.get()?;
    let category = taxonomy_db_operations::read_published_category_by_slug(&conn, &slug)?
        .ok_or(BlogError::NotFound)?;

    let filter = FeedFilter::category(&category.slug, Utc::now());
    let page = public_helpers::fetch_feed_page(&conn, &filter, query.page.as_deref(), config.posts_per_page)?;

    let mut ctx = render::base_context(viewer.user(), token.get());
    ctx.insert("category", &category);
    ctx.insert("page", &page);
    render::render(&tera, "blog/category.html", &ctx)
}

/// The owner sees every post of theirs, drafts and scheduled ones included;
/// everyone else gets the public feed of that author.
async fn profile_posts(
    viewer: Viewer,
    username: web::Path<String>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    let conn = pool.get()?;
    let profile = users_db_operations::read_user_by_username(&conn, &username)?
        .ok_or(BlogError::NotFound)?;

    let filter = FeedFilter::author(profile.id, viewer.user_id(), Utc::now());
    let page = public_helpers::fetch_feed_page(&conn, &filter, query.page.as_deref(), config.posts_per_page)?;

    let mut ctx = render::base_context(viewer.user(), token.get());
    ctx.insert("profile", &profile);
    ctx.insert("full_name", &profile.full_name());
    ctx.insert("is_owner", &(viewer.user_id() == Some(profile.id)));
    ctx.insert("page", &page);
    render::render(&tera, "blog/profile.html", &ctx)
}

async fn post_detail(
    viewer: Viewer,
    post_id: web::Path<i64>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    let conn = pool.get()?;
    let post = public_helpers::load_visible_post(&conn, *post_id, viewer.user_id(), Utc::now())?;
    let comments = comments_db_operations::read_comments_for_post(&conn, post.id)?;

    let mut ctx = render::base_context(viewer.user(), token.get());
    ctx.insert("post", &post);
    ctx.insert("comments", &comments);
    ctx.insert("form", &CommentForm::default());
    ctx.insert("errors", &FieldErrors::new());
    render::render(&tera, "blog/detail.html", &ctx)
}
