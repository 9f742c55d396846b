use crate::error::BlogError;
use crate::helper::authorization::{authorize_mutation, MutationDecision};
use crate::helper::form_helpers::{self, FieldErrors, GuardedForm, PostForm};
use crate::helper::render;
use crate::helper::urls;
use crate::middleware::AuthenticatedUser;
use crate::models::db_operations::{posts_db_operations, taxonomy_db_operations};
use crate::models::Post;
use crate::DbPool;
use actix_csrf::extractor::CsrfToken;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use rusqlite::Connection;
use tera::Tera;

pub fn config_posts(cfg: &mut web::ServiceConfig) {
    cfg.route("/posts/create/", web::get().to(show_create_form))
        .route("/posts/create/", web::post().to(create_post_action))
        .route("/posts/{post_id:\\d+}/edit/", web::get().to(show_edit_form))
        .route("/posts/{post_id:\\d+}/edit/", web::post().to(edit_post_action))
        .route("/posts/{post_id:\\d+}/delete/", web::get().to(show_delete_confirmation))
        .route("/posts/{post_id:\\d+}/delete/", web::post().to(delete_post_action));
}

fn render_post_form(
    tera: &Tera,
    conn: &Connection,
    user: &AuthenticatedUser,
    csrf_token: &str,
    form: &PostForm,
    errors: &FieldErrors,
    editing: Option<i64>,
) -> Result<HttpResponse, BlogError> {
    let mut ctx = render::base_context(Some(user), csrf_token);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx.insert("categories", &taxonomy_db_operations::read_all_categories(conn)?);
    ctx.insert("locations", &taxonomy_db_operations::read_all_locations(conn)?);
    ctx.insert("editing_post_id", &editing);
    render::render(tera, "blog/create.html", &ctx)
}

/// Fetch-or-404, then the author check. `Err(response)` carries the redirect.
fn load_own_post(
    conn: &Connection,
    user: &AuthenticatedUser,
    post_id: i64,
) -> Result<Result<Post, HttpResponse>, BlogError> {
    let post = posts_db_operations::read_post(conn, post_id)?.ok_or(BlogError::NotFound)?;
    match authorize_mutation(user, post.author_id, urls::post_detail_url(post.id)) {
        MutationDecision::Proceed => Ok(Ok(post)),
        MutationDecision::Redirect(location) => Ok(Err(render::redirect(&location))),
    }
}

async fn show_create_form(
    user: AuthenticatedUser,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    let conn = pool.get()?;
    let form = PostForm::blank(Utc::now());
    render_post_form(&tera, &conn, &user, token.get(), &form, &FieldErrors::new(), None)
}

async fn create_post_action(
    user: AuthenticatedUser,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    form: GuardedForm,
) -> Result<HttpResponse, BlogError> {
    let submitted = form_helpers::accepted(form);
    let conn = pool.get()?;
    let form = PostForm::from_fields(&submitted.fields);
    let categories = taxonomy_db_operations::read_all_categories(&conn)?;
    let locations = taxonomy_db_operations::read_all_locations(&conn)?;

    match form.clean(&categories, &locations, Utc::now()) {
        Ok(draft) => {
            let post_id = posts_db_operations::create_post(&conn, user.id, &draft)?;
            log::info!("User '{}' created post {}", user.username, post_id);
            Ok(render::redirect(&urls::profile_url(&user.username)))
        }
        Err(errors) => render_post_form(&tera, &conn, &user, submitted.token(), &form, &errors, None),
    }
}

async fn show_edit_form(
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    let conn = pool.get()?;
    let post = match load_own_post(&conn, &user, *post_id)? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };
    let form = PostForm::from_post(&post);
    render_post_form(&tera, &conn, &user, token.get(), &form, &FieldErrors::new(), Some(post.id))
}

async fn edit_post_action(
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    form: GuardedForm,
) -> Result<HttpResponse, BlogError> {
    let submitted = form_helpers::accepted(form);
    let conn = pool.get()?;
    let post = match load_own_post(&conn, &user, *post_id)? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    let form = PostForm::from_fields(&submitted.fields);
    let categories = taxonomy_db_operations::read_all_categories(&conn)?;
    let locations = taxonomy_db_operations::read_all_locations(&conn)?;

    match form.clean(&categories, &locations, Utc::now()) {
        Ok(draft) => {
            posts_db_operations::update_post(&conn, post.id, &draft)?;
            Ok(render::redirect(&urls::post_detail_url(post.id)))
        }
        Err(errors) => render_post_form(&tera, &conn, &user, submitted.token(), &form, &errors, Some(post.id)),
    }
}

async fn show_delete_confirmation(
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    let conn = pool.get()?;
    let post = match load_own_post(&conn, &user, *post_id)? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };
    let entry = posts_db_operations::read_post_entry(&conn, post.id)?.ok_or(BlogError::NotFound)?;

    let mut ctx = render::base_context(Some(&user), token.get());
    ctx.insert("post", &entry);
    render::render(&tera, "blog/post_delete.html", &ctx)
}

async fn delete_post_action(
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
    pool: web::Data<DbPool>,
    _form: GuardedForm,
) -> Result<HttpResponse, BlogError> {
    let conn = pool.get()?;
    let post = match load_own_post(&conn, &user, *post_id)? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };
    posts_db_operations::delete_post(&conn, post.id)?;
    log::info!("User '{}' deleted post {}", user.username, post.id);
    Ok(render::redirect(&urls::profile_url(&user.username)))
}
