use crate::error::BlogError;
use crate::helper::authorization::{authorize_mutation, MutationDecision};
use crate::helper::form_helpers::{self, CommentForm, FieldErrors, GuardedForm};
use crate::helper::public_helpers;
use crate::helper::render;
use crate::helper::urls;
use crate::middleware::AuthenticatedUser;
use crate::models::db_operations::comments_db_operations;
use crate::models::Comment;
use crate::DbPool;
use actix_csrf::extractor::CsrfToken;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use rusqlite::Connection;
use tera::Tera;

pub fn config_comments(cfg: &mut web::ServiceConfig) {
    cfg.route("/posts/{post_id:\\d+}/comment/", web::post().to(add_comment))
        .route("/posts/{post_id:\\d+}/comment/{comment_id:\\d+}/edit", web::get().to(show_edit_comment))
        .route("/posts/{post_id:\\d+}/comment/{comment_id:\\d+}/edit", web::post().to(edit_comment_action))
        .route("/posts/{post_id:\\d+}/comment/{comment_id:\\d+}/delete", web::get().to(show_delete_comment))
        .route("/posts/{post_id:\\d+}/comment/{comment_id:\\d+}/delete", web::post().to(delete_comment_action));
}

/// A comment is only addressable through the post it belongs to.
fn load_own_comment(
    conn: &Connection,
    user: &AuthenticatedUser,
    post_id: i64,
    comment_id: i64,
) -> Result<Result<Comment, HttpResponse>, BlogError> {
    let comment = comments_db_operations::read_comment(conn, comment_id)?
        .filter(|c| c.post_id == post_id)
        .ok_or(BlogError::NotFound)?;
    match authorize_mutation(user, comment.author_id, urls::post_detail_url(post_id)) {
        MutationDecision::Proceed => Ok(Ok(comment)),
        MutationDecision::Redirect(location) => Ok(Err(render::redirect(&location))),
    }
}

fn render_comment_page(
    tera: &Tera,
    user: &AuthenticatedUser,
    csrf_token: &str,
    comment: &Comment,
    form: Option<&CommentForm>,
    errors: &FieldErrors,
) -> Result<HttpResponse, BlogError> {
    let mut ctx = render::base_context(Some(user), csrf_token);
    ctx.insert("comment", comment);
    // No form means the page asks for delete confirmation.
    ctx.insert("form", &form);
    ctx.insert("errors", errors);
    render::render(tera, "blog/comment.html", &ctx)
}

async fn add_comment(
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    form: GuardedForm,
) -> Result<HttpResponse, BlogError> {
    let submitted = form_helpers::accepted(form);
    let conn = pool.get()?;
    let post = public_helpers::load_visible_post(&conn, *post_id, Some(user.id), Utc::now())?;

    let form = CommentForm::from_fields(&submitted.fields);
    match form.clean() {
        Ok(text) => {
            let comment_id = comments_db_operations::create_comment(&conn, post.id, user.id, &text)?;
            log::info!("User '{}' commented on post {} (comment {})", user.username, post.id, comment_id);
            Ok(render::redirect(&urls::post_detail_url(post.id)))
        }
        Err(errors) => {
            let comments = comments_db_operations::read_comments_for_post(&conn, post.id)?;
            let mut ctx = render::base_context(Some(&user), submitted.token());
            ctx.insert("post", &post);
            ctx.insert("comments", &comments);
            ctx.insert("form", &form);
            ctx.insert("errors", &errors);
            render::render(&tera, "blog/detail.html", &ctx)
        }
    }
}

async fn show_edit_comment(
    user: AuthenticatedUser,
    path: web::Path<(i64, i64)>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    let (post_id, comment_id) = path.into_inner();
    let conn = pool.get()?;
    let comment = match load_own_comment(&conn, &user, post_id, comment_id)? {
        Ok(comment) => comment,
        Err(redirect) => return Ok(redirect),
    };
    let form = CommentForm { text: comment.text.clone() };
    render_comment_page(&tera, &user, token.get(), &comment, Some(&form), &FieldErrors::new())
}

async fn edit_comment_action(
    user: AuthenticatedUser,
    path: web::Path<(i64, i64)>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    form: GuardedForm,
) -> Result<HttpResponse, BlogError> {
    let submitted = form_helpers::accepted(form);
    let (post_id, comment_id) = path.into_inner();
    let conn = pool.get()?;
    let comment = match load_own_comment(&conn, &user, post_id, comment_id)? {
        Ok(comment) => comment,
        Err(redirect) => return Ok(redirect),
    };

    let form = CommentForm::from_fields(&submitted.fields);
    match form.clean() {
        Ok(text) => {
            comments_db_operations::update_comment(&conn, comment.id, &text)?;
            Ok(render::redirect(&urls::post_detail_url(post_id)))
        }
        Err(errors) => render_comment_page(&tera, &user, submitted.token(), &comment, Some(&form), &errors),
    }
}

async fn show_delete_comment(
    user: AuthenticatedUser,
    path: web::Path<(i64, i64)>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    let (post_id, comment_id) = path.into_inner();
    let conn = pool.get()?;
    let comment = match load_own_comment(&conn, &user, post_id, comment_id)? {
        Ok(comment) => comment,
        Err(redirect) => return Ok(redirect),
    };
    render_comment_page(&tera, &user, token.get(), &comment, None, &FieldErrors::new())
}

async fn delete_comment_action(
    user: AuthenticatedUser,
    path: web::Path<(i64, i64)>,
    pool: web::Data<DbPool>,
    _form: GuardedForm,
) -> Result<HttpResponse, BlogError> {
    let (post_id, comment_id) = path.into_inner();
    let conn = pool.get()?;
    let comment = match load_own_comment(&conn, &user, post_id, comment_id)? {
        Ok(comment) => comment,
        Err(redirect) => return Ok(redirect),
    };
    comments_db_operations::delete_comment(&conn, comment.id)?;
    log::info!("User '{}' deleted comment {} on post {}", user.username, comment.id, post_id);
    Ok(render::redirect(&urls::post_detail_url(post_id)))
}
