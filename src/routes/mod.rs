use actix_web::{guard, web};

use crate::middleware::{ip_guard, staff_guard};

pub mod admin;
pub mod auth;
pub mod comments;
pub mod posts;
pub mod profile;
pub mod public;

const MAX_FORM_BYTES: usize = 1024 * 1024;

/// Every GET route that renders a page, written exactly as registered below.
/// Each of them carries the logout form for signed-in visitors, so each one
/// needs a CSRF token.
pub const PAGE_PATTERNS: &[&str] = &[
    "/",
    "/category/{category_slug}/",
    "/profile/{username}/",
    "/posts/{post_id:\\d+}/",
    "/posts/create/",
    "/posts/{post_id:\\d+}/edit/",
    "/posts/{post_id:\\d+}/delete/",
    "/posts/{post_id:\\d+}/comment/{comment_id:\\d+}/edit",
    "/posts/{post_id:\\d+}/comment/{comment_id:\\d+}/delete",
    "/profile/edit/",
    "/auth/login/",
    "/auth/registration/",
    "/admin/",
];

/// Registers every blog route. Literal paths such as `/posts/create/` and
/// `/profile/edit/` are registered ahead of the parameterised ones.
pub fn config_routes(cfg: &mut web::ServiceConfig, admin_allowed_ips: String) {
    // Post bodies can be long; the default form limit is 16 KiB.
    cfg.app_data(web::FormConfig::default().limit(MAX_FORM_BYTES))
        .configure(auth::config_auth)
        .configure(posts::config_posts)
        .configure(comments::config_comments)
        .configure(profile::config_profile)
        .configure(public::config_public)
        .service(
            web::scope("/admin")
                .guard(guard::fn_guard(move |ctx| ip_guard(ctx, &admin_allowed_ips)))
                .guard(guard::fn_guard(staff_guard))
                .configure(admin::config_admin),
        );
}
