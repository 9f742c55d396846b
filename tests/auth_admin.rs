#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use blogicum::models::db_operations::{posts_db_operations, taxonomy_db_operations, users_db_operations};
use chrono::{Duration, Utc};
use common::{location, TestBlog};

#[actix_web::test]
async fn registration_then_login() {
    let blog = TestBlog::new();
    let app = test_app!(blog);

    let form = test::call_service(&app, TestRequest::get().uri("/auth/registration/").to_request()).await;
    assert_eq!(form.status(), StatusCode::OK);

    let anonymous = visitor!(app);
    let req = anonymous
        .post(
            "/auth/registration/",
            &[
                ("username", "carol"),
                ("email", "carol@example.com"),
                ("password1", common::PASSWORD),
                ("password2", common::PASSWORD),
            ],
        )
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/");

    let carol = users_db_operations::read_user_by_username(&blog.conn(), "carol").unwrap().unwrap();
    assert!(!carol.is_staff);

    let carol = login!(app, "carol");
    let resp = test::call_service(&app, carol.get("/posts/create/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn duplicate_username_is_a_form_error() {
    let blog = TestBlog::new();
    blog.user("alice");
    let app = test_app!(blog);

    let anonymous = visitor!(app);
    let req = anonymous
        .post(
            "/auth/registration/",
            &[("username", "alice"), ("email", ""), ("password1", common::PASSWORD), ("password2", common::PASSWORD)],
        )
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("already exists"));
}

#[actix_web::test]
async fn login_honours_a_safe_next_only() {
    let blog = TestBlog::new();
    blog.user("alice");
    let app = test_app!(blog);

    let anonymous = visitor!(app);
    let req = anonymous
        .post("/auth/login/", &[("username", "alice"), ("password", common::PASSWORD), ("next", "/posts/create/")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/posts/create/");

    let req = anonymous
        .post("/auth/login/", &[("username", "alice"), ("password", common::PASSWORD), ("next", "https://evil.example/")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn wrong_password_rerenders_the_login_form() {
    let blog = TestBlog::new();
    blog.user("alice");
    let app = test_app!(blog);

    let anonymous = visitor!(app);
    let req = anonymous
        .post("/auth/login/", &[("username", "alice"), ("password", "wrong")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("Please enter a correct username and password"));
}

#[actix_web::test]
async fn profile_edit_renames_the_user() {
    let blog = TestBlog::new();
    let alice = blog.user("alice");
    blog.user("bob");
    let app = test_app!(blog);
    let visitor = login!(app, "alice");

    let req = visitor
        .post("/profile/edit/", &[("username", "bob"), ("first_name", "Alice"), ("last_name", ""), ("email", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = visitor
        .post(
            "/profile/edit/",
            &[("username", "alice2"), ("first_name", "Alice"), ("last_name", "Liddell"), ("email", "a@example.com")],
        )
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/alice2/");

    // The navigation bar picks up the new name on the next page.
    let resp = test::call_service(&app, visitor.get("/").to_request()).await;
    let body = test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("/profile/alice2/"));

    let user = users_db_operations::read_user_by_id(&blog.conn(), alice).unwrap().unwrap();
    assert_eq!(user.username, "alice2");
    assert_eq!(user.full_name(), "Alice Liddell");
}

#[actix_web::test]
async fn admin_is_invisible_to_non_staff() {
    let blog = TestBlog::new();
    blog.user("alice");
    let app = test_app!(blog);

    let resp = test::call_service(&app, TestRequest::get().uri("/admin/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let visitor = login!(app, "alice");
    let resp = test::call_service(&app, visitor.get("/admin/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = visitor
        .post("/admin/categories", &[("title", "Spam"), ("slug", "spam"), ("is_published", "on")])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    assert!(taxonomy_db_operations::read_all_categories(&blog.conn()).unwrap().is_empty());
}

#[actix_web::test]
async fn staff_manage_categories_and_publication() {
    let blog = TestBlog::new();
    blog.staff("root");
    let alice = blog.user("alice");
    let post_id = blog.post_with(alice, "Moderated", Utc::now() - Duration::hours(1), true, None);
    let app = test_app!(blog);
    let mut visitor = login!(app, "root");

    let req = visitor
        .post(
            "/admin/categories",
            &[("title", "Travel"), ("description", "Trips"), ("slug", "travel"), ("is_published", "on")],
        )
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/admin/");
    let categories = taxonomy_db_operations::read_all_categories(&blog.conn()).unwrap();
    assert_eq!(categories.len(), 1);
    assert!(categories[0].is_published);

    // Unticking the checkbox hides the category.
    let req = visitor
        .post(&format!("/admin/categories/{}", categories[0].id), &[("title", "Travel"), ("slug", "travel")])
        .to_request();
    test::call_service(&app, req).await;
    let categories = taxonomy_db_operations::read_all_categories(&blog.conn()).unwrap();
    assert!(!categories[0].is_published);

    let req = visitor.post(&format!("/admin/posts/{}", post_id), &[]).to_request();
    let resp = test::call_service(&app, req).await;
    assert!(!posts_db_operations::read_post(&blog.conn(), post_id).unwrap().unwrap().is_published);
    // The notification travels in the refreshed session cookie.
    visitor.keep_session(&resp);

    let resp = test::call_service(&app, visitor.get("/admin/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let html = std::str::from_utf8(&body).unwrap();
    assert!(html.contains("Moderated"));
    assert!(html.contains("Not set"));
    assert!(html.contains("Post hidden."));
}

#[actix_web::test]
async fn revoked_staff_loses_the_admin_at_once() {
    let blog = TestBlog::new();
    let root = blog.staff("root");
    let app = test_app!(blog);
    let visitor = login!(app, "root");

    let resp = test::call_service(&app, visitor.get("/admin/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    blog.conn().execute("UPDATE users SET is_staff = 0 WHERE id = ?1", [root]).unwrap();
    let resp = test::call_service(&app, visitor.get("/admin/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn logout_needs_the_csrf_token() {
    let blog = TestBlog::new();
    blog.user("alice");
    let app = test_app!(blog);
    let visitor = login!(app, "alice");

    let resp = test::call_service(&app, visitor.post_without_token("/auth/logout/", &[]).to_request()).await;
    assert!(resp.status().is_client_error(), "unexpected status {}", resp.status());
    let resp = test::call_service(&app, visitor.get("/profile/edit/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, visitor.post("/auth/logout/", &[]).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
}
