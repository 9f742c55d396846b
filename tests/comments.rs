#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use blogicum::models::db_operations::comments_db_operations;
use chrono::{Duration, Utc};
use common::{location, TestBlog};

#[actix_web::test]
async fn comment_is_saved_with_author_and_post() {
    let blog = TestBlog::new();
    let alice = blog.user("alice");
    let bob = blog.user("bob");
    let post_id = blog.post(alice, "Open thread", 1);
    let app = test_app!(blog);
    let visitor = login!(app, "bob");

    let req = visitor.post(&format!("/posts/{}/comment/", post_id), &[("text", "Nice one!")]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post_id));

    let comments = comments_db_operations::read_comments_for_post(&blog.conn(), post_id).unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author_id, bob);
    assert_eq!(comments[0].text, "Nice one!");

    let body = test::call_and_read_body(&app, TestRequest::get().uri(&format!("/posts/{}/", post_id)).to_request()).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("Nice one!"));
}

#[actix_web::test]
async fn anonymous_comment_goes_to_login() {
    let blog = TestBlog::new();
    let alice = blog.user("alice");
    let post_id = blog.post(alice, "Open thread", 1);
    let app = test_app!(blog);

    let anonymous = visitor!(app);
    let req = anonymous.post(&format!("/posts/{}/comment/", post_id), &[("text", "drive-by")]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/?next="));
    assert!(comments_db_operations::read_comments_for_post(&blog.conn(), post_id).unwrap().is_empty());
}

#[actix_web::test]
async fn empty_comment_rerenders_the_post() {
    let blog = TestBlog::new();
    let alice = blog.user("alice");
    blog.user("bob");
    let post_id = blog.post(alice, "Open thread", 1);
    let app = test_app!(blog);
    let visitor = login!(app, "bob");

    let req = visitor.post(&format!("/posts/{}/comment/", post_id), &[("text", "   ")]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let html = std::str::from_utf8(&body).unwrap();
    assert!(html.contains("Open thread"));
    assert!(html.contains("This field is required."));
    assert!(comments_db_operations::read_comments_for_post(&blog.conn(), post_id).unwrap().is_empty());
}

#[actix_web::test]
async fn commenting_on_an_invisible_post_is_not_found() {
    let blog = TestBlog::new();
    let alice = blog.user("alice");
    blog.user("bob");
    let draft = blog.post_with(alice, "Draft", Utc::now() - Duration::hours(1), false, None);
    let app = test_app!(blog);
    let visitor = login!(app, "bob");

    let req = visitor.post(&format!("/posts/{}/comment/", draft), &[("text", "peek")]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(comments_db_operations::read_comments_for_post(&blog.conn(), draft).unwrap().is_empty());
}

#[actix_web::test]
async fn comment_edits_are_limited_to_the_author_and_the_right_post() {
    let blog = TestBlog::new();
    let alice = blog.user("alice");
    let bob = blog.user("bob");
    let post_id = blog.post(alice, "Open thread", 1);
    let other_post = blog.post(alice, "Another thread", 2);
    let comment_id = comments_db_operations::create_comment(&blog.conn(), post_id, bob, "Original").unwrap();
    let app = test_app!(blog);

    let alice = login!(app, "alice");
    let req = alice
        .post(&format!("/posts/{}/comment/{}/edit", post_id, comment_id), &[("text", "Tampered")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post_id));

    let req = alice.post(&format!("/posts/{}/comment/{}/delete", post_id, comment_id), &[]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let comment = comments_db_operations::read_comment(&blog.conn(), comment_id).unwrap().unwrap();
    assert_eq!(comment.text, "Original");

    let bob = login!(app, "bob");
    let wrong_post = bob.get(&format!("/posts/{}/comment/{}/edit", other_post, comment_id)).to_request();
    assert_eq!(test::call_service(&app, wrong_post).await.status(), StatusCode::NOT_FOUND);

    let req = bob
        .post(&format!("/posts/{}/comment/{}/edit", post_id, comment_id), &[("text", "Edited")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let comment = comments_db_operations::read_comment(&blog.conn(), comment_id).unwrap().unwrap();
    assert_eq!(comment.text, "Edited");

    let confirm = bob.get(&format!("/posts/{}/comment/{}/delete", post_id, comment_id)).to_request();
    assert_eq!(test::call_service(&app, confirm).await.status(), StatusCode::OK);

    let req = bob.post(&format!("/posts/{}/comment/{}/delete", post_id, comment_id), &[]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(comments_db_operations::read_comment(&blog.conn(), comment_id).unwrap().is_none());
}
