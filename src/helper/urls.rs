use url::form_urlencoded;

pub fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn profile_url(username: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(username.as_bytes()).collect();
    format!("/profile/{}/", encoded)
}

pub fn login_url(next: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/auth/login/?next={}", encoded)
}

/// Accepts only same-site absolute paths as a post-login target.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}
