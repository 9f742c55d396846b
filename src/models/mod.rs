use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// A post row as stored, without any joined data.
#[derive(Debug, Serialize, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CategoryLabel {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub is_published: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct LocationLabel {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
}

/// A post joined with everything a feed or detail page renders.
#[derive(Debug, Serialize, Clone)]
pub struct PostEntry {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub author_username: String,
    pub category: Option<CategoryLabel>,
    pub location: Option<LocationLabel>,
    pub comment_count: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub post_id: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct CommentEntry {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub author_username: String,
    pub post_id: i64,
}

// --- Validated inputs handed to the db layer ---

pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileChanges {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDraft {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationDraft {
    pub name: String,
    pub is_published: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub message: String,
    pub r#type: String, // 'success' or 'error'
}

pub mod db_operations;
