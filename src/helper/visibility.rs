//! Which posts a viewer may see.
//!
//! A post is publicly visible when it is published, its `pub_date` is not in
//! the future and its category (if any) is published. Authors always see their
//! own posts. Comments carry no flag of their own and follow their post.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::models::db_operations::db_timestamp;
use crate::models::PostEntry;

pub fn is_publicly_visible(post: &PostEntry, now: DateTime<Utc>) -> bool {
    post.is_published
        && post.pub_date <= now
        && post.category.as_ref().map_or(true, |category| category.is_published)
}

pub fn can_view(post: &PostEntry, viewer_id: Option<i64>, now: DateTime<Utc>) -> bool {
    viewer_id == Some(post.author_id) || is_publicly_visible(post, now)
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedScope {
    Home,
    /// Posts filed under the category with this slug.
    Category(String),
    /// `unrestricted` is set only when the author views their own profile.
    Author { author_id: i64, unrestricted: bool },
}

/// A feed query, rendered to SQL conditions over `posts p LEFT JOIN categories c`.
#[derive(Debug, Clone)]
pub struct FeedFilter {
    pub scope: FeedScope,
    pub now: DateTime<Utc>,
}

impl FeedFilter {
    pub fn home(now: DateTime<Utc>) -> Self {
        FeedFilter { scope: FeedScope::Home, now }
    }

    pub fn category(slug: &str, now: DateTime<Utc>) -> Self {
        FeedFilter { scope: FeedScope::Category(slug.to_string()), now }
    }

    pub fn author(author_id: i64, viewer_id: Option<i64>, now: DateTime<Utc>) -> Self {
        FeedFilter {
            scope: FeedScope::Author {
                author_id,
                unrestricted: viewer_id == Some(author_id),
            },
            now,
        }
    }

    fn is_restricted(&self) -> bool {
        !matches!(self.scope, FeedScope::Author { unrestricted: true, .. })
    }

    /// Returns the WHERE clause (without the keyword) and its positional parameters.
    pub fn sql_conditions(&self) -> (String, Vec<Value>) {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        match &self.scope {
            FeedScope::Home => {}
            FeedScope::Category(slug) => {
                conditions.push("c.slug = ?");
                values.push(Value::Text(slug.clone()));
            }
            FeedScope::Author { author_id, .. } => {
                conditions.push("p.author_id = ?");
                values.push(Value::Integer(*author_id));
            }
        }

        if self.is_restricted() {
            conditions.push("p.is_published = 1");
            conditions.push("p.pub_date <= ?");
            values.push(Value::Text(db_timestamp(&self.now)));
            conditions.push("(p.category_id IS NULL OR c.is_published = 1)");
        }

        if conditions.is_empty() {
            ("1 = 1".to_string(), values)
        } else {
            (conditions.join(" AND "), values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryLabel;
    use chrono::Duration;

    fn entry(author_id: i64) -> PostEntry {
        let now = Utc::now();
        PostEntry {
            id: 1,
            title: "Title".to_string(),
            text: "Body".to_string(),
            pub_date: now - Duration::hours(1),
            is_published: true,
            created_at: now,
            author_id,
            author_username: "bob".to_string(),
            category: Some(CategoryLabel {
                id: 1,
                title: "Travel".to_string(),
                slug: "travel".to_string(),
                is_published: true,
            }),
            location: None,
            comment_count: 0,
        }
    }

    #[test]
    fn published_past_post_is_visible_to_everyone() {
        let post = entry(2);
        assert!(can_view(&post, None, Utc::now()));
        assert!(can_view(&post, Some(7), Utc::now()));
    }

    #[test]
    fn each_flag_hides_the_post_from_outsiders_but_not_the_author() {
        let now = Utc::now();

        let mut draft = entry(2);
        draft.is_published = false;

        let mut future = entry(2);
        future.pub_date = now + Duration::days(1);

        let mut hidden_category = entry(2);
        if let Some(category) = hidden_category.category.as_mut() {
            category.is_published = false;
        }

        for post in [&draft, &future, &hidden_category] {
            assert!(!is_publicly_visible(post, now));
            assert!(!can_view(post, None, now));
            assert!(!can_view(post, Some(3), now));
            assert!(can_view(post, Some(2), now));
        }
    }

    #[test]
    fn post_without_category_is_not_hidden_by_it() {
        let mut post = entry(2);
        post.category = None;
        assert!(is_publicly_visible(&post, Utc::now()));
    }

    #[test]
    fn pub_date_equal_to_now_counts_as_published() {
        let post = entry(2);
        assert!(is_publicly_visible(&post, post.pub_date));
    }

    #[test]
    fn owner_profile_feed_drops_publication_conditions() {
        let now = Utc::now();
        let (own, own_values) = FeedFilter::author(5, Some(5), now).sql_conditions();
        assert_eq!(own, "p.author_id = ?");
        assert_eq!(own_values, vec![Value::Integer(5)]);

        let (other, other_values) = FeedFilter::author(5, Some(6), now).sql_conditions();
        assert!(other.contains("p.is_published = 1"));
        assert!(other.contains("c.is_published = 1"));
        assert_eq!(other_values.len(), 2);

        let (anon, _) = FeedFilter::author(5, None, now).sql_conditions();
        assert_eq!(anon, other);
    }

    #[test]
    fn category_feed_filters_by_slug_and_stays_restricted() {
        let now = Utc::now();
        let (category, values) = FeedFilter::category("travel", now).sql_conditions();
        assert!(category.starts_with("c.slug = ?"));
        assert!(category.contains("p.pub_date <= ?"));
        assert_eq!(values[0], Value::Text("travel".to_string()));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn home_feed_is_always_restricted() {
        let (home, values) = FeedFilter::home(Utc::now()).sql_conditions();
        assert!(home.starts_with("p.is_published = 1"));
        assert_eq!(values.len(), 1);
    }
}
