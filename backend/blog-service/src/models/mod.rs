/// Data models for blog-service
///
/// Row types map one-to-one onto tables; `*Detail` types are the joined read
/// models handed to templates and the admin API.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of characters of a post's text used as its display name.
pub const POST_DISPLAY_CHARS: usize = 15;

/// Mirror of an account owned by the external auth subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// Account as asserted by the auth subsystem; `id` is its user id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// A named community posts can belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub group_id: Option<i64>,
    /// Path relative to the media root
    pub image: Option<String>,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.text.chars().take(POST_DISPLAY_CHARS).collect();
        f.write_str(&head)
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Fields an author may change; authorship is fixed at creation.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: ImageChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    Keep,
    Clear,
    Replace(String),
}

/// Post joined with its author, group and comment count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostDetail {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub image: Option<String>,
    pub comment_count: i64,
}

impl fmt::Display for PostDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.text.chars().take(POST_DISPLAY_CHARS).collect();
        f.write_str(&head)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentDetail {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
    /// Text of the commented post
    pub post_text: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl CommentDetail {
    /// Display name of the commented post.
    pub fn post_title(&self) -> String {
        self.post_text.chars().take(POST_DISPLAY_CHARS).collect()
    }
}

/// Directed edge: `user_id` follows `author_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FollowDetail {
    pub id: i64,
    pub user_id: i64,
    pub user_username: String,
    pub author_id: i64,
    pub author_username: String,
    pub created: DateTime<Utc>,
}

/// Which slice of the post table a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(i64),
    /// Posts by authors the given user follows
    FollowedBy(i64),
    /// Case-insensitive substring match on the text
    TextContains(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(text: &str) -> Post {
        Post {
            id: 1,
            text: text.to_string(),
            pub_date: Utc::now(),
            author_id: 1,
            group_id: None,
            image: None,
        }
    }

    #[test]
    fn test_post_display_is_first_fifteen_chars() {
        assert_eq!(post("Short").to_string(), "Short");
        assert_eq!(
            post("This text is definitely longer").to_string(),
            "This text is de"
        );
        // counts characters, not bytes
        assert_eq!(post("Тестовый текст номер 1").to_string(), "Тестовый текст ");
    }

    #[test]
    fn test_comment_names_its_post_like_post_display() {
        let comment = CommentDetail {
            id: 5,
            post_id: 1,
            author_id: 2,
            author_username: "reader".into(),
            post_text: "This text is definitely longer".into(),
            text: "First!".into(),
            created: Utc::now(),
        };
        assert_eq!(comment.post_title(), post(&comment.post_text).to_string());
    }

    #[test]
    fn test_group_display_is_title() {
        let group = Group {
            id: 1,
            title: "The book".into(),
            slug: "book".into(),
            description: String::new(),
        };
        assert_eq!(group.to_string(), "The book");
    }

    #[test]
    fn test_user_display_name() {
        let mut user = User {
            id: 1,
            username: "leo".into(),
            first_name: String::new(),
            last_name: String::new(),
            date_joined: Utc::now(),
        };
        assert_eq!(user.display_name(), "leo");
        user.first_name = "Leo".into();
        user.last_name = "Tolstoy".into();
        assert_eq!(user.display_name(), "Leo Tolstoy");
        assert_eq!(user.to_string(), "leo");
    }
}
