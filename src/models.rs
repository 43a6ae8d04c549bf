use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Display name used when a post or comment author no longer exists.
pub const DELETED_AUTHOR_NAME: &str = "[deleted]";

/// Topic a post is filed under.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, sqlx::Type)]
#[sqlx(type_name = "post_category")]
pub enum Category {
    Tech,
    Lifestyle,
    Education,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tech => "Tech",
            Category::Lifestyle => "Lifestyle",
            Category::Education => "Education",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Tech" => Ok(Category::Tech),
            "Lifestyle" => Ok(Category::Lifestyle),
            "Education" => Ok(Category::Education),
            "Other" => Ok(Category::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// A registered account. Never serialized directly since it carries the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// Author reference embedded in posts and comments.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
}

impl AuthorSummary {
    pub fn deleted(id: Uuid) -> Self {
        Self {
            id,
            name: DELETED_AUTHOR_NAME.to_string(),
        }
    }
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

/// Represents a blog post.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A single comment as stored: flat, pointing at its parent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_edited: bool,
}

/// A comment together with its resolved author and nested replies.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: AuthorSummary,
    pub replies: Vec<CommentNode>,
}

/// A post with its resolved author, as returned by listings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorSummary,
}

/// A post with its author and full comment tree.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorSummary,
    pub comments: Vec<CommentNode>,
}

/// One page of a post listing.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<PostView>,
    pub total_pages: u64,
}

/// Returned by sign-up and sign-in.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}
