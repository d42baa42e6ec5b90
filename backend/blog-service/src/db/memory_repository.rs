use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::BlogRepository;
use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentDetail, Follow, FollowDetail, Group, ImageChange, NewComment, NewGroup,
    NewPost, NewUser, Post, PostChanges, PostDetail, PostScope, User,
};

#[derive(Default)]
struct Tables {
    users: HashMap<i64, User>,
    groups: HashMap<i64, Group>,
    posts: HashMap<i64, Post>,
    comments: HashMap<i64, Comment>,
    follows: HashMap<i64, Follow>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn matches(&self, post: &Post, scope: &PostScope) -> bool {
        match scope {
            PostScope::All => true,
            PostScope::Group(group_id) => post.group_id == Some(*group_id),
            PostScope::Author(author_id) => post.author_id == *author_id,
            PostScope::FollowedBy(user_id) => self
                .follows
                .values()
                .any(|f| f.user_id == *user_id && f.author_id == post.author_id),
            PostScope::TextContains(query) => contains_ci(&post.text, query),
        }
    }

    fn detail(&self, post: &Post) -> Option<PostDetail> {
        let author = self.users.get(&post.author_id)?;
        let group = post.group_id.and_then(|id| self.groups.get(&id));
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.post_id == post.id)
            .count() as i64;

        Some(PostDetail {
            id: post.id,
            text: post.text.clone(),
            pub_date: post.pub_date,
            author_id: post.author_id,
            author_username: author.username.clone(),
            author_first_name: author.first_name.clone(),
            author_last_name: author.last_name.clone(),
            group_id: group.map(|g| g.id),
            group_title: group.map(|g| g.title.clone()),
            group_slug: group.map(|g| g.slug.clone()),
            image: post.image.clone(),
            comment_count,
        })
    }

    fn comment_detail(&self, comment: &Comment) -> Option<CommentDetail> {
        let author = self.users.get(&comment.author_id)?;
        let post = self.posts.get(&comment.post_id)?;
        Some(CommentDetail {
            id: comment.id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            author_username: author.username.clone(),
            post_text: post.text.clone(),
            text: comment.text.clone(),
            created: comment.created,
        })
    }

    fn scoped_posts(&self, scope: &PostScope) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .values()
            .filter(|p| self.matches(p, scope))
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        posts
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn blank_to_none(query: Option<&str>) -> Option<&str> {
    query.map(str::trim).filter(|q| !q.is_empty())
}

fn window<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// In-process repository used by tests and `BLOG_STORAGE=memory`.
///
/// Mirrors the ordering and constraint behaviour of the PostgreSQL schema:
/// unique usernames and group slugs, unique follow pairs, no self-follows,
/// and cascading deletes are not needed because nothing is ever deleted
/// except follows.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlogRepository for MemoryRepository {
    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn ensure_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(AppError::Conflict(format!(
                "username '{}' already exists",
                user.username
            )));
        }

        let date_joined = tables
            .users
            .get(&user.id)
            .map(|u| u.date_joined)
            .unwrap_or_else(Utc::now);
        let mirrored = User {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            date_joined,
        };
        tables.users.insert(mirrored.id, mirrored.clone());
        Ok(mirrored)
    }

    async fn find_group_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        Ok(self.tables.read().await.groups.get(&group_id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self, query: Option<&str>) -> Result<Vec<Group>> {
        let query = blank_to_none(query);
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables
            .groups
            .values()
            .filter(|g| query.map_or(true, |q| contains_ci(&g.title, q)))
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut tables = self.tables.write().await;
        if tables.groups.values().any(|g| g.slug == group.slug) {
            return Err(AppError::Conflict(format!(
                "group slug '{}' already exists",
                group.slug
            )));
        }

        let id = tables.next_id();
        let created = Group {
            id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.insert(id, created.clone());
        Ok(created)
    }

    async fn count_posts(&self, scope: &PostScope) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.scoped_posts(scope).len() as i64)
    }

    async fn list_posts(
        &self,
        scope: &PostScope,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostDetail>> {
        let tables = self.tables.read().await;
        let details = tables
            .scoped_posts(scope)
            .into_iter()
            .filter_map(|p| tables.detail(p))
            .collect();
        Ok(window(details, limit, offset))
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&post_id).cloned())
    }

    async fn find_post_detail(&self, post_id: i64) -> Result<Option<PostDetail>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&post_id).and_then(|p| tables.detail(p)))
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.author_id) {
            return Err(AppError::BadRequest("unknown author".into()));
        }
        if let Some(group_id) = post.group_id {
            if !tables.groups.contains_key(&group_id) {
                return Err(AppError::BadRequest("unknown group".into()));
            }
        }

        let id = tables.next_id();
        let created = Post {
            id,
            text: post.text,
            pub_date: Utc::now(),
            author_id: post.author_id,
            group_id: post.group_id,
            image: post.image,
        };
        tables.posts.insert(id, created.clone());
        Ok(created)
    }

    async fn update_post(
        &self,
        post_id: i64,
        author_id: i64,
        changes: PostChanges,
    ) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables
            .posts
            .get_mut(&post_id)
            .filter(|p| p.author_id == author_id)
        else {
            return Ok(None);
        };

        post.text = changes.text;
        post.group_id = changes.group_id;
        match changes.image {
            ImageChange::Keep => {}
            ImageChange::Clear => post.image = None,
            ImageChange::Replace(path) => post.image = Some(path),
        }
        Ok(Some(post.clone()))
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentDetail>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(comments
            .into_iter()
            .filter_map(|c| tables.comment_detail(c))
            .collect())
    }

    async fn count_comments(&self, post_id: Option<i64>) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|c| post_id.map_or(true, |id| c.post_id == id))
            .count() as i64)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(AppError::NotFound(format!("post {}", comment.post_id)));
        }

        let id = tables.next_id();
        let created = Comment {
            id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created: Utc::now(),
        };
        tables.comments.insert(id, created.clone());
        Ok(created)
    }

    async fn search_comments(
        &self,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentDetail>> {
        let query = blank_to_none(query);
        let tables = self.tables.read().await;
        let mut comments: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|c| query.map_or(true, |q| contains_ci(&c.text, q)))
            .collect();
        comments.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        let details = comments
            .into_iter()
            .filter_map(|c| tables.comment_detail(c))
            .collect();
        Ok(window(details, limit, offset))
    }

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .values()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn create_follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        if user_id == author_id {
            return Err(AppError::BadRequest("users cannot follow themselves".into()));
        }

        let mut tables = self.tables.write().await;
        if tables
            .follows
            .values()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok(false);
        }

        let id = tables.next_id();
        tables.follows.insert(
            id,
            Follow {
                id,
                user_id,
                author_id,
                created: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|_, f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(tables.follows.len() < before)
    }

    async fn count_followers(&self, author_id: i64) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .values()
            .filter(|f| f.author_id == author_id)
            .count() as i64)
    }

    async fn count_following(&self, user_id: i64) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .values()
            .filter(|f| f.user_id == user_id)
            .count() as i64)
    }

    async fn list_follows(
        &self,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FollowDetail>> {
        let query = blank_to_none(query);
        let tables = self.tables.read().await;
        let mut follows: Vec<FollowDetail> = tables
            .follows
            .values()
            .filter_map(|f| {
                let user = tables.users.get(&f.user_id)?;
                let author = tables.users.get(&f.author_id)?;
                Some(FollowDetail {
                    id: f.id,
                    user_id: f.user_id,
                    user_username: user.username.clone(),
                    author_id: f.author_id,
                    author_username: author.username.clone(),
                    created: f.created,
                })
            })
            .filter(|f| query.map_or(true, |q| contains_ci(&f.user_username, q)))
            .collect();
        follows.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(window(follows, limit, offset))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
