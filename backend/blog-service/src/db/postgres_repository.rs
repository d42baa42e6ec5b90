use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::BlogRepository;
use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentDetail, FollowDetail, Group, ImageChange, NewComment, NewGroup, NewPost,
    NewUser, Post, PostChanges, PostDetail, PostScope, User,
};

const POST_DETAIL_SELECT: &str = r#"
    SELECT p.id, p.text, p.pub_date, p.author_id,
           u.username AS author_username,
           u.first_name AS author_first_name,
           u.last_name AS author_last_name,
           p.group_id, g.title AS group_title, g.slug AS group_slug,
           p.image,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

/// Every scope is expressed through the same four nullable parameters so the
/// statement text stays static.
const SCOPE_FILTER: &str = r#"
    WHERE ($1::BIGINT IS NULL OR p.group_id = $1)
      AND ($2::BIGINT IS NULL OR p.author_id = $2)
      AND ($3::BIGINT IS NULL OR p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = $3))
      AND ($4::TEXT IS NULL OR p.text ILIKE '%' || $4 || '%')
"#;

struct ScopeBinds {
    group_id: Option<i64>,
    author_id: Option<i64>,
    follower_id: Option<i64>,
    text: Option<String>,
}

impl From<&PostScope> for ScopeBinds {
    fn from(scope: &PostScope) -> Self {
        let mut binds = ScopeBinds {
            group_id: None,
            author_id: None,
            follower_id: None,
            text: None,
        };
        match scope {
            PostScope::All => {}
            PostScope::Group(id) => binds.group_id = Some(*id),
            PostScope::Author(id) => binds.author_id = Some(*id),
            PostScope::FollowedBy(id) => binds.follower_id = Some(*id),
            PostScope::TextContains(query) => binds.text = Some(escape_like(query)),
        }
        binds
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn like_param(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(escape_like)
}

/// PostgreSQL-backed repository (source of truth in deployments)
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogRepository for PostgresRepository {
    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, first_name, last_name, date_joined FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, first_name, last_name, date_joined FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn ensure_user(&self, user: NewUser) -> Result<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name
            RETURNING id, username, first_name, last_name, date_joined
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(mirrored) => {
                debug!(user_id = mirrored.id, username = %mirrored.username, "Mirrored user");
                Ok(mirrored)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::Conflict(format!("username '{}' already exists", user.username)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_group_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn list_groups(&self, query: Option<&str>) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            r#"
            SELECT id, title, slug, description
            FROM post_groups
            WHERE ($1::TEXT IS NULL OR title ILIKE '%' || $1 || '%')
            ORDER BY title, id
            "#,
        )
        .bind(like_param(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let result = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO post_groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(group) => Ok(group),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::Conflict(format!("group slug '{}' already exists", group.slug)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn count_posts(&self, scope: &PostScope) -> Result<i64> {
        let binds = ScopeBinds::from(scope);
        let sql = format!("SELECT COUNT(*) FROM posts p {}", SCOPE_FILTER);

        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(binds.group_id)
            .bind(binds.author_id)
            .bind(binds.follower_id)
            .bind(binds.text)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_posts(
        &self,
        scope: &PostScope,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostDetail>> {
        let binds = ScopeBinds::from(scope);
        let sql = format!(
            "{} {} ORDER BY p.pub_date DESC, p.id DESC LIMIT $5 OFFSET $6",
            POST_DETAIL_SELECT, SCOPE_FILTER
        );

        let posts = sqlx::query_as::<_, PostDetail>(&sql)
            .bind(binds.group_id)
            .bind(binds.author_id)
            .bind(binds.follower_id)
            .bind(binds.text)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, text, pub_date, author_id, group_id, image FROM posts WHERE id = $1",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_post_detail(&self, post_id: i64) -> Result<Option<PostDetail>> {
        let sql = format!("{} WHERE p.id = $1", POST_DETAIL_SELECT);
        let post = sqlx::query_as::<_, PostDetail>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (text, author_id, group_id, image)
            VALUES ($1, $2, $3, $4)
            RETURNING id, text, pub_date, author_id, group_id, image
            "#,
        )
        .bind(&post.text)
        .bind(post.author_id)
        .bind(post.group_id)
        .bind(&post.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn update_post(
        &self,
        post_id: i64,
        author_id: i64,
        changes: PostChanges,
    ) -> Result<Option<Post>> {
        let (touch_image, image) = match changes.image {
            ImageChange::Keep => (false, None),
            ImageChange::Clear => (true, None),
            ImageChange::Replace(path) => (true, Some(path)),
        };

        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET text = $1,
                group_id = $2,
                image = CASE WHEN $3 THEN $4 ELSE image END
            WHERE id = $5 AND author_id = $6
            RETURNING id, text, pub_date, author_id, group_id, image
            "#,
        )
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(touch_image)
        .bind(image)
        .bind(post_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentDetail>> {
        let comments = sqlx::query_as::<_, CommentDetail>(
            r#"
            SELECT c.id, c.post_id, c.author_id, u.username AS author_username,
                   p.text AS post_text, c.text, c.created
            FROM comments c
            JOIN users u ON u.id = c.author_id
            JOIN posts p ON p.id = c.post_id
            WHERE c.post_id = $1
            ORDER BY c.created ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn count_comments(&self, post_id: Option<i64>) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM comments WHERE ($1::BIGINT IS NULL OR post_id = $1)",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, author_id, text, created
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn search_comments(
        &self,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentDetail>> {
        let comments = sqlx::query_as::<_, CommentDetail>(
            r#"
            SELECT c.id, c.post_id, c.author_id, u.username AS author_username,
                   p.text AS post_text, c.text, c.created
            FROM comments c
            JOIN users u ON u.id = c.author_id
            JOIN posts p ON p.id = c.post_id
            WHERE ($1::TEXT IS NULL OR c.text ILIKE '%' || $1 || '%')
            ORDER BY c.created DESC, c.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(like_param(query))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO follows (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        debug!(user_id, author_id, "Created follow");
        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        debug!(user_id, author_id, "Deleted follow");
        Ok(result.rows_affected() > 0)
    }

    async fn count_followers(&self, author_id: i64) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_following(&self, user_id: i64) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_follows(
        &self,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FollowDetail>> {
        let follows = sqlx::query_as::<_, FollowDetail>(
            r#"
            SELECT f.id, f.user_id, fu.username AS user_username,
                   f.author_id, au.username AS author_username, f.created
            FROM follows f
            JOIN users fu ON fu.id = f.user_id
            JOIN users au ON au.id = f.author_id
            WHERE ($1::TEXT IS NULL OR fu.username ILIKE '%' || $1 || '%')
            ORDER BY f.created DESC, f.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(like_param(query))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(follows)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_scope_binds() {
        let binds = ScopeBinds::from(&PostScope::FollowedBy(7));
        assert_eq!(binds.follower_id, Some(7));
        assert!(binds.group_id.is_none() && binds.author_id.is_none() && binds.text.is_none());

        let binds = ScopeBinds::from(&PostScope::TextContains("50%".into()));
        assert_eq!(binds.text.as_deref(), Some("50\\%"));
    }

    #[test]
    fn test_like_param_ignores_blank() {
        assert_eq!(like_param(Some("   ")), None);
        assert_eq!(like_param(None), None);
        assert_eq!(like_param(Some(" tea ")), Some("tea".to_string()));
    }
}
