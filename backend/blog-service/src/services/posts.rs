/// Post service - listings, lookup and author-only edits
use std::sync::Arc;
use tracing::info;

use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::forms::CleanedPost;
use crate::media::MediaStore;
use crate::metrics::content::{POSTS_CREATED_TOTAL, POSTS_UPDATED_TOTAL};
use crate::models::{Group, ImageChange, NewPost, Post, PostChanges, PostDetail, PostScope, User};
use crate::pagination::{Page, Paginator};

pub struct PostService {
    repo: Arc<dyn BlogRepository>,
    per_page: usize,
}

impl PostService {
    pub fn new(repo: Arc<dyn BlogRepository>, per_page: usize) -> Self {
        Self { repo, per_page }
    }

    /// One page of the posts in `scope`, newest first.
    pub async fn list_page(
        &self,
        scope: &PostScope,
        raw_page: Option<&str>,
    ) -> Result<Page<PostDetail>> {
        let total = self.repo.count_posts(scope).await?;
        let window = Paginator::new(total.max(0) as usize, self.per_page).get_page(raw_page);
        let items = if window.is_empty() {
            Vec::new()
        } else {
            self.repo
                .list_posts(scope, window.per_page as i64, window.offset() as i64)
                .await?
        };
        Ok(Page::new(window, items))
    }

    pub async fn author(&self, username: &str) -> Result<User> {
        self.repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", username)))
    }

    pub async fn group(&self, slug: &str) -> Result<Group> {
        self.repo
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group {}", slug)))
    }

    pub async fn groups(&self) -> Result<Vec<Group>> {
        self.repo.list_groups(None).await
    }

    /// A post addressed by its author's username; a post by someone else is
    /// not found under that author.
    pub async fn post_by_author(&self, username: &str, post_id: i64) -> Result<(User, PostDetail)> {
        let author = self.author(username).await?;
        let post = self
            .repo
            .find_post_detail(post_id)
            .await?
            .filter(|p| p.author_id == author.id)
            .ok_or_else(|| AppError::NotFound(format!("post {}/{}", username, post_id)))?;
        Ok((author, post))
    }

    pub async fn create_post(
        &self,
        author_id: i64,
        cleaned: CleanedPost,
        media: &MediaStore,
    ) -> Result<Post> {
        let image = match &cleaned.image {
            Some(upload) => Some(media.save(upload).await?),
            None => None,
        };

        let post = self
            .repo
            .create_post(NewPost {
                author_id,
                text: cleaned.text,
                group_id: cleaned.group_id,
                image,
            })
            .await?;

        POSTS_CREATED_TOTAL.inc();
        info!(post_id = post.id, author_id, group_id = ?post.group_id, "Post created");
        Ok(post)
    }

    /// Apply an edit made by `author_id`. The author column is never written.
    pub async fn update_post(
        &self,
        author_id: i64,
        post_id: i64,
        cleaned: CleanedPost,
        media: &MediaStore,
    ) -> Result<Post> {
        let image = match (&cleaned.image, cleaned.clear_image) {
            (Some(upload), _) => ImageChange::Replace(media.save(upload).await?),
            (None, true) => ImageChange::Clear,
            (None, false) => ImageChange::Keep,
        };

        let post = self
            .repo
            .update_post(
                post_id,
                author_id,
                PostChanges {
                    text: cleaned.text,
                    group_id: cleaned.group_id,
                    image,
                },
            )
            .await?
            .ok_or_else(|| {
                AppError::Forbidden("You don't have permission to modify this post".to_string())
            })?;

        POSTS_UPDATED_TOTAL.inc();
        info!(post_id, author_id, "Post updated");
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;
    use crate::models::NewUser;

    async fn seeded(posts: usize) -> (Arc<dyn BlogRepository>, User) {
        let repo: Arc<dyn BlogRepository> = Arc::new(MemoryRepository::new());
        let author = repo
            .ensure_user(NewUser {
                id: 1,
                username: "author".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        for i in 0..posts {
            repo.create_post(NewPost {
                author_id: author.id,
                text: format!("post {i}"),
                group_id: None,
                image: None,
            })
            .await
            .unwrap();
        }
        (repo, author)
    }

    #[actix_web::test]
    async fn test_pages_hold_page_size_then_remainder() {
        let (repo, _) = seeded(13).await;
        let service = PostService::new(repo, 10);

        let first = service.list_page(&PostScope::All, None).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first.items[0].text, "post 12");

        let second = service.list_page(&PostScope::All, Some("2")).await.unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(second.items[2].text, "post 0");
    }

    #[actix_web::test]
    async fn test_post_must_belong_to_named_author() {
        let (repo, author) = seeded(1).await;
        repo.ensure_user(NewUser {
            id: 2,
            username: "someone".into(),
            ..Default::default()
        })
        .await
        .unwrap();
        let post_id = repo.list_posts(&PostScope::All, 1, 0).await.unwrap()[0].id;
        let service = PostService::new(repo, 10);

        let (found_author, post) = service.post_by_author("author", post_id).await.unwrap();
        assert_eq!(found_author.id, author.id);
        assert_eq!(post.id, post_id);

        assert!(matches!(
            service.post_by_author("someone", post_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.post_by_author("nobody", post_id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
