//! Post use-case service.

use super::{finish, ServiceResult};
use crate::model::post::{NewPost, Post, PostUpdate};
use crate::model::EntityId;
use crate::repo::post_repo::PostRepository;
use std::time::Instant;

/// Facade for post CRUD, title search and per-author listing.
pub struct PostService<R: PostRepository> {
    repo: R,
}

impl<R: PostRepository> PostService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a post for an existing author.
    ///
    /// An unknown `author_id` fails with `FailureKind::InvalidAuthorReference`
    /// and nothing is persisted.
    pub fn create(&self, input: &NewPost) -> ServiceResult<Post> {
        let started_at = Instant::now();
        let result = self.repo.create_post(input);
        finish("post_create", started_at, result, |post| {
            format!("post_id={} author_id={}", post.id, post.author_id)
        })
    }

    pub fn get(&self, id: EntityId) -> ServiceResult<Option<Post>> {
        let started_at = Instant::now();
        let result = self.repo.get_post(id);
        finish("post_get", started_at, result, |post| {
            format!("post_id={id} found={}", post.is_some())
        })
    }

    /// Lists all posts in insertion order.
    pub fn list(&self) -> ServiceResult<Vec<Post>> {
        let started_at = Instant::now();
        let result = self.repo.list_posts();
        finish("post_list", started_at, result, |posts| {
            format!("count={}", posts.len())
        })
    }

    pub fn update(&self, id: EntityId, update: &PostUpdate) -> ServiceResult<Post> {
        let started_at = Instant::now();
        let result = self.repo.update_post(id, update);
        finish("post_update", started_at, result, |post| {
            format!("post_id={}", post.id)
        })
    }

    pub fn delete(&self, id: EntityId) -> ServiceResult<Post> {
        let started_at = Instant::now();
        let result = self.repo.delete_post(id);
        finish("post_delete", started_at, result, |post| {
            format!("post_id={}", post.id)
        })
    }

    /// Returns every post whose title equals `title` exactly.
    pub fn search_by_title(&self, title: &str) -> ServiceResult<Vec<Post>> {
        let started_at = Instant::now();
        let result = self.repo.find_posts_by_title(title);
        finish("post_search_title", started_at, result, |posts| {
            format!("count={}", posts.len())
        })
    }

    pub fn list_by_author(&self, author_id: EntityId) -> ServiceResult<Vec<Post>> {
        let started_at = Instant::now();
        let result = self.repo.list_posts_by_author(author_id);
        finish("post_list_author", started_at, result, |posts| {
            format!("author_id={author_id} count={}", posts.len())
        })
    }
}
