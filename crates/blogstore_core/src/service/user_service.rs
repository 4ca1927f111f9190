//! User use-case service.

use super::{finish, ServiceResult};
use crate::model::user::{NewUser, User, UserUpdate};
use crate::model::EntityId;
use crate::repo::user_repo::UserRepository;
use std::time::Instant;

/// Facade for user CRUD and email lookup.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a user and returns it with its assigned id.
    ///
    /// A taken email fails with `FailureKind::DuplicateEmail`.
    pub fn create(&self, input: &NewUser) -> ServiceResult<User> {
        let started_at = Instant::now();
        let result = self.repo.create_user(input);
        finish("user_create", started_at, result, |user| {
            format!("user_id={}", user.id)
        })
    }

    pub fn get(&self, id: EntityId) -> ServiceResult<Option<User>> {
        let started_at = Instant::now();
        let result = self.repo.get_user(id);
        finish("user_get", started_at, result, |user| {
            format!("user_id={id} found={}", user.is_some())
        })
    }

    /// Lists all users in insertion order.
    pub fn list(&self) -> ServiceResult<Vec<User>> {
        let started_at = Instant::now();
        let result = self.repo.list_users();
        finish("user_list", started_at, result, |users| {
            format!("count={}", users.len())
        })
    }

    /// Applies a partial update; omitted fields are left untouched.
    pub fn update(&self, id: EntityId, update: &UserUpdate) -> ServiceResult<User> {
        let started_at = Instant::now();
        let result = self.repo.update_user(id, update);
        finish("user_update", started_at, result, |user| {
            format!("user_id={}", user.id)
        })
    }

    /// Deletes a user and returns its last state.
    ///
    /// Users that still author posts cannot be deleted.
    pub fn delete(&self, id: EntityId) -> ServiceResult<User> {
        let started_at = Instant::now();
        let result = self.repo.delete_user(id);
        finish("user_delete", started_at, result, |user| {
            format!("user_id={}", user.id)
        })
    }

    /// Looks up the single user owning `email`.
    pub fn search_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let started_at = Instant::now();
        let result = self.repo.find_user_by_email(email);
        finish("user_search_email", started_at, result, |user| {
            format!("count={}", usize::from(user.is_some()))
        })
    }
}
