//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use chrono_tz::Tz;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{CursorPage, PageRequest, PostCursor};
use crate::domain::entities::{CategoryRecord, PostRecord, UserRecord};
use crate::domain::posts::ArchivePeriod;
use crate::domain::types::LanguageCode;
use crate::util::timezone;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Which publication states a viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostVisibility {
    PublishedOnly,
    All,
}

/// Filter applied to every post lookup.
///
/// `language` and `visibility` come from the request; the remaining fields
/// are narrowed by individual views.
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub language: LanguageCode,
    pub visibility: PostVisibility,
    pub timezone: Tz,
    pub period: ArchivePeriod,
    pub tag: Option<String>,
    pub author_username: Option<String>,
    pub category_id: Option<Uuid>,
}

impl PostQuery {
    pub fn new(language: LanguageCode, visibility: PostVisibility, timezone: Tz) -> Self {
        Self {
            language,
            visibility,
            timezone,
            period: ArchivePeriod::default(),
            tag: None,
            author_username: None,
            category_id: None,
        }
    }

    /// Evaluate the filter against an already loaded post.
    ///
    /// Postgres evaluates the same conditions in SQL; in-process stores use
    /// this directly.
    pub fn matches(&self, post: &PostRecord) -> bool {
        if post.translation.language != self.language {
            return false;
        }
        if self.visibility == PostVisibility::PublishedOnly && !post.publish {
            return false;
        }
        if !self
            .period
            .contains(timezone::local_date(post.date_published, self.timezone))
        {
            return false;
        }
        if let Some(tag) = self.tag.as_deref() {
            if !post.tags.iter().any(|candidate| candidate.slug == tag) {
                return false;
            }
        }
        if let Some(username) = self.author_username.as_deref() {
            if post.author.as_ref().map(|author| author.username.as_str()) != Some(username) {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if !post.category_ids.contains(&category_id) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts matching `query`, newest first.
    async fn list_posts(
        &self,
        query: &PostQuery,
        page: PageRequest<PostCursor>,
    ) -> Result<CursorPage<PostRecord>, RepoError>;

    async fn count_posts(&self, query: &PostQuery) -> Result<u64, RepoError>;

    /// Up to `limit` posts matching `query` whose translation slug is `slug`.
    async fn find_by_slug(
        &self,
        query: &PostQuery,
        slug: &str,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError>;
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    async fn find_by_slug(
        &self,
        language: &LanguageCode,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
