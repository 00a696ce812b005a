//! Blog list and detail views.
//!
//! Every view starts from the same base collection, built by [`BlogScope`]
//! from the request's language and privilege, and narrows it by one more
//! dimension before handing the page to the presentation layer.

mod archive;
mod author;
mod category;
mod detail;
mod list;
mod tagged;

pub use category::CategoryEntries;

use std::{num::NonZeroU32, sync::Arc};

use chrono_tz::Tz;
use thiserror::Error;

use crate::application::pagination::{PageRequest, PostCursor};
use crate::application::repos::{
    CategoriesRepo, PostQuery, PostVisibility, PostsRepo, RepoError, UsersRepo,
};
use crate::application::urls::{BlogNamespace, BlogUrls};
use crate::application::viewer::Viewer;
use crate::domain::entities::PostRecord;
use crate::domain::error::DomainError;
use crate::domain::posts;
use crate::domain::types::LanguageCode;
use crate::presentation::views::{
    ArchiveView, AuthorLink, CategoryView, PostCard, PostListContext, TagBadge,
};
use crate::util::timezone;

pub const DEFAULT_PAGINATION: u32 = 10;
pub const DEFAULT_TRUNCWORDS_COUNT: usize = 100;

/// Site-wide knobs the views read on every request.
#[derive(Debug, Clone)]
pub struct BlogOptions {
    pub pagination: NonZeroU32,
    pub truncwords_count: usize,
    pub timezone: Tz,
}

impl Default for BlogOptions {
    fn default() -> Self {
        Self {
            pagination: NonZeroU32::new(DEFAULT_PAGINATION).unwrap_or(NonZeroU32::MIN),
            truncwords_count: DEFAULT_TRUNCWORDS_COUNT,
            timezone: Tz::UTC,
        }
    }
}

/// Everything a view needs to know about the incoming request.
#[derive(Debug, Clone)]
pub struct BlogRequest {
    pub language: LanguageCode,
    pub viewer: Viewer,
    pub namespace: BlogNamespace,
    pub cursor: Option<String>,
}

/// Language and visibility policy shared by all views.
#[derive(Debug, Clone)]
pub struct BlogScope {
    language: LanguageCode,
    visibility: PostVisibility,
    timezone: Tz,
}

impl BlogScope {
    pub fn for_request(request: &BlogRequest, options: &BlogOptions) -> Self {
        let visibility = if request.viewer.is_staff() {
            PostVisibility::All
        } else {
            PostVisibility::PublishedOnly
        };

        Self {
            language: request.language.clone(),
            visibility,
            timezone: options.timezone,
        }
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    pub fn visibility(&self) -> PostVisibility {
        self.visibility
    }

    /// Posts translated into the active language, restricted to published
    /// ones unless the viewer is staff.
    pub fn base_query(&self) -> PostQuery {
        PostQuery::new(self.language.clone(), self.visibility, self.timezone)
    }
}

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("no post with slug `{0}`")]
    PostNotFound(String),
    #[error("no author with username `{0}`")]
    AuthorNotFound(String),
    #[error("no category with slug `{slug}` in language `{language}`")]
    CategoryNotFound { language: String, slug: String },
    #[error("slug `{slug}` matched {count} posts")]
    AmbiguousSlug { slug: String, count: usize },
    #[error("invalid path parameter: {0}")]
    InvalidParameter(#[from] DomainError),
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl BlogError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BlogError::PostNotFound(_)
                | BlogError::AuthorNotFound(_)
                | BlogError::CategoryNotFound { .. }
        )
    }
}

/// Extra context a list view contributes on top of the shared listing.
#[derive(Default)]
struct ListExtras {
    heading: String,
    archive: Option<ArchiveView>,
    tagged_entries: Option<String>,
    author: Option<AuthorLink>,
    category: Option<CategoryView>,
}

#[derive(Clone)]
pub struct BlogService {
    posts: Arc<dyn PostsRepo>,
    categories: Arc<dyn CategoriesRepo>,
    users: Arc<dyn UsersRepo>,
    options: BlogOptions,
}

impl BlogService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        categories: Arc<dyn CategoriesRepo>,
        users: Arc<dyn UsersRepo>,
        options: BlogOptions,
    ) -> Self {
        Self {
            posts,
            categories,
            users,
            options,
        }
    }

    pub fn scope(&self, request: &BlogRequest) -> BlogScope {
        BlogScope::for_request(request, &self.options)
    }

    pub fn urls(&self, request: &BlogRequest) -> BlogUrls {
        BlogUrls::new(request.namespace.clone(), self.options.timezone)
    }

    fn decode_cursor(&self, request: &BlogRequest) -> Result<Option<PostCursor>, BlogError> {
        request
            .cursor
            .as_deref()
            .map(PostCursor::decode)
            .transpose()
            .map_err(|err| BlogError::InvalidCursor(err.to_string()))
    }

    /// Paginate `query` and assemble the context shared by every list page.
    async fn list_context(
        &self,
        request: &BlogRequest,
        query: PostQuery,
        path: String,
        extras: ListExtras,
    ) -> Result<PostListContext, BlogError> {
        let cursor = self.decode_cursor(request)?;
        let urls = self.urls(request);

        let page = self
            .posts
            .list_posts(
                &query,
                PageRequest::new(self.options.pagination.get(), cursor),
            )
            .await?;
        let total = self.posts.count_posts(&query).await?;

        let posts: Vec<PostCard> = page
            .items
            .iter()
            .map(|record| self.post_card(record, &urls))
            .collect();

        let post_count = posts.len();
        Ok(PostListContext {
            heading: extras.heading,
            posts,
            post_count,
            total_count: usize::try_from(total).unwrap_or(usize::MAX),
            has_results: post_count > 0,
            next_page_url: page
                .next_cursor
                .map(|cursor| BlogUrls::with_cursor(&path, &cursor)),
            truncwords_count: self.options.truncwords_count,
            archive: extras.archive,
            tagged_entries: extras.tagged_entries,
            author: extras.author,
            category: extras.category,
        })
    }

    fn post_card(&self, record: &PostRecord, urls: &BlogUrls) -> PostCard {
        let date = timezone::local_date(record.date_published, self.options.timezone);

        PostCard {
            title: record.translation.title.clone(),
            url: urls.post_detail(record),
            excerpt: posts::truncate_words(
                &record.translation.abstract_text,
                self.options.truncwords_count,
            ),
            published: posts::format_human_date(date),
            iso_date: posts::format_iso_date(date),
            author: record.author.as_ref().map(|author| AuthorLink {
                name: author.display_name(),
                url: urls.author(&author.username),
            }),
            tags: tag_badges(record, urls),
            is_draft: !record.publish,
        }
    }
}

fn tag_badges(record: &PostRecord, urls: &BlogUrls) -> Vec<TagBadge> {
    record
        .tags
        .iter()
        .map(|tag| TagBadge {
            label: tag.name.clone(),
            url: urls.tagged(&tag.slug),
        })
        .collect()
}
