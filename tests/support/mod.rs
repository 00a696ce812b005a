#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{Router, body::Body};
use chrono_tz::Tz;
use http_body_util::BodyExt;
use time::{OffsetDateTime, macros::datetime};
use uuid::Uuid;

use cms_blog::application::blog::{BlogOptions, BlogRequest, BlogService};
use cms_blog::application::language::LanguagePolicy;
use cms_blog::application::pagination::{CursorPage, PageRequest, PostCursor};
use cms_blog::application::repos::{
    CategoriesRepo, HealthRepo, PostQuery, PostsRepo, RepoError, UsersRepo,
};
use cms_blog::application::urls::BlogNamespace;
use cms_blog::application::viewer::{StaffTokens, Viewer};
use cms_blog::domain::entities::{
    CategoryRecord, PostRecord, PostTranslationRecord, TagRecord, UserRecord,
};
use cms_blog::domain::types::LanguageCode;
use cms_blog::infra::http::{HttpState, build_router};

pub const STAFF_TOKEN: &str = "editor-token";

pub fn lang(code: &str) -> LanguageCode {
    LanguageCode::parse(code).expect("valid language")
}

pub fn tag(slug: &str, name: &str) -> TagRecord {
    TagRecord {
        id: Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("tag:{slug}").as_bytes()),
        slug: slug.to_string(),
        name: name.to_string(),
    }
}

pub fn bob() -> UserRecord {
    UserRecord {
        id: Uuid::new_v5(&Uuid::NAMESPACE_OID, b"user:bob"),
        username: "bob".to_string(),
        first_name: "Bob".to_string(),
        last_name: "Builder".to_string(),
    }
}

pub fn news_category_id() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, b"category:news")
}

pub struct PostSeed {
    pub slug: &'static str,
    pub language: &'static str,
    pub publish: bool,
    pub date_published: OffsetDateTime,
    pub tags: Vec<TagRecord>,
    pub author: Option<UserRecord>,
    pub categories: Vec<Uuid>,
}

impl PostSeed {
    pub fn new(slug: &'static str, date_published: OffsetDateTime) -> Self {
        Self {
            slug,
            language: "en",
            publish: true,
            date_published,
            tags: Vec::new(),
            author: None,
            categories: Vec::new(),
        }
    }

    pub fn language(mut self, language: &'static str) -> Self {
        self.language = language;
        self
    }

    pub fn draft(mut self) -> Self {
        self.publish = false;
        self
    }

    pub fn tagged(mut self, tag: TagRecord) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn by(mut self, author: UserRecord) -> Self {
        self.author = Some(author);
        self
    }

    pub fn in_category(mut self, category: Uuid) -> Self {
        self.categories.push(category);
        self
    }

    pub fn build(self) -> PostRecord {
        self.build_with_id_suffix("")
    }

    /// Build with an id that differs from another seed sharing slug and language.
    pub fn build_with_id_suffix(self, suffix: &str) -> PostRecord {
        let id = Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("post:{}:{}{suffix}", self.language, self.slug).as_bytes(),
        );
        PostRecord {
            id,
            publish: self.publish,
            date_published: self.date_published,
            author: self.author,
            translation: PostTranslationRecord {
                language: lang(self.language),
                title: title_for(self.slug),
                slug: self.slug.to_string(),
                abstract_text: format!("Abstract of {}", self.slug),
                body_html: format!("<p>Body of {}</p>", self.slug),
            },
            tags: self.tags,
            category_ids: self.categories,
        }
    }
}

fn title_for(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The posts every test starts from.
pub fn seed_posts() -> Vec<PostRecord> {
    let python = tag("python", "Python");
    let rust = tag("rust", "Rust");

    vec![
        PostSeed::new("hello-python", datetime!(2024-05-03 09:00 UTC))
            .tagged(python.clone())
            .by(bob())
            .in_category(news_category_id())
            .build(),
        PostSeed::new("draft-may", datetime!(2024-05-20 12:00 UTC))
            .draft()
            .tagged(python.clone())
            .by(bob())
            .build(),
        PostSeed::new("april-rust", datetime!(2024-04-28 18:00 UTC))
            .tagged(rust)
            .build(),
        PostSeed::new("may-last-year", datetime!(2023-05-10 08:00 UTC))
            .tagged(python)
            .build(),
        PostSeed::new("late-night", datetime!(2024-05-31 23:30 UTC)).build(),
        PostSeed::new("hallo-welt", datetime!(2024-05-04 10:00 UTC))
            .language("de")
            .in_category(news_category_id())
            .build(),
    ]
}

/// In-memory store implementing every repository trait.
#[derive(Default)]
pub struct InMemoryBlog {
    posts: Vec<PostRecord>,
    categories: Vec<CategoryRecord>,
    users: Vec<UserRecord>,
    category_lookups: AtomicUsize,
}

impl InMemoryBlog {
    pub fn new(posts: Vec<PostRecord>) -> Self {
        Self {
            posts,
            categories: vec![
                CategoryRecord {
                    id: news_category_id(),
                    language: lang("en"),
                    name: "News".to_string(),
                    slug: "news".to_string(),
                },
                CategoryRecord {
                    id: news_category_id(),
                    language: lang("de"),
                    name: "Nachrichten".to_string(),
                    slug: "nachrichten".to_string(),
                },
            ],
            users: vec![bob()],
            category_lookups: AtomicUsize::new(0),
        }
    }

    pub fn seeded() -> Self {
        Self::new(seed_posts())
    }

    pub fn category_lookups(&self) -> usize {
        self.category_lookups.load(Ordering::SeqCst)
    }

    fn matching(&self, query: &PostQuery) -> Vec<PostRecord> {
        let mut posts: Vec<PostRecord> = self
            .posts
            .iter()
            .filter(|post| query.matches(post))
            .cloned()
            .collect();
        posts.sort_by(|left, right| {
            (right.date_published, right.id).cmp(&(left.date_published, left.id))
        });
        posts
    }
}

#[async_trait]
impl PostsRepo for InMemoryBlog {
    async fn list_posts(
        &self,
        query: &PostQuery,
        page: PageRequest<PostCursor>,
    ) -> Result<CursorPage<PostRecord>, RepoError> {
        let limit = page.limit.max(1) as usize;
        let mut posts: Vec<PostRecord> = self
            .matching(query)
            .into_iter()
            .filter(|post| {
                page.cursor
                    .as_ref()
                    .is_none_or(|cursor| cursor.precedes(post))
            })
            .take(limit + 1)
            .collect();

        let has_more = posts.len() > limit;
        posts.truncate(limit);
        let next_cursor = if has_more {
            posts.last().map(|post| PostCursor::after(post).encode())
        } else {
            None
        };

        Ok(CursorPage::new(posts, next_cursor))
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64, RepoError> {
        Ok(self.matching(query).len() as u64)
    }

    async fn find_by_slug(
        &self,
        query: &PostQuery,
        slug: &str,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        Ok(self
            .matching(query)
            .into_iter()
            .filter(|post| post.translation.slug == slug)
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl CategoriesRepo for InMemoryBlog {
    async fn find_by_slug(
        &self,
        language: &LanguageCode,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        self.category_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .categories
            .iter()
            .find(|category| &category.language == language && category.slug == slug)
            .cloned())
    }
}

#[async_trait]
impl UsersRepo for InMemoryBlog {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }
}

#[async_trait]
impl HealthRepo for InMemoryBlog {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Repository whose every call fails with `error`.
pub struct FailingRepo {
    pub timeout: bool,
}

impl FailingRepo {
    fn error(&self) -> RepoError {
        if self.timeout {
            RepoError::Timeout
        } else {
            RepoError::from_persistence("connection reset")
        }
    }
}

#[async_trait]
impl PostsRepo for FailingRepo {
    async fn list_posts(
        &self,
        _query: &PostQuery,
        _page: PageRequest<PostCursor>,
    ) -> Result<CursorPage<PostRecord>, RepoError> {
        Err(self.error())
    }

    async fn count_posts(&self, _query: &PostQuery) -> Result<u64, RepoError> {
        Err(self.error())
    }

    async fn find_by_slug(
        &self,
        _query: &PostQuery,
        _slug: &str,
        _limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        Err(self.error())
    }
}

#[async_trait]
impl HealthRepo for FailingRepo {
    async fn ping(&self) -> Result<(), RepoError> {
        Err(self.error())
    }
}

pub fn options(pagination: u32) -> BlogOptions {
    BlogOptions {
        pagination: std::num::NonZeroU32::new(pagination).expect("non-zero page size"),
        ..BlogOptions::default()
    }
}

pub fn service_with(repo: Arc<InMemoryBlog>, options: BlogOptions) -> BlogService {
    BlogService::new(repo.clone(), repo.clone(), repo, options)
}

pub fn service(repo: Arc<InMemoryBlog>) -> BlogService {
    service_with(repo, BlogOptions::default())
}

pub fn request(language: &str, viewer: Viewer) -> BlogRequest {
    BlogRequest {
        language: lang(language),
        viewer,
        namespace: BlogNamespace::new("blog", "/blog"),
        cursor: None,
    }
}

pub fn namespaces() -> Vec<BlogNamespace> {
    vec![
        BlogNamespace::new("blog", "/blog"),
        BlogNamespace::new("news", "/news"),
    ]
}

pub fn http_state(blog: BlogService, health: Arc<dyn HealthRepo>) -> HttpState {
    HttpState {
        blog: Arc::new(blog),
        languages: Arc::new(LanguagePolicy::new(lang("en"), vec![lang("de")])),
        staff: Arc::new(StaffTokens::new(vec![StaffTokens::digest(STAFF_TOKEN)])),
        namespaces: namespaces().into(),
        site_title: "Test Blog".to_string(),
        health,
    }
}

pub fn router(repo: Arc<InMemoryBlog>) -> Router {
    build_router(http_state(service(repo.clone()), repo))
}

pub fn berlin_options() -> BlogOptions {
    BlogOptions {
        timezone: Tz::Europe__Berlin,
        ..BlogOptions::default()
    }
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.expect("collect body").to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}
