use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Render the not-found page, keeping the original failure in the report.
pub fn render_not_found_response(chrome: LayoutChrome, report: ErrorReport) -> Response {
    let view = LayoutContext::new(chrome.clone(), NotFoundView::for_chrome(&chrome));
    let mut response = render_template_response(NotFoundTemplate { view }, StatusCode::NOT_FOUND);
    report.attach(&mut response);
    response
}

/// Page frame shared by every blog page.
#[derive(Debug, Clone)]
pub struct LayoutChrome {
    pub site_title: String,
    pub language: String,
    pub namespace: String,
    pub home_url: String,
    pub is_staff: bool,
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub site_title: String,
    pub language: String,
    pub namespace: String,
    pub home_url: String,
    pub is_staff: bool,
    pub page_title: String,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self
    where
        T: PageTitle,
    {
        let page_title = match content.page_title() {
            Some(title) => format!("{title} | {}", chrome.site_title),
            None => chrome.site_title.clone(),
        };

        Self {
            site_title: chrome.site_title,
            language: chrome.language,
            namespace: chrome.namespace,
            home_url: chrome.home_url,
            is_staff: chrome.is_staff,
            page_title,
            content,
        }
    }
}

pub trait PageTitle {
    fn page_title(&self) -> Option<&str>;
}

#[derive(Debug, Clone)]
pub struct TagBadge {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct AuthorLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PostCard {
    pub title: String,
    pub url: String,
    pub excerpt: String,
    pub iso_date: String,
    pub published: String,
    pub author: Option<AuthorLink>,
    pub tags: Vec<TagBadge>,
    pub is_draft: bool,
}

#[derive(Debug, Clone)]
pub struct ArchiveView {
    pub year: Option<i32>,
    pub month: Option<u8>,
    pub label: Option<String>,
    /// First day of the archived period, `YYYY-MM-DD`.
    pub archive_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryView {
    pub name: String,
    pub slug: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PostListContext {
    pub heading: String,
    pub posts: Vec<PostCard>,
    pub post_count: usize,
    pub total_count: usize,
    pub has_results: bool,
    pub next_page_url: Option<String>,
    pub truncwords_count: usize,
    pub archive: Option<ArchiveView>,
    pub tagged_entries: Option<String>,
    pub author: Option<AuthorLink>,
    pub category: Option<CategoryView>,
}

impl PageTitle for PostListContext {
    fn page_title(&self) -> Option<&str> {
        Some(&self.heading)
    }
}

#[derive(Template)]
#[template(path = "post_list.html")]
pub struct PostListTemplate {
    pub view: LayoutContext<PostListContext>,
}

#[derive(Debug, Clone)]
pub struct PostDetailContext {
    pub title: String,
    pub slug: String,
    pub url: String,
    pub excerpt: String,
    pub body_html: String,
    pub published: String,
    pub iso_date: String,
    pub archive_url: String,
    pub author: Option<AuthorLink>,
    pub tags: Vec<TagBadge>,
    pub is_draft: bool,
    pub list_url: String,
}

impl PageTitle for PostDetailContext {
    fn page_title(&self) -> Option<&str> {
        Some(&self.title)
    }
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

#[derive(Debug, Clone)]
pub struct NotFoundView {
    pub title: String,
    pub message: String,
    pub back_href: String,
}

impl NotFoundView {
    fn for_chrome(chrome: &LayoutChrome) -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist or is not published yet."
                .to_string(),
            back_href: chrome.home_url.clone(),
        }
    }
}

impl PageTitle for NotFoundView {
    fn page_title(&self) -> Option<&str> {
        Some(&self.title)
    }
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub view: LayoutContext<NotFoundView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrome() -> LayoutChrome {
        LayoutChrome {
            site_title: "Blog".into(),
            language: "en".into(),
            namespace: "blog".into(),
            home_url: "/blog".into(),
            is_staff: false,
        }
    }

    fn list(posts: Vec<PostCard>) -> PostListContext {
        let post_count = posts.len();
        PostListContext {
            heading: "Tagged: python".into(),
            posts,
            post_count,
            total_count: post_count,
            has_results: post_count > 0,
            next_page_url: Some("/blog/tag/python?cursor=abc".into()),
            truncwords_count: 100,
            archive: None,
            tagged_entries: Some("python".into()),
            author: None,
            category: None,
        }
    }

    #[test]
    fn list_page_renders_cards_and_pager() {
        let card = PostCard {
            title: "Snakes & ladders".into(),
            url: "/blog/2024/05/03/snakes".into(),
            excerpt: "A short story".into(),
            iso_date: "2024-05-03".into(),
            published: "May 3, 2024".into(),
            author: None,
            tags: vec![TagBadge {
                label: "Python".into(),
                url: "/blog/tag/python".into(),
            }],
            is_draft: true,
        };
        let html = PostListTemplate {
            view: LayoutContext::new(chrome(), list(vec![card])),
        }
        .render()
        .expect("render list");

        assert!(html.contains("<title>Tagged: python | Blog</title>"));
        assert!(html.contains("Snakes &#38; ladders") || html.contains("Snakes &amp; ladders"));
        assert!(html.contains("href=\"/blog/2024/05/03/snakes\""));
        assert!(html.contains("/blog/tag/python?cursor=abc"));
        assert!(html.contains("data-draft"));
    }

    #[test]
    fn empty_list_says_so() {
        let html = PostListTemplate {
            view: LayoutContext::new(chrome(), list(Vec::new())),
        }
        .render()
        .expect("render empty list");
        assert!(html.contains("No posts found."));
    }

    #[test]
    fn not_found_response_has_status_and_report() {
        let report = ErrorReport::from_message("test", StatusCode::NOT_FOUND, "missing");
        let response = render_not_found_response(chrome(), report);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }
}
