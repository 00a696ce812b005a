use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{
    application::{
        blog::{BlogError, BlogRequest, BlogService},
        error::{ErrorReport, HttpError},
        language::LanguagePolicy,
        repos::HealthRepo,
        urls::BlogNamespace,
        viewer::{StaffTokens, Viewer},
    },
    infra::telemetry,
    presentation::views::{
        LayoutChrome, LayoutContext, PostDetailContext, PostDetailTemplate, PostListContext,
        PostListTemplate, render_not_found_response, render_template_response,
    },
};

use super::{
    db_health_response,
    middleware::{Visitor, log_responses, resolve_visitor, set_request_context},
};

const ERROR_SOURCE: &str = "infra::http::public";

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
    pub languages: Arc<LanguagePolicy>,
    pub staff: Arc<StaffTokens>,
    pub namespaces: Arc<[BlogNamespace]>,
    pub site_title: String,
    pub health: Arc<dyn HealthRepo>,
}

/// Mount the blog routes once per namespace.
///
/// A namespace with an empty prefix is merged at the root; the others are
/// nested under their prefix. Each copy carries its own [`BlogNamespace`]
/// extension so handlers reverse URLs under the prefix that matched.
pub fn build_router(state: HttpState) -> Router {
    let mut router = Router::new().route("/_health/db", get(public_health));

    for namespace in state.namespaces.iter() {
        let routes = blog_routes().layer(Extension(namespace.clone()));
        router = if namespace.prefix.is_empty() {
            router.merge(routes)
        } else {
            router.nest(&namespace.prefix, routes)
        };
    }

    router
        .fallback(fallback)
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, resolve_visitor))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

fn blog_routes() -> Router<HttpState> {
    Router::new()
        .route("/", get(post_list))
        .route("/{year}", get(archive_year))
        .route("/{year}/{month}", get(archive_month))
        .route("/{year}/{month}/{day}/{slug}", get(post_detail))
        .route("/author/{username}", get(author_entries))
        .route("/category/{category}", get(category_entries))
        .route("/tag/{tag}", get(tagged_list))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CursorQuery {
    cursor: Option<String>,
}

fn blog_request(namespace: BlogNamespace, visitor: Visitor, query: CursorQuery) -> BlogRequest {
    BlogRequest {
        language: visitor.language,
        viewer: visitor.viewer,
        namespace,
        cursor: query.cursor.filter(|cursor| !cursor.is_empty()),
    }
}

async fn post_list(
    State(state): State<HttpState>,
    Extension(namespace): Extension<BlogNamespace>,
    Extension(visitor): Extension<Visitor>,
    Query(query): Query<CursorQuery>,
) -> Response {
    let request = blog_request(namespace, visitor, query);
    let result = state.blog.post_list(&request).await;
    list_response(&state, &request, "post_list", result)
}

async fn archive_year(
    State(state): State<HttpState>,
    Extension(namespace): Extension<BlogNamespace>,
    Extension(visitor): Extension<Visitor>,
    Path(year): Path<String>,
    Query(query): Query<CursorQuery>,
    uri: Uri,
) -> Response {
    let request = blog_request(namespace, visitor, query);
    if !is_archive_segment(&year) {
        return no_route(&state, &request, uri.path());
    }
    let result = state.blog.post_archive(&request, Some(&year), None).await;
    list_response(&state, &request, "post_archive", result)
}

async fn archive_month(
    State(state): State<HttpState>,
    Extension(namespace): Extension<BlogNamespace>,
    Extension(visitor): Extension<Visitor>,
    Path((year, month)): Path<(String, String)>,
    Query(query): Query<CursorQuery>,
    uri: Uri,
) -> Response {
    let request = blog_request(namespace, visitor, query);
    if !is_archive_segment(&year) || !is_archive_segment(&month) {
        return no_route(&state, &request, uri.path());
    }
    let result = state
        .blog
        .post_archive(&request, Some(&year), Some(&month))
        .await;
    list_response(&state, &request, "post_archive", result)
}

async fn post_detail(
    State(state): State<HttpState>,
    Extension(namespace): Extension<BlogNamespace>,
    Extension(visitor): Extension<Visitor>,
    Path((_year, _month, _day, slug)): Path<(String, String, String, String)>,
) -> Response {
    let request = blog_request(namespace, visitor, CursorQuery::default());
    let result = state.blog.post_detail(&request, &slug).await;
    detail_response(&state, &request, result)
}

async fn author_entries(
    State(state): State<HttpState>,
    Extension(namespace): Extension<BlogNamespace>,
    Extension(visitor): Extension<Visitor>,
    Path(username): Path<String>,
    Query(query): Query<CursorQuery>,
) -> Response {
    let request = blog_request(namespace, visitor, query);
    let result = state.blog.author_entries(&request, &username).await;
    list_response(&state, &request, "author_entries", result)
}

async fn category_entries(
    State(state): State<HttpState>,
    Extension(namespace): Extension<BlogNamespace>,
    Extension(visitor): Extension<Visitor>,
    Path(category): Path<String>,
    Query(query): Query<CursorQuery>,
) -> Response {
    let request = blog_request(namespace, visitor, query);
    let entries = state.blog.category_entries(&request, category);
    let result = entries.render().await;
    list_response(&state, &request, "category_entries", result)
}

async fn tagged_list(
    State(state): State<HttpState>,
    Extension(namespace): Extension<BlogNamespace>,
    Extension(visitor): Extension<Visitor>,
    Path(tag): Path<String>,
    Query(query): Query<CursorQuery>,
) -> Response {
    let request = blog_request(namespace, visitor, query);
    let result = state.blog.tagged_list(&request, &tag).await;
    list_response(&state, &request, "tagged_list", result)
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.ping().await)
}

async fn fallback(State(state): State<HttpState>, request: Request) -> Response {
    let namespace = request
        .extensions()
        .get::<BlogNamespace>()
        .or_else(|| state.namespaces.first())
        .cloned()
        .unwrap_or_else(|| BlogNamespace::new("blog", ""));
    let visitor = request
        .extensions()
        .get::<Visitor>()
        .cloned()
        .unwrap_or_else(|| Visitor {
            language: state.languages.default_language().clone(),
            viewer: Viewer::Anonymous,
        });

    let path = request.uri().path().to_string();
    let request = blog_request(namespace, visitor, CursorQuery::default());
    no_route(&state, &request, &path)
}

/// Archive segments are digits only; anything else is not an archive URL.
fn is_archive_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn no_route(state: &HttpState, request: &BlogRequest, path: &str) -> Response {
    let report = ErrorReport::from_message(
        "infra::http::public::no_route",
        StatusCode::NOT_FOUND,
        format!("no route for `{path}`"),
    );
    render_not_found_response(layout_chrome(state, request), report)
}

fn layout_chrome(state: &HttpState, request: &BlogRequest) -> LayoutChrome {
    let urls = state.blog.urls(request);
    LayoutChrome {
        site_title: state.site_title.clone(),
        language: request.language.to_string(),
        namespace: request.namespace.name.clone(),
        home_url: urls.post_list(),
        is_staff: request.viewer.is_staff(),
    }
}

fn list_response(
    state: &HttpState,
    request: &BlogRequest,
    view: &'static str,
    result: Result<PostListContext, BlogError>,
) -> Response {
    let chrome = layout_chrome(state, request);
    match result {
        Ok(content) => {
            telemetry::record_page_render(view);
            let view = LayoutContext::new(chrome, content);
            render_template_response(PostListTemplate { view }, StatusCode::OK)
        }
        Err(err) => blog_error_response(chrome, err),
    }
}

fn detail_response(
    state: &HttpState,
    request: &BlogRequest,
    result: Result<PostDetailContext, BlogError>,
) -> Response {
    let chrome = layout_chrome(state, request);
    match result {
        Ok(content) => {
            telemetry::record_page_render("post_detail");
            let view = LayoutContext::new(chrome, content);
            render_template_response(PostDetailTemplate { view }, StatusCode::OK)
        }
        Err(err) => blog_error_response(chrome, err),
    }
}

fn blog_error_response(chrome: LayoutChrome, err: BlogError) -> Response {
    if err.is_not_found() {
        let report = ErrorReport::from_error(ERROR_SOURCE, StatusCode::NOT_FOUND, &err);
        return render_not_found_response(chrome, report);
    }
    HttpError::from(err).into_response()
}
