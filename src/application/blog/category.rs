use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::instrument;

use super::{BlogError, BlogRequest, BlogService, ListExtras};
use crate::domain::entities::CategoryRecord;
use crate::presentation::views::{CategoryView, PostListContext};

/// Category listing for a single request.
///
/// The category is looked up at most once per value; later accesses return
/// the same record.
pub struct CategoryEntries<'a> {
    service: &'a BlogService,
    request: &'a BlogRequest,
    slug: String,
    category: OnceCell<Arc<CategoryRecord>>,
}

impl BlogService {
    pub fn category_entries<'a>(
        &'a self,
        request: &'a BlogRequest,
        slug: impl Into<String>,
    ) -> CategoryEntries<'a> {
        CategoryEntries {
            service: self,
            request,
            slug: slug.into(),
            category: OnceCell::new(),
        }
    }
}

impl CategoryEntries<'_> {
    /// The category whose slug in the active language matches the path.
    pub async fn category(&self) -> Result<Arc<CategoryRecord>, BlogError> {
        self.category
            .get_or_try_init(|| async {
                let language = &self.request.language;
                self.service
                    .categories
                    .find_by_slug(language, &self.slug)
                    .await?
                    .map(Arc::new)
                    .ok_or_else(|| BlogError::CategoryNotFound {
                        language: language.to_string(),
                        slug: self.slug.clone(),
                    })
            })
            .await
            .cloned()
    }

    #[instrument(skip(self), fields(language = %self.request.language, slug = %self.slug))]
    pub async fn render(&self) -> Result<PostListContext, BlogError> {
        let category = self.category().await?;

        let mut query = self.service.scope(self.request).base_query();
        query.category_id = Some(category.id);

        let path = self.service.urls(self.request).category(&category.slug);
        let view = CategoryView {
            name: category.name.clone(),
            slug: category.slug.clone(),
            url: path.clone(),
        };

        self.service
            .list_context(
                self.request,
                query,
                path,
                ListExtras {
                    heading: format!("Category: {}", category.name),
                    category: Some(view),
                    ..ListExtras::default()
                },
            )
            .await
    }
}
