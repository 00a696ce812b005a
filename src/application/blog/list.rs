use tracing::instrument;

use super::{BlogError, BlogRequest, BlogService, ListExtras};
use crate::presentation::views::PostListContext;

impl BlogService {
    /// Newest posts visible in the active language.
    #[instrument(skip(self, request), fields(language = %request.language))]
    pub async fn post_list(&self, request: &BlogRequest) -> Result<PostListContext, BlogError> {
        let query = self.scope(request).base_query();
        let path = self.urls(request).post_list();

        self.list_context(
            request,
            query,
            path,
            ListExtras {
                heading: "Latest posts".to_string(),
                ..ListExtras::default()
            },
        )
        .await
    }
}
