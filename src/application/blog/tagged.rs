use tracing::instrument;

use super::{BlogError, BlogRequest, BlogService, ListExtras};
use crate::presentation::views::PostListContext;

impl BlogService {
    /// Posts carrying the tag `tag`. Unknown tags simply match nothing.
    #[instrument(skip(self, request), fields(language = %request.language))]
    pub async fn tagged_list(
        &self,
        request: &BlogRequest,
        tag: &str,
    ) -> Result<PostListContext, BlogError> {
        let mut query = self.scope(request).base_query();
        query.tag = Some(tag.to_string());

        let path = self.urls(request).tagged(tag);

        self.list_context(
            request,
            query,
            path,
            ListExtras {
                heading: format!("Tagged: {tag}"),
                tagged_entries: Some(tag.to_string()),
                ..ListExtras::default()
            },
        )
        .await
    }
}
