use tracing::instrument;

use super::{BlogError, BlogRequest, BlogService, ListExtras};
use crate::presentation::views::{AuthorLink, PostListContext};

impl BlogService {
    /// Posts written by `username`.
    ///
    /// The identity must exist; an unknown username is not an empty list.
    #[instrument(skip(self, request), fields(language = %request.language))]
    pub async fn author_entries(
        &self,
        request: &BlogRequest,
        username: &str,
    ) -> Result<PostListContext, BlogError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| BlogError::AuthorNotFound(username.to_string()))?;

        let mut query = self.scope(request).base_query();
        query.author_username = Some(author.username.clone());

        let urls = self.urls(request);
        let path = urls.author(&author.username);
        let name = author.display_name();

        self.list_context(
            request,
            query,
            path.clone(),
            ListExtras {
                heading: format!("Posts by {name}"),
                author: Some(AuthorLink { name, url: path }),
                ..ListExtras::default()
            },
        )
        .await
    }
}
