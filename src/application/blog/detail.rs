use tracing::instrument;

use super::{BlogError, BlogRequest, BlogService, tag_badges};
use crate::domain::posts;
use crate::presentation::views::{AuthorLink, PostDetailContext};
use crate::util::timezone;

/// Fetch one more than we accept so duplicates surface as an error.
const SLUG_LOOKUP_LIMIT: u32 = 2;

impl BlogService {
    /// The single visible post whose translation slug is `slug`.
    #[instrument(skip(self, request), fields(language = %request.language))]
    pub async fn post_detail(
        &self,
        request: &BlogRequest,
        slug: &str,
    ) -> Result<PostDetailContext, BlogError> {
        let query = self.scope(request).base_query();
        let mut matches = self
            .posts
            .find_by_slug(&query, slug, SLUG_LOOKUP_LIMIT)
            .await?;

        if matches.len() > 1 {
            return Err(BlogError::AmbiguousSlug {
                slug: slug.to_string(),
                count: matches.len(),
            });
        }
        let post = matches
            .pop()
            .ok_or_else(|| BlogError::PostNotFound(slug.to_string()))?;

        let urls = self.urls(request);
        let date = timezone::local_date(post.date_published, self.options.timezone);

        Ok(PostDetailContext {
            title: post.translation.title.clone(),
            slug: post.translation.slug.clone(),
            url: urls.post_detail(&post),
            excerpt: post.translation.abstract_text.clone(),
            body_html: post.translation.body_html.clone(),
            published: posts::format_human_date(date),
            iso_date: posts::format_iso_date(date),
            archive_url: urls.archive(date.year(), Some(u8::from(date.month()))),
            author: post.author.as_ref().map(|author| AuthorLink {
                name: author.display_name(),
                url: urls.author(&author.username),
            }),
            tags: tag_badges(&post, &urls),
            is_draft: !post.publish,
            list_url: urls.post_list(),
        })
    }
}
