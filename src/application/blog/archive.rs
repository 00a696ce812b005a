use tracing::instrument;

use super::{BlogError, BlogRequest, BlogService, ListExtras};
use crate::domain::posts::{self, ArchivePeriod};
use crate::presentation::views::{ArchiveView, PostListContext};

impl BlogService {
    /// Posts published in the given year and, optionally, month.
    ///
    /// Dates are compared in the blog's timezone. Empty periods and periods
    /// in the future render an empty list.
    #[instrument(skip(self, request), fields(language = %request.language))]
    pub async fn post_archive(
        &self,
        request: &BlogRequest,
        year: Option<&str>,
        month: Option<&str>,
    ) -> Result<PostListContext, BlogError> {
        let period = ArchivePeriod::parse(year, month)?;

        let mut query = self.scope(request).base_query();
        query.period = period;

        let urls = self.urls(request);
        let path = match period.year() {
            Some(year) => urls.archive(year, period.month()),
            None => urls.post_list(),
        };

        let heading = period
            .label()
            .map(|label| format!("Archive: {label}"))
            .unwrap_or_else(|| "Archive".to_string());

        let archive = ArchiveView {
            year: period.year(),
            month: period.month(),
            label: period.label(),
            archive_date: period.archive_date().map(posts::format_iso_date),
        };

        self.list_context(
            request,
            query,
            path,
            ListExtras {
                heading,
                archive: Some(archive),
                ..ListExtras::default()
            },
        )
        .await
    }
}
