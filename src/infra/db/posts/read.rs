use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::{CursorPage, PageRequest, PostCursor};
use crate::application::repos::{PostQuery, PostsRepo, RepoError};
use crate::domain::entities::{PostRecord, TagRecord};

use super::PostgresRepositories;
use super::types::{PostCategoryRow, PostRow, PostTagRow};
use crate::infra::db::map_sqlx_error;

const MAX_PAGE_SIZE: u32 = 100;

impl PostgresRepositories {
    /// Attach tags and category ids to a batch of post rows.
    async fn hydrate_posts(&self, rows: Vec<PostRow>) -> Result<Vec<PostRecord>, RepoError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

        let tag_rows = sqlx::query_as::<_, PostTagRow>(
            "SELECT pt.post_id, tg.id, tg.slug, tg.name \
             FROM blog_post_tags pt \
             INNER JOIN blog_tags tg ON tg.id = pt.tag_id \
             WHERE pt.post_id = ANY($1) \
             ORDER BY tg.name, tg.slug",
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let category_rows = sqlx::query_as::<_, PostCategoryRow>(
            "SELECT post_id, category_id FROM blog_post_categories WHERE post_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut tags: HashMap<Uuid, Vec<TagRecord>> = HashMap::new();
        for row in tag_rows {
            tags.entry(row.post_id).or_default().push(TagRecord::from(row));
        }

        let mut categories: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in category_rows {
            categories.entry(row.post_id).or_default().push(row.category_id);
        }

        rows.into_iter()
            .map(|row| {
                let post_tags = tags.remove(&row.id).unwrap_or_default();
                let post_categories = categories.remove(&row.id).unwrap_or_default();
                row.into_record(post_tags, post_categories)
            })
            .collect()
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        query: &PostQuery,
        page: PageRequest<PostCursor>,
    ) -> Result<CursorPage<PostRecord>, RepoError> {
        let limit = i64::from(page.limit.clamp(1, MAX_PAGE_SIZE));

        let mut qb = Self::post_select(query);
        if let Some(cursor) = page.cursor {
            qb.push(" AND (p.date_published, p.id) < (");
            qb.push_bind(cursor.date_published());
            qb.push(", ");
            qb.push_bind(cursor.id());
            qb.push(")");
        }
        qb.push(" ORDER BY p.date_published DESC, p.id DESC LIMIT ");
        qb.push_bind(limit + 1);

        let mut rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let has_more = (rows.len() as i64) > limit;
        if has_more {
            rows.pop();
        }

        let records = self.hydrate_posts(rows).await?;
        let next_cursor = if has_more {
            records
                .last()
                .map(|record| PostCursor::after(record).encode())
        } else {
            None
        };

        Ok(CursorPage::new(records, next_cursor))
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64, RepoError> {
        let mut qb = Self::post_count(query);
        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn find_by_slug(
        &self,
        query: &PostQuery,
        slug: &str,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::post_select(query);
        qb.push(" AND t.slug = ");
        qb.push_bind(slug.to_string());
        qb.push(" ORDER BY p.date_published DESC, p.id DESC LIMIT ");
        qb.push_bind(i64::from(limit.max(1)));

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        self.hydrate_posts(rows).await
    }
}
