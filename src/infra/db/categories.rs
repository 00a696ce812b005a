use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{CategoriesRepo, RepoError};
use crate::domain::entities::CategoryRecord;
use crate::domain::types::LanguageCode;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
}

#[async_trait]
impl CategoriesRepo for PostgresRepositories {
    async fn find_by_slug(
        &self,
        language: &LanguageCode,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT c.id, ct.name, ct.slug \
             FROM blog_categories c \
             INNER JOIN blog_category_translations ct ON ct.category_id = c.id \
             WHERE ct.language_code = $1 AND ct.slug = $2",
        )
        .bind(language.as_str())
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| CategoryRecord {
            id: row.id,
            language: language.clone(),
            name: row.name,
            slug: row.slug,
        }))
    }
}
