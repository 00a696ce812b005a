use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::domain::entities::{PostRecord, PostTranslationRecord, TagRecord, UserRecord};
use crate::domain::types::LanguageCode;

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: Uuid,
    pub(crate) publish: bool,
    pub(crate) date_published: OffsetDateTime,
    pub(crate) language_code: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) abstract_text: String,
    pub(crate) body_html: String,
    pub(crate) author_id: Option<Uuid>,
    pub(crate) author_username: Option<String>,
    pub(crate) author_first_name: Option<String>,
    pub(crate) author_last_name: Option<String>,
}

impl PostRow {
    pub(crate) fn into_record(
        self,
        tags: Vec<TagRecord>,
        category_ids: Vec<Uuid>,
    ) -> Result<PostRecord, RepoError> {
        let language =
            LanguageCode::parse(&self.language_code).map_err(|err| RepoError::InvalidInput {
                message: format!("stored translation of post {}: {err}", self.id),
            })?;

        let author = match (self.author_id, self.author_username) {
            (Some(id), Some(username)) => Some(UserRecord {
                id,
                username,
                first_name: self.author_first_name.unwrap_or_default(),
                last_name: self.author_last_name.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(PostRecord {
            id: self.id,
            publish: self.publish,
            date_published: self.date_published,
            author,
            translation: PostTranslationRecord {
                language,
                title: self.title,
                slug: self.slug,
                abstract_text: self.abstract_text,
                body_html: self.body_html,
            },
            tags,
            category_ids,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostTagRow {
    pub(crate) post_id: Uuid,
    pub(crate) id: Uuid,
    pub(crate) slug: String,
    pub(crate) name: String,
}

impl From<PostTagRow> for TagRecord {
    fn from(row: PostTagRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostCategoryRow {
    pub(crate) post_id: Uuid,
    pub(crate) category_id: Uuid,
}
