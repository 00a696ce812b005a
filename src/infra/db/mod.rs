//! Postgres-backed repository implementations.

mod categories;
mod posts;
mod users;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{HealthRepo, PostQuery, PostVisibility, RepoError};

const POST_SELECT: &str = "SELECT p.id, p.publish, p.date_published, \
     t.language_code, t.title, t.slug, t.abstract AS abstract_text, t.body_html, \
     u.id AS author_id, u.username AS author_username, \
     u.first_name AS author_first_name, u.last_name AS author_last_name \
     FROM blog_posts p \
     INNER JOIN blog_post_translations t ON t.post_id = p.id AND t.language_code = ";

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    /// Start a post query restricted to the query's language.
    fn post_select(query: &PostQuery) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(POST_SELECT);
        qb.push_bind(query.language.as_str().to_string());
        qb.push(" LEFT JOIN blog_users u ON u.id = p.author_id WHERE 1=1 ");
        Self::apply_post_filter(&mut qb, query);
        qb
    }

    fn post_count(query: &PostQuery) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(
            "SELECT COUNT(*) FROM blog_posts p \
             INNER JOIN blog_post_translations t ON t.post_id = p.id AND t.language_code = ",
        );
        qb.push_bind(query.language.as_str().to_string());
        qb.push(" LEFT JOIN blog_users u ON u.id = p.author_id WHERE 1=1 ");
        Self::apply_post_filter(&mut qb, query);
        qb
    }

    fn apply_post_filter(qb: &mut QueryBuilder<'static, Postgres>, query: &PostQuery) {
        if query.visibility == PostVisibility::PublishedOnly {
            qb.push(" AND p.publish ");
        }

        let timezone = query.timezone.name().to_string();
        if let Some(year) = query.period.year() {
            qb.push(" AND EXTRACT(YEAR FROM p.date_published AT TIME ZONE ");
            qb.push_bind(timezone.clone());
            qb.push(")::int = ");
            qb.push_bind(year);
        }
        if let Some(month) = query.period.month() {
            qb.push(" AND EXTRACT(MONTH FROM p.date_published AT TIME ZONE ");
            qb.push_bind(timezone);
            qb.push(")::int = ");
            qb.push_bind(i32::from(month));
        }

        if let Some(tag) = query.tag.as_ref() {
            qb.push(
                " AND EXISTS (SELECT 1 FROM blog_post_tags pt \
                 INNER JOIN blog_tags tg ON tg.id = pt.tag_id \
                 WHERE pt.post_id = p.id AND tg.slug = ",
            );
            qb.push_bind(tag.clone());
            qb.push(")");
        }

        if let Some(username) = query.author_username.as_ref() {
            qb.push(" AND u.username = ");
            qb.push_bind(username.clone());
        }

        if let Some(category_id) = query.category_id {
            qb.push(
                " AND EXISTS (SELECT 1 FROM blog_post_categories pc \
                 WHERE pc.post_id = p.id AND pc.category_id = ",
            );
            qb.push_bind(category_id);
            qb.push(")");
        }
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}

#[async_trait]
impl HealthRepo for PostgresRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}
