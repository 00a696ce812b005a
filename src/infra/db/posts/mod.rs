mod read;
mod types;

use super::PostgresRepositories;
