//! Repository layer for database operations

pub mod analyses;
pub mod memos;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub memos: memos::MemosRepository,
    pub users: users::UsersRepository,
    pub analyses: analyses::AnalysesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            memos: memos::MemosRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            analyses: analyses::AnalysesRepository::new(pool.clone()),
            pool,
        }
    }
}
