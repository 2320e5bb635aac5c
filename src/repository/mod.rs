//! Repository layer for book storage

pub mod books;

use crate::{config::StorageConfig, error::AppResult};

/// Main repository struct holding every store
#[derive(Clone)]
pub struct Repository {
    pub books: books::BooksRepository,
}

impl Repository {
    /// Create a repository around an already opened books store
    pub fn new(books: books::BooksRepository) -> Self {
        Self { books }
    }

    /// Open the stores described by the storage configuration
    pub fn open(config: &StorageConfig) -> AppResult<Self> {
        let books = if config.in_memory {
            tracing::info!("Using in-memory book storage");
            books::BooksRepository::in_memory()
        } else {
            books::BooksRepository::load(&config.path)?
        };
        Ok(Self::new(books))
    }
}
