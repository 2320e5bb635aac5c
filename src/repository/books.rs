//! Books repository: the in-memory collection and its JSON file

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, LoadError},
    models::book::Book,
};

/// Process-wide book collection, optionally mirrored to a JSON file.
///
/// Every write holds the lock across the mutation and the flush, so the
/// file always reflects one complete operation.
#[derive(Clone)]
pub struct BooksRepository {
    path: Option<PathBuf>,
    books: Arc<RwLock<Vec<Book>>>,
}

impl BooksRepository {
    /// Load the collection from `path`.
    ///
    /// A missing file yields an empty collection. An unreadable or malformed
    /// file is an error the caller must not ignore.
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let books = read_books(&path).map_err(|source| AppError::Load {
            path: path.clone(),
            source,
        })?;

        tracing::info!("Loaded {} books from {}", books.len(), path.display());

        Ok(Self {
            path: Some(path),
            books: Arc::new(RwLock::new(books)),
        })
    }

    /// Collection without a backing file; flushes do nothing
    pub fn in_memory() -> Self {
        Self {
            path: None,
            books: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` against the current collection
    pub fn read<R>(&self, f: impl FnOnce(&[Book]) -> R) -> AppResult<R> {
        let books = self
            .books
            .read()
            .map_err(|_| AppError::Internal("books lock poisoned".to_string()))?;
        Ok(f(&books))
    }

    /// Run `f` with exclusive access to the collection.
    /// `f` decides whether to flush by calling [`BooksRepository::save`].
    pub fn write<R>(&self, f: impl FnOnce(&mut Vec<Book>) -> R) -> AppResult<R> {
        let mut books = self
            .books
            .write()
            .map_err(|_| AppError::Internal("books lock poisoned".to_string()))?;
        Ok(f(&mut books))
    }

    /// Overwrite the backing file with `books`.
    ///
    /// Failures are logged and swallowed: the in-memory collection stays
    /// authoritative until the next successful flush.
    pub fn save(&self, books: &[Book]) {
        let Some(path) = &self.path else {
            return;
        };

        if let Err(e) = write_books(path, books) {
            tracing::error!("Failed to save books to {}: {}", path.display(), e);
        } else {
            tracing::debug!("Saved {} books to {}", books.len(), path.display());
        }
    }

    /// Number of stored books
    pub fn len(&self) -> AppResult<usize> {
        self.read(|books| books.len())
    }

    pub fn is_empty(&self) -> AppResult<bool> {
        self.read(|books| books.is_empty())
    }

    /// Drop every record and flush the empty collection
    pub fn reset(&self) -> AppResult<()> {
        self.write(|books| {
            books.clear();
            self.save(books);
        })
    }
}

fn read_books(path: &Path) -> Result<Vec<Book>, LoadError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!("{} not found, starting with no books", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let books: Vec<Book> = serde_json::from_str(&content)?;

    let mut seen: HashSet<Uuid> = HashSet::with_capacity(books.len());
    for book in &books {
        if !seen.insert(book.id) {
            return Err(LoadError::DuplicateId(book.id));
        }
    }

    Ok(books)
}

fn write_books(path: &Path, books: &[Book]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(books)?;
    fs::write(path, content)
}
