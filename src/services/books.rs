//! Book operations on top of the books repository

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookChanges, NewBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All books in insertion order
    pub fn list_all(&self) -> AppResult<Vec<Book>> {
        self.repository.books.read(|books| books.to_vec())
    }

    pub fn count(&self) -> AppResult<usize> {
        self.repository.books.len()
    }

    /// Get a book by its id; ids that are not UUIDs simply match nothing
    pub fn get_by_id(&self, id: &str) -> AppResult<Book> {
        let book_id = parse_id(id)?;
        self.repository
            .books
            .read(|books| books.iter().find(|b| b.id == book_id).cloned())?
            .ok_or_else(|| not_found(id))
    }

    /// Store a new book and flush
    pub fn create(&self, fields: NewBook) -> AppResult<Book> {
        let book = Book::new(fields, Utc::now());

        let store = &self.repository.books;
        store.write(|books| {
            books.push(book.clone());
            store.save(books);
        })?;

        tracing::info!("Created book {} ({})", book.id, book.title);
        Ok(book)
    }

    /// Merge `changes` into an existing book and flush
    pub fn update(&self, id: &str, changes: BookChanges) -> AppResult<Book> {
        let book_id = parse_id(id)?;

        let store = &self.repository.books;
        let updated = store.write(|books| {
            let book = books.iter_mut().find(|b| b.id == book_id)?;
            book.apply(changes, Utc::now());
            let updated = book.clone();
            store.save(books);
            Some(updated)
        })?;

        let updated = updated.ok_or_else(|| not_found(id))?;
        tracing::info!("Updated book {}", updated.id);
        Ok(updated)
    }

    /// Remove a book and flush. Returns `false` when no book has this id.
    pub fn delete(&self, id: &str) -> AppResult<bool> {
        let Ok(book_id) = Uuid::parse_str(id) else {
            return Ok(false);
        };

        let store = &self.repository.books;
        let removed = store.write(|books| {
            let Some(index) = books.iter().position(|b| b.id == book_id) else {
                return false;
            };
            books.remove(index);
            store.save(books);
            true
        })?;

        if removed {
            tracing::info!("Deleted book {}", book_id);
        }
        Ok(removed)
    }
}

fn parse_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| not_found(id))
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}
