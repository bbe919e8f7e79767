//! Repositories: one zero-sized struct per table with associated async fns.

pub mod category_repo;
pub mod note_repo;

pub use category_repo::CategoryRepo;
pub use note_repo::NoteRepo;
