#![forbid(unsafe_code)]

//! Storage contracts for the learning-session engine, plus an in-memory
//! implementation for tests and prototyping. Real backends live behind
//! the same traits.

pub mod repository;

pub use repository::{
    AttemptStore, CourseRepository, CourseReset, EnrollmentProgress, InMemoryStore, ProgressStore,
    Storage, StorageError,
};
