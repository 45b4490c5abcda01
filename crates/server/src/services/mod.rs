//! Business logic that spans several repositories.

pub mod auth;
pub mod seeder;
