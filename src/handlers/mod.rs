pub mod admin;
pub mod auth;
pub mod certifications;
pub mod feedback;
pub mod info_docs;
pub mod notifications;
pub mod park_guides;
pub mod parks;
pub mod payments;
pub mod plants;
pub mod progress;
pub mod quizzes;
pub mod training_modules;
pub mod users;
