//! Re-exports the shared building blocks of the topic reconciler so the
//! service crate can pull in settings, the topic data model, the error
//! taxonomy and the Kafka admin gateway from a single crate.

pub mod config;
pub mod dto;
pub mod error;
pub mod kafka;
