//! # Lattes Common Library
//!
//! Shared code for the Lattes curriculum processor including:
//! - Curriculum XML extraction
//! - Domain models (researchers, publications)
//! - Database schema initialization
//! - Configuration loading and root folder resolution

pub mod config;
pub mod db;
pub mod error;
pub mod extractor;
pub mod models;

pub use error::{Error, Result};
pub use extractor::{extract_curriculum, ExtractError};
pub use models::{CurriculumRecord, PublicationHit, Researcher};
