//! Database access for lattes-server
//!
//! Write operations take a `&mut SqliteConnection` so callers can run them
//! inside one transaction per batch. Reads take the pool.

pub mod publications;
pub mod researchers;
pub mod search;

pub use publications::{count_publications, insert_publication_if_absent, list_publications};
pub use researchers::{count_researchers, list_researchers, upsert_researcher, ResearcherUpsert};
pub use search::{search_by_author, search_by_title, search_researchers};
