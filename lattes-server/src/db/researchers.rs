//! Researcher persistence

use lattes_common::{Researcher, Result};
use sqlx::{SqliteConnection, SqlitePool};

/// Outcome of [`upsert_researcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResearcherUpsert {
    pub id: i64,
    /// True when this call inserted the row
    pub created: bool,
}

/// Look up a researcher by exact name, inserting it when absent
pub async fn upsert_researcher(
    conn: &mut SqliteConnection,
    full_name: &str,
) -> Result<ResearcherUpsert> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM researchers WHERE full_name = ?")
        .bind(full_name)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(id) = existing {
        return Ok(ResearcherUpsert { id, created: false });
    }

    let id = sqlx::query("INSERT INTO researchers (full_name) VALUES (?)")
        .bind(full_name)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    tracing::debug!(id, full_name, "Inserted researcher");

    Ok(ResearcherUpsert { id, created: true })
}

/// All researchers ordered by name
pub async fn list_researchers(pool: &SqlitePool) -> Result<Vec<Researcher>> {
    let researchers = sqlx::query_as::<_, Researcher>(
        "SELECT id, full_name FROM researchers ORDER BY full_name",
    )
    .fetch_all(pool)
    .await?;

    Ok(researchers)
}

pub async fn count_researchers(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM researchers")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattes_common::db::init_memory_database;

    #[tokio::test]
    async fn test_upsert_researcher_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let first = upsert_researcher(&mut conn, "Ana Silva").await.unwrap();
        let second = upsert_researcher(&mut conn, "Ana Silva").await.unwrap();
        drop(conn);

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.id, second.id);
        assert_eq!(count_researchers(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_researcher_matches_exact_name() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let lower = upsert_researcher(&mut conn, "ana silva").await.unwrap();
        let upper = upsert_researcher(&mut conn, "Ana Silva").await.unwrap();
        drop(conn);

        assert_ne!(lower.id, upper.id);
        assert!(upper.created);
    }

    #[tokio::test]
    async fn test_list_researchers_ordered_by_name() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        for name in ["Carla Dias", "Ana Silva", "Bruno Costa"] {
            upsert_researcher(&mut conn, name).await.unwrap();
        }
        drop(conn);

        let names: Vec<String> = list_researchers(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.full_name)
            .collect();

        assert_eq!(names, vec!["Ana Silva", "Bruno Costa", "Carla Dias"]);
    }
}
