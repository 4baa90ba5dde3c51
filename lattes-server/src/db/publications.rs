//! Publication persistence

use lattes_common::{PublicationHit, Result};
use sqlx::{SqliteConnection, SqlitePool};

/// Insert a publication unless the (title, researcher) pair already exists
///
/// Returns true when a new row was created.
pub async fn insert_publication_if_absent(
    conn: &mut SqliteConnection,
    title: &str,
    researcher_id: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO publications (title, researcher_id)
        VALUES (?, ?)
        ON CONFLICT (title, researcher_id) DO NOTHING
        "#,
    )
    .bind(title)
    .bind(researcher_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Every publication with its researcher, ordered by researcher name then title
pub async fn list_publications(pool: &SqlitePool) -> Result<Vec<PublicationHit>> {
    let hits = sqlx::query_as::<_, PublicationHit>(
        r#"
        SELECT p.title, r.full_name AS researcher
        FROM publications p
        JOIN researchers r ON p.researcher_id = r.id
        ORDER BY r.full_name, p.title
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(hits)
}

pub async fn count_publications(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM publications")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
