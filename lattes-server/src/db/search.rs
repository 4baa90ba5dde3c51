//! Case-insensitive substring search over titles and researcher names
//!
//! Queries are matched by containment only: LIKE wildcards in the user's
//! text are escaped so `%` and `_` match literally. Case folding follows
//! SQLite's `LOWER()`, which covers ASCII letters.

use lattes_common::{PublicationHit, Researcher, Result};
use sqlx::SqlitePool;

/// Wrap `query` as a `%...%` LIKE pattern, escaping `\`, `%` and `_`
pub fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Publications whose title contains `query`, in insertion order
pub async fn search_by_title(pool: &SqlitePool, query: &str) -> Result<Vec<PublicationHit>> {
    let hits = sqlx::query_as::<_, PublicationHit>(
        r#"
        SELECT p.title, r.full_name AS researcher
        FROM publications p
        JOIN researchers r ON p.researcher_id = r.id
        WHERE LOWER(p.title) LIKE LOWER(?) ESCAPE '\'
        ORDER BY p.id
        "#,
    )
    .bind(contains_pattern(query))
    .fetch_all(pool)
    .await?;

    Ok(hits)
}

/// Publications of researchers whose name contains `query`,
/// ordered by researcher name then title
pub async fn search_by_author(pool: &SqlitePool, query: &str) -> Result<Vec<PublicationHit>> {
    let hits = sqlx::query_as::<_, PublicationHit>(
        r#"
        SELECT p.title, r.full_name AS researcher
        FROM publications p
        JOIN researchers r ON p.researcher_id = r.id
        WHERE LOWER(r.full_name) LIKE LOWER(?) ESCAPE '\'
        ORDER BY r.full_name, p.title
        "#,
    )
    .bind(contains_pattern(query))
    .fetch_all(pool)
    .await?;

    Ok(hits)
}

/// Researchers whose name contains `query`, ordered by name
pub async fn search_researchers(pool: &SqlitePool, query: &str) -> Result<Vec<Researcher>> {
    let researchers = sqlx::query_as::<_, Researcher>(
        r#"
        SELECT id, full_name
        FROM researchers
        WHERE LOWER(full_name) LIKE LOWER(?) ESCAPE '\'
        ORDER BY full_name
        "#,
    )
    .bind(contains_pattern(query))
    .fetch_all(pool)
    .await?;

    Ok(researchers)
}
