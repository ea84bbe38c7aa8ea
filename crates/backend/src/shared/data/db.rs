use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use std::path::Path;

/// Подключение к SQLite-файлу (создается при отсутствии)
pub async fn connect(db_file: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Connecting to database: {}", db_url);
    let conn = Database::connect(&db_url).await?;
    Ok(conn)
}

/// Проверить наличие таблицы
pub async fn table_exists(conn: &DatabaseConnection, table: &str) -> anyhow::Result<bool> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type='table' AND name=?;",
            [table.into()],
        ))
        .await?;
    Ok(!rows.is_empty())
}

/// Выполнить DDL без параметров
pub async fn execute_ddl(conn: &DatabaseConnection, sql: &str) -> anyhow::Result<()> {
    conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
        .await?;
    Ok(())
}

/// Путь к временной БД для тестов репозиториев
#[cfg(test)]
pub fn test_db_path() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("uzum-sync-test-{}.db", uuid::Uuid::new_v4()))
}
