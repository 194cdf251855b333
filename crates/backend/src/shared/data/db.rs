use anyhow::Context;
use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Minimal schema bootstrap: (table, DDL)
const SCHEMA: [(&str, &str); 5] = [
    (
        "sys_settings",
        r#"
        CREATE TABLE IF NOT EXISTS sys_settings (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ),
    (
        "sys_users",
        r#"
        CREATE TABLE IF NOT EXISTS sys_users (
            id TEXT PRIMARY KEY NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 1,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_login_at TEXT
        );
        "#,
    ),
    (
        "sys_user_courses",
        r#"
        CREATE TABLE IF NOT EXISTS sys_user_courses (
            user_id TEXT NOT NULL,
            course_id INTEGER NOT NULL,
            purchased_at TEXT NOT NULL,
            PRIMARY KEY (user_id, course_id)
        );
        "#,
    ),
    (
        "a001_category",
        r#"
        CREATE TABLE IF NOT EXISTS a001_category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            parent_category_id INTEGER NOT NULL DEFAULT 0
        );
        "#,
    ),
    (
        "a002_course",
        r#"
        CREATE TABLE IF NOT EXISTS a002_course (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            price REAL NOT NULL DEFAULT 0,
            languages TEXT NOT NULL DEFAULT '[]',
            subtitles TEXT NOT NULL DEFAULT '[]',
            category_ids TEXT NOT NULL DEFAULT '[]',
            authors TEXT NOT NULL DEFAULT '[]',
            course_description TEXT,
            comments TEXT NOT NULL DEFAULT '[]',
            avg_rate REAL NOT NULL DEFAULT 0,
            rates_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT,
            last_update TEXT,
            version INTEGER NOT NULL DEFAULT 0
        );
        "#,
    ),
];

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let conn = open_database(db_path.unwrap_or("target/db/courses.db")).await?;
    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

/// Open (or create) the SQLite file and make sure every table exists
pub async fn open_database(db_file: &str) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url)
        .await
        .with_context(|| format!("Failed to open database {}", db_url))?;

    for (table, ddl) in SCHEMA {
        tracing::debug!("Ensuring table {}", table);
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            ddl.to_string(),
        ))
        .await
        .with_context(|| format!("Failed to create table {}", table))?;
    }
    Ok(conn)
}

pub fn get_connection() -> anyhow::Result<&'static DatabaseConnection> {
    DB_CONN
        .get()
        .ok_or_else(|| anyhow::anyhow!("Database connection has not been initialized"))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tempfile::TempDir;

    /// Отдельная база во временном каталоге; каталог живёт, пока жив `TempDir`
    pub async fn temp_database() -> (TempDir, DatabaseConnection) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("courses.db");
        let conn = open_database(&path.to_string_lossy()).await.unwrap();
        (dir, conn)
    }
}
