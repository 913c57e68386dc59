use std::collections::HashMap;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use traidenis::application::services::{TemplateService, DEFAULT_MAX_VERSIONS};
use traidenis::infrastructure::persistence::Database;
use uuid::Uuid;

/// Sqlite file database that deletes itself (and its WAL files) on drop
pub struct TestDb {
    db: Database,
    path: PathBuf,
}

impl TestDb {
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn files(&self) -> [PathBuf; 3] {
        let with_suffix = |suffix: &str| {
            let mut name = self.path.clone().into_os_string();
            name.push(suffix);
            PathBuf::from(name)
        };
        [self.path.clone(), with_suffix("-wal"), with_suffix("-shm")]
    }
}

impl Deref for TestDb {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.db
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        for file in self.files() {
            let _ = std::fs::remove_file(file);
        }
    }
}

pub async fn setup_test_db() -> TestDb {
    // Unique file per test so tests can run in parallel
    let path = std::env::temp_dir().join(format!("traidenis_test_{}.db", Uuid::new_v4()));
    let db_url = format!("sqlite://{}?mode=rwc", path.display());

    let db = Database::connect(&db_url)
        .await
        .expect("Failed to connect to test database");

    db.run_migrations()
        .await
        .expect("Failed to run migrations on test database");

    TestDb { db, path }
}

pub async fn setup_template_service() -> (TemplateService, TestDb) {
    let test_db = setup_test_db().await;
    let service = TemplateService::new(Arc::new(test_db.clone()), DEFAULT_MAX_VERSIONS);
    (service, test_db)
}

pub fn variables(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
