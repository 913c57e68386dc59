use crate::domain::entities::{Template, TemplateVersion, TEMPLATE_ID};
use crate::domain::ports::template_repository::TemplateRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::Row;

fn row_to_template(row: &AnyRow) -> ApiResult<Template> {
    Ok(Template {
        id: row.try_get("id")?,
        html_content: row.try_get("html_content")?,
        version: row.try_get("version")?,
        updated_at: row.try_get("updated_at")?,
        updated_by: row.try_get("updated_by")?,
        updated_by_name: row.try_get("updated_by_name")?,
    })
}

fn row_to_version(row: &AnyRow) -> ApiResult<TemplateVersion> {
    Ok(TemplateVersion {
        id: row.try_get("id")?,
        version_number: row.try_get("version_number")?,
        html_content: row.try_get("html_content")?,
        created_at: row.try_get("created_at")?,
        created_by: row.try_get("created_by")?,
        created_by_name: row.try_get("created_by_name")?,
        change_description: row.try_get("change_description")?,
    })
}

#[async_trait]
impl TemplateRepository for Database {
    async fn get_current_template(&self) -> ApiResult<Option<Template>> {
        let row = sqlx::query(
            "SELECT id, html_content, version, updated_at, updated_by, updated_by_name
             FROM document_templates
             WHERE id = ?",
        )
        .bind(TEMPLATE_ID)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_template).transpose()
    }

    async fn commit_template_save(
        &self,
        expected_version: Option<i64>,
        snapshot: Option<&TemplateVersion>,
        template: &Template,
    ) -> ApiResult<bool> {
        let mut tx = self.pool.begin().await?;

        if let Some(snapshot) = snapshot {
            sqlx::query(
                "INSERT INTO document_template_versions
                 (id, version_number, html_content, created_at, created_by, created_by_name, change_description)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&snapshot.id)
            .bind(snapshot.version_number)
            .bind(&snapshot.html_content)
            .bind(&snapshot.created_at)
            .bind(&snapshot.created_by)
            .bind(&snapshot.created_by_name)
            .bind(&snapshot.change_description)
            .execute(&mut *tx)
            .await?;
        }

        let result = match expected_version {
            Some(expected) => {
                sqlx::query(
                    "UPDATE document_templates
                     SET html_content = ?, version = ?, updated_at = ?, updated_by = ?, updated_by_name = ?
                     WHERE id = ? AND version = ?",
                )
                .bind(&template.html_content)
                .bind(template.version)
                .bind(&template.updated_at)
                .bind(&template.updated_by)
                .bind(&template.updated_by_name)
                .bind(&template.id)
                .bind(expected)
                .execute(&mut *tx)
                .await?
            }
            None => {
                sqlx::query(
                    "INSERT INTO document_templates
                     (id, html_content, version, updated_at, updated_by, updated_by_name)
                     VALUES (?, ?, ?, ?, ?, ?)
                     ON CONFLICT(id) DO NOTHING",
                )
                .bind(&template.id)
                .bind(&template.html_content)
                .bind(template.version)
                .bind(&template.updated_at)
                .bind(&template.updated_by)
                .bind(&template.updated_by_name)
                .execute(&mut *tx)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            // Stale version: discard the snapshot as well
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn list_template_versions(&self, limit: i64) -> ApiResult<Vec<TemplateVersion>> {
        let rows = sqlx::query(
            "SELECT id, version_number, html_content, created_at, created_by, created_by_name, change_description
             FROM document_template_versions
             ORDER BY version_number DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_version).collect()
    }

    async fn get_template_version(&self, id: &str) -> ApiResult<Option<TemplateVersion>> {
        let row = sqlx::query(
            "SELECT id, version_number, html_content, created_at, created_by, created_by_name, change_description
             FROM document_template_versions
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_version).transpose()
    }

    async fn prune_template_versions(&self, keep: i64) -> ApiResult<u64> {
        let rows = sqlx::query(
            "SELECT id FROM document_template_versions ORDER BY version_number DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let stale: Vec<String> = rows
            .iter()
            .skip(keep.max(0) as usize)
            .map(|row| row.try_get("id"))
            .collect::<Result<_, _>>()?;

        if stale.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;
        for id in &stale {
            deleted += sqlx::query("DELETE FROM document_template_versions WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;

        Ok(deleted)
    }
}
