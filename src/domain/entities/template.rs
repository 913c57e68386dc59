use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::services::change_summary::summarize;
use crate::domain::services::diff::{diff, diff_stats, DiffSegment};
use crate::domain::services::template_renderer::RenderMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed id of the singleton current template row
pub const TEMPLATE_ID: &str = "global";

/// Hardcoded commercial offer template served until someone saves a custom one
pub const DEFAULT_TEMPLATE_HTML: &str = include_str!("../../../assets/default_template.html");

/// The shared, current document template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub html_content: String,
    pub version: i64,
    pub updated_at: String, // ISO 8601
    pub updated_by: String,
    pub updated_by_name: String,
}

impl Template {
    /// First-ever save of the singleton
    pub fn initial(html_content: String, updated_by: String, updated_by_name: String) -> Self {
        Self {
            id: TEMPLATE_ID.to_string(),
            html_content,
            version: 1,
            updated_at: chrono::Utc::now().to_rfc3339(),
            updated_by,
            updated_by_name,
        }
    }

    /// Next revision of an existing template, one version ahead
    pub fn next_revision(
        &self,
        html_content: String,
        updated_by: String,
        updated_by_name: String,
    ) -> Self {
        Self {
            id: self.id.clone(),
            html_content,
            version: self.version + 1,
            updated_at: chrono::Utc::now().to_rfc3339(),
            updated_by,
            updated_by_name,
        }
    }

    pub fn is_default(&self) -> bool {
        self.html_content == DEFAULT_TEMPLATE_HTML
    }
}

/// Immutable snapshot of the template as it was before a save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub id: String,
    pub version_number: i64,
    pub html_content: String,
    pub created_at: String, // ISO 8601
    pub created_by: String,
    pub created_by_name: String,
    pub change_description: String,
}

impl TemplateVersion {
    /// Capture `previous` before it gets overwritten
    pub fn snapshot_of(previous: &Template, change_description: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            version_number: previous.version,
            html_content: previous.html_content.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            created_by: previous.updated_by.clone(),
            created_by_name: previous.updated_by_name.clone(),
            change_description,
        }
    }
}

/// Version list entry without the HTML body
#[derive(Debug, Serialize)]
pub struct TemplateVersionSummary {
    pub id: String,
    pub version_number: i64,
    pub created_at: String,
    pub created_by: String,
    pub created_by_name: String,
    pub change_description: String,
}

impl From<TemplateVersion> for TemplateVersionSummary {
    fn from(v: TemplateVersion) -> Self {
        Self {
            id: v.id,
            version_number: v.version_number,
            created_at: v.created_at,
            created_by: v.created_by,
            created_by_name: v.created_by_name,
            change_description: v.change_description,
        }
    }
}

// DTOs for API

#[derive(Debug, Serialize)]
pub struct CurrentTemplateResponse {
    pub html_content: String,
    pub version: Option<i64>,
    pub updated_at: Option<String>,
    pub updated_by: Option<String>,
    pub updated_by_name: Option<String>,
    pub is_customized: bool,
}

impl CurrentTemplateResponse {
    pub fn from_stored(template: Option<Template>) -> Self {
        match template {
            Some(t) => Self {
                is_customized: !t.is_default(),
                html_content: t.html_content,
                version: Some(t.version),
                updated_at: Some(t.updated_at),
                updated_by: Some(t.updated_by),
                updated_by_name: Some(t.updated_by_name),
            },
            None => Self {
                html_content: DEFAULT_TEMPLATE_HTML.to_string(),
                version: None,
                updated_at: None,
                updated_by: None,
                updated_by_name: None,
                is_customized: false,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveTemplateRequest {
    pub html_content: String,
    pub author_id: String,
    pub author_name: String,
    pub change_description: Option<String>,
}

impl SaveTemplateRequest {
    pub fn validate(&self) -> DomainResult<()> {
        if self.html_content.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Template content cannot be empty".to_string(),
            ));
        }
        validate_author(&self.author_id)
    }
}

/// Author identity for reset and revert
#[derive(Debug, Deserialize)]
pub struct TemplateAuthorRequest {
    pub author_id: String,
    pub author_name: String,
}

impl TemplateAuthorRequest {
    pub fn validate(&self) -> DomainResult<()> {
        validate_author(&self.author_id)
    }
}

fn validate_author(author_id: &str) -> DomainResult<()> {
    if author_id.trim().is_empty() {
        return Err(DomainError::ValidationError(
            "Author id is required".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct VersionListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RenderTemplateRequest {
    /// Renders the current template when absent
    pub html_content: Option<String>,
    #[serde(default)]
    pub variables: HashMap<String, String>,
    #[serde(default)]
    pub mode: RenderMode,
}

#[derive(Debug, Serialize)]
pub struct RenderTemplateResponse {
    pub html: String,
    pub total_pages: usize,
    pub unfilled_keys: Vec<String>,
    pub variable_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiffTemplatesRequest {
    pub old_html: String,
    pub new_html: String,
}

#[derive(Debug, Serialize)]
pub struct TemplateDiffResponse {
    pub summary: String,
    pub words_added: usize,
    pub words_removed: usize,
    pub segments: Vec<DiffSegment>,
}

impl TemplateDiffResponse {
    pub fn between(old_html: &str, new_html: &str) -> Self {
        let segments = diff(old_html, new_html);
        let (words_added, words_removed) = diff_stats(&segments);
        Self {
            summary: summarize(old_html, new_html),
            words_added,
            words_removed,
            segments,
        }
    }
}
