use crate::{
    application::services::DEFAULT_MAX_VERSIONS,
    domain::entities::*,
    domain::services::{extract_variable_keys, render_document, sanitize_html},
    infrastructure::http::middleware::{ApiResult, AppState},
    infrastructure::observability::TEMPLATE_RENDERS_TOTAL,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};

pub async fn get_current_template(
    State(state): State<AppState>,
) -> ApiResult<Json<CurrentTemplateResponse>> {
    // An unreachable store reads as "never saved": the default is served
    let template = match state.template_service.get().await {
        Ok(template) => template,
        Err(e) => {
            tracing::warn!("Serving default template, store unavailable: {}", e);
            None
        }
    };
    Ok(Json(CurrentTemplateResponse::from_stored(template)))
}

pub async fn save_template(
    State(state): State<AppState>,
    Json(request): Json<SaveTemplateRequest>,
) -> ApiResult<Json<Template>> {
    request.validate()?;

    let template = state
        .template_cache
        .persist(
            &state.template_service,
            &request.html_content,
            &request.author_id,
            &request.author_name,
            request.change_description.as_deref(),
        )
        .await?;
    Ok(Json(template))
}

pub async fn reset_template(
    State(state): State<AppState>,
    Json(request): Json<TemplateAuthorRequest>,
) -> ApiResult<Json<Template>> {
    request.validate()?;

    let template = state
        .template_service
        .reset(&request.author_id, &request.author_name)
        .await?;
    state.template_cache.confirm(&template);
    Ok(Json(template))
}

pub async fn list_versions(
    State(state): State<AppState>,
    Query(params): Query<VersionListQuery>,
) -> ApiResult<Json<Vec<TemplateVersionSummary>>> {
    let limit = params.limit.unwrap_or(DEFAULT_MAX_VERSIONS as i64);
    let versions = state.template_service.list_versions(limit).await?;
    let responses = versions
        .into_iter()
        .map(TemplateVersionSummary::from)
        .collect();
    Ok(Json(responses))
}

pub async fn get_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TemplateVersion>> {
    let version = state.template_service.get_version(&id).await?;
    Ok(Json(version))
}

pub async fn diff_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TemplateDiffResponse>> {
    let report = state.template_service.compare_with_current(&id).await?;
    Ok(Json(report))
}

pub async fn revert_to_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TemplateAuthorRequest>,
) -> ApiResult<Json<Template>> {
    request.validate()?;

    let template = state
        .template_service
        .revert_to(&id, &request.author_id, &request.author_name)
        .await?;
    state.template_cache.confirm(&template);
    Ok(Json(template))
}

/// Render the supplied HTML, or the cached current template
pub async fn render_template(
    State(state): State<AppState>,
    Json(request): Json<RenderTemplateRequest>,
) -> ApiResult<Json<RenderTemplateResponse>> {
    let source = request
        .html_content
        .unwrap_or_else(|| state.template_cache.get());

    let document = render_document(&source, &request.variables, request.mode);
    metrics::counter!(TEMPLATE_RENDERS_TOTAL, "mode" => request.mode.as_str()).increment(1);

    Ok(Json(RenderTemplateResponse {
        html: sanitize_html(&document.html),
        total_pages: document.total_pages,
        unfilled_keys: document.unfilled_keys,
        variable_keys: extract_variable_keys(&source).into_iter().collect(),
    }))
}

pub async fn diff_templates(
    Json(request): Json<DiffTemplatesRequest>,
) -> ApiResult<Json<TemplateDiffResponse>> {
    Ok(Json(TemplateDiffResponse::between(
        &request.old_html,
        &request.new_html,
    )))
}
