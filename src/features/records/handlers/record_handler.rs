use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::records::dtos::{RecordFormDto, UploadedFile};
use crate::features::records::services::{Outcome, RecordService};
use crate::shared::constants::MAX_UPLOAD_SIZE;
use crate::shared::templates::render_template;

/// Query params of the list page
#[derive(Debug, Default, Deserialize)]
pub struct ListRecordsQuery {
    /// Kept as text so a malformed value can be redirected instead of
    /// rejected
    pub page: Option<String>,
    pub q: Option<String>,
    pub notice: Option<String>,
}

/// Turn a workflow outcome into an HTTP response
fn respond(outcome: Outcome) -> Result<Response> {
    let response = match outcome {
        Outcome::List(view) => Html(render_template("list.html", &view)?).into_response(),
        Outcome::Form(view) => Html(render_template("form.html", &view)?).into_response(),
        Outcome::Invalid(view) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(render_template("form.html", &view)?),
        )
            .into_response(),
        Outcome::Redirect(location) => Redirect::to(&location).into_response(),
        Outcome::Unavailable(view) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(render_template("unavailable.html", &view)?),
        )
            .into_response(),
    };
    Ok(response)
}

/// Collect a submitted record form.
///
/// A body cut off by the request size limit is not an error: the parts read
/// so far are kept and the form is flagged `too_large`, so it comes back
/// with a field error instead of a bare error page.
async fn read_form(multipart: Multipart) -> Result<RecordFormDto> {
    let mut form = RecordFormDto::default();

    match read_parts(multipart, &mut form).await {
        Ok(()) => {}
        Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            debug!("Form body exceeded the size limit: {}", e);
            form.too_large = true;
        }
        Err(e) => {
            debug!("Failed to read multipart field: {}", e);
            return Err(AppError::BadRequest(format!(
                "Failed to read multipart data: {}",
                e
            )));
        }
    }

    Ok(form)
}

/// Hobbies arrive as one part per checked box. A file part without a file
/// name is an untouched file input and counts as no upload.
async fn read_parts(
    mut multipart: Multipart,
    form: &mut RecordFormDto,
) -> std::result::Result<(), MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "file" {
            let file_name = field.file_name().unwrap_or("").to_string();
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let data = read_upload(field).await?;

            if !file_name.is_empty() {
                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            continue;
        }

        let text = field.text().await?;

        match field_name.as_str() {
            "name" => form.name = text,
            "email" => form.email = text,
            "password" => form.password = text,
            "gender" => form.gender = text,
            "dob" => form.dob = text,
            "country" => form.country = text,
            "hobbies" => form.hobbies.push(text),
            "message" => form.message = text,
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }

    Ok(())
}

/// Drain a file part, buffering at most one byte more than an upload may
/// hold; that is enough for the size check to reject it.
async fn read_upload(mut field: Field<'_>) -> std::result::Result<Vec<u8>, MultipartError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        let room = (MAX_UPLOAD_SIZE + 1).saturating_sub(data.len());
        data.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
    Ok(data)
}

pub async fn list_records(
    State(service): State<Arc<RecordService>>,
    Query(query): Query<ListRecordsQuery>,
) -> Result<Response> {
    let outcome = service
        .list(query.page.as_deref(), query.q.as_deref(), query.notice)
        .await?;
    respond(outcome)
}

pub async fn show_add_form(State(service): State<Arc<RecordService>>) -> Result<Response> {
    respond(service.add_form())
}

pub async fn submit_add_form(
    State(service): State<Arc<RecordService>>,
    multipart: Multipart,
) -> Result<Response> {
    let form = read_form(multipart).await?;
    respond(service.add(form).await?)
}

pub async fn show_edit_form(
    State(service): State<Arc<RecordService>>,
    Path(id): Path<String>,
) -> Result<Response> {
    respond(service.edit_form(&id).await?)
}

pub async fn submit_edit_form(
    State(service): State<Arc<RecordService>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let form = read_form(multipart).await?;
    respond(service.edit(&id, form).await?)
}

pub async fn delete_record(
    State(service): State<Arc<RecordService>>,
    Path(id): Path<String>,
) -> Result<Response> {
    respond(service.delete(&id).await?)
}
