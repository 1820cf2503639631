use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpRequest};
use futures_util::{StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::core::config::AttachmentConfig;
use crate::core::AppError;
use crate::models::issues::{CreateIssueRequest, StoredAttachment, UpdateIssueRequest};

const MAX_JSON_BODY: usize = 256 * 1024;
const ATTACHMENT_FOLDER: &str = "issue_attachments";

/// An uploaded file held in memory until the request validates.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Issue body sent either as JSON or as a multipart form with an optional `attachment` file.
#[derive(Debug)]
pub struct IssuePayload<T> {
    pub data: T,
    pub attachment: Option<UploadedFile>,
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

pub async fn read_create_payload(
    req: &HttpRequest,
    payload: web::Payload,
    config: &AttachmentConfig,
) -> Result<IssuePayload<CreateIssueRequest>, AppError> {
    if !is_multipart(req) {
        return Ok(IssuePayload {
            data: read_json(payload).await?,
            attachment: None,
        });
    }

    let (fields, attachment) = read_form(req, payload, config.max_file_size).await?;
    Ok(IssuePayload {
        data: create_from_form(&fields)?,
        attachment,
    })
}

pub async fn read_update_payload(
    req: &HttpRequest,
    payload: web::Payload,
    config: &AttachmentConfig,
) -> Result<IssuePayload<UpdateIssueRequest>, AppError> {
    if !is_multipart(req) {
        return Ok(IssuePayload {
            data: read_json(payload).await?,
            attachment: None,
        });
    }

    let (fields, attachment) = read_form(req, payload, config.max_file_size).await?;
    Ok(IssuePayload {
        data: update_from_form(&fields)?,
        attachment,
    })
}

async fn read_json<T: DeserializeOwned>(mut payload: web::Payload) -> Result<T, AppError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::bad_request(format!("Invalid request body: {}", e)))?;
        if body.len() + chunk.len() > MAX_JSON_BODY {
            return Err(AppError::bad_request("Request body is too large"));
        }
        body.extend_from_slice(&chunk);
    }

    serde_json::from_slice(&body).map_err(|e| AppError::bad_request(format!("Invalid JSON: {}", e)))
}

async fn read_form(
    req: &HttpRequest,
    payload: web::Payload,
    max_file_size: usize,
) -> Result<(HashMap<String, String>, Option<UploadedFile>), AppError> {
    let mut multipart = Multipart::new(req.headers(), payload);
    let mut fields = HashMap::new();
    let mut attachment = None;

    while let Some(mut field) = multipart.try_next().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {:?}", e);
        AppError::bad_request("Invalid multipart form")
    })? {
        let content_disposition = field.content_disposition();
        let name = content_disposition.get_name().unwrap_or("").to_string();
        let file_name = content_disposition.get_filename().map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|_| AppError::bad_request(format!("Failed to read field {}", name)))?
        {
            data.extend_from_slice(&chunk);
            if data.len() > max_file_size {
                return Err(AppError::bad_request(format!(
                    "Attachment exceeds the maximum size of {} bytes",
                    max_file_size
                )));
            }
        }

        match (name.as_str(), file_name) {
            ("attachment", Some(file_name)) if !data.is_empty() => {
                attachment = Some(UploadedFile {
                    file_name,
                    bytes: data,
                });
            }
            ("attachment", _) => {}
            (_, _) => {
                let value = String::from_utf8(data)
                    .map_err(|_| AppError::bad_request(format!("Invalid encoding for {}", name)))?;
                fields.insert(name, value);
            }
        }
    }

    Ok((fields, attachment))
}

fn text(fields: &HashMap<String, String>, name: &str) -> Option<String> {
    fields
        .get(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed<T: std::str::FromStr>(
    fields: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, AppError> {
    text(fields, name)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|_| AppError::bad_request(format!("{}: invalid value", name)))
        })
        .transpose()
}

fn required<T: std::str::FromStr>(
    fields: &HashMap<String, String>,
    name: &str,
) -> Result<T, AppError> {
    parsed(fields, name)?.ok_or_else(|| AppError::bad_request(format!("{}: is required", name)))
}

fn create_from_form(fields: &HashMap<String, String>) -> Result<CreateIssueRequest, AppError> {
    Ok(CreateIssueRequest {
        title: text(fields, "title").unwrap_or_default(),
        category: required(fields, "category")?,
        course_unit: text(fields, "course_unit").unwrap_or_default(),
        year_of_study: required(fields, "year_of_study")?,
        semester: required(fields, "semester")?,
        description: text(fields, "description").unwrap_or_default(),
        priority: parsed(fields, "priority")?,
        lecturer_id: parsed(fields, "lecturer_id")?,
    })
}

fn update_from_form(fields: &HashMap<String, String>) -> Result<UpdateIssueRequest, AppError> {
    Ok(UpdateIssueRequest {
        title: text(fields, "title"),
        category: parsed(fields, "category")?,
        course_unit: text(fields, "course_unit"),
        year_of_study: parsed(fields, "year_of_study")?,
        semester: parsed(fields, "semester")?,
        description: text(fields, "description"),
        priority: parsed(fields, "priority")?,
    })
}

/// Keeps letters, digits, dots, dashes and underscores.
fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("attachment");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "attachment".to_string()
    } else {
        cleaned
    }
}

/// Writes the file under `<upload_dir>/issue_attachments/YYYY/MM/DD/`.
pub fn store_attachment(
    config: &AttachmentConfig,
    file: &UploadedFile,
) -> Result<StoredAttachment, AppError> {
    let relative_dir = format!(
        "{}/{}",
        ATTACHMENT_FOLDER,
        chrono::Utc::now().format("%Y/%m/%d")
    );
    let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(&file.file_name));

    let dir = Path::new(&config.upload_dir).join(&relative_dir);
    fs::create_dir_all(&dir).map_err(|e| {
        tracing::error!("Failed to create upload directory: {:?}", e);
        AppError::internal_error("Failed to prepare upload directory")
    })?;

    let mut out = fs::File::create(dir.join(&stored_name)).map_err(|e| {
        tracing::error!("Failed to create attachment file: {:?}", e);
        AppError::internal_error("Failed to save attachment")
    })?;
    out.write_all(&file.bytes).map_err(|e| {
        tracing::error!("Failed to write attachment: {:?}", e);
        AppError::internal_error("Failed to save attachment")
    })?;

    Ok(StoredAttachment {
        file_name: file.file_name.clone(),
        relative_path: format!("{}/{}", relative_dir, stored_name),
    })
}

pub fn attachment_path(config: &AttachmentConfig, attachment: &StoredAttachment) -> PathBuf {
    Path::new(&config.upload_dir).join(&attachment.relative_path)
}

pub fn remove_attachment(config: &AttachmentConfig, attachment: &StoredAttachment) {
    if let Err(e) = fs::remove_file(attachment_path(config, attachment)) {
        tracing::warn!("Failed to remove attachment {}: {:?}", attachment.relative_path, e);
    }
}

/// Removes a freshly stored file when the write that should reference it failed.
pub fn discard_on_error<T>(
    config: &AttachmentConfig,
    stored: Option<&StoredAttachment>,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    if result.is_err() {
        if let Some(stored) = stored {
            remove_attachment(config, stored);
        }
    }
    result
}
