use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, ResponseError};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{ContactExportUseCase, ContactImportUseCase, ImportSummary};
use crate::domain::error::AppError;
use crate::domain::file::UploadedFile;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::formats::{ExporterRegistry, ImporterRegistry};

/// Multipart field carrying the uploaded contact file.
pub const UPLOAD_FIELD: &str = "file";

pub struct HttpState {
    pub export_use_case: ContactExportUseCase,
    pub import_use_case: ContactImportUseCase,
    pub exporters: Arc<ExporterRegistry>,
    pub importers: Arc<ImporterRegistry>,
}

#[derive(Deserialize)]
pub struct ExportRequest {
    pub exporter_format: String,
}

#[derive(Serialize)]
pub struct FormatsResponse {
    pub exporters: Vec<String>,
    pub importers: Vec<String>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFormat(_) | AppError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::DecodeError(_) | AppError::RowConversionError { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::CrmApi(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}

#[post("/contacts/export")]
async fn export_contacts(
    data: web::Data<HttpState>,
    form: web::Form<ExportRequest>,
) -> Result<HttpResponse, AppError> {
    tracing::info!(format = %form.exporter_format, "Export requested");

    let file = data
        .export_use_case
        .execute(&form.exporter_format)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Export failed"))?;

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, file.content_type.clone()))
        .insert_header((CONTENT_DISPOSITION, file.content_disposition()))
        .body(file.bytes))
}

#[post("/contacts/import")]
async fn import_contacts(
    data: web::Data<HttpState>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let file = read_upload(payload).await?;
    tracing::info!(file_name = %file.name, size = file.bytes.len(), "Import requested");

    match data.import_use_case.execute(&file).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(summary)),
        Err(AppError::NoContactsExtracted(file_name)) => {
            tracing::warn!(file_name = %file_name, "No contacts extracted");
            Ok(HttpResponse::Ok().json(ImportSummary::no_contacts(&file_name)))
        }
        Err(e) => {
            tracing::error!(file_name = %file.name, error = %e, "Import failed");
            Err(e)
        }
    }
}

#[get("/formats")]
async fn list_formats(data: web::Data<HttpState>) -> HttpResponse {
    HttpResponse::Ok().json(FormatsResponse {
        exporters: data.exporters.keys(),
        importers: data.importers.keys(),
    })
}

/// Buffers the `file` field of a multipart upload. Other fields are drained
/// and ignored.
async fn read_upload(mut payload: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = payload.next().await {
        let mut field = field
            .map_err(|e| AppError::ValidationError(format!("Malformed upload: {}", e)))?;

        let is_file = field.name() == Some(UPLOAD_FIELD);
        let file_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| AppError::ValidationError(format!("Malformed upload: {}", e)))?;
            if is_file {
                bytes.extend_from_slice(&chunk);
            }
        }

        if is_file {
            let name = file_name.ok_or_else(|| {
                AppError::ValidationError("Uploaded file has no file name".to_string())
            })?;
            return Ok(UploadedFile::new(name, bytes));
        }
    }

    Err(AppError::ValidationError(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(export_contacts)
            .service(import_contacts)
            .service(list_formats),
    );
}

pub fn start_server(state: HttpState, config: &AppConfig) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        // The UI is served from another origin.
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    tracing::info!(host = %config.host, port = config.port, "HTTP server listening");
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            AppError::UnsupportedFormat("pdf".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::row(5, "bad cell").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::DecodeError("not utf-16".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::CrmApi("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
