//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::server::AppState;
use crate::error::SheetloadError;
use crate::excel::TableExporter;
use crate::types::{SheetError, TableMetadata};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// HTTP status for an error surfaced by the service or catalog
pub fn status_for(error: &SheetloadError) -> StatusCode {
    match error {
        SheetloadError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        SheetloadError::FileFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        SheetloadError::NotFound(_) => StatusCode::NOT_FOUND,
        SheetloadError::RegionParse { .. }
        | SheetloadError::SchemaMismatch { .. }
        | SheetloadError::ExistingTableMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure<T: Serialize>(error: &SheetloadError) -> (StatusCode, Json<ApiResponse<T>>) {
    (status_for(error), Json(ApiResponse::err(error.to_string())))
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

impl EndpointInfo {
    fn new(method: &str, path: &str, description: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        }
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Sheetload API Server".to_string(),
        version: state.version.clone(),
        description: "Quarterly workbook ingestion into period tables".to_string(),
        endpoints: vec![
            EndpointInfo::new("GET", "/health", "Health check endpoint"),
            EndpointInfo::new("GET", "/version", "Get server version"),
            EndpointInfo::new("POST", "/api/v1/upload", "Ingest a workbook (multipart field 'file')"),
            EndpointInfo::new("GET", "/api/v1/tables", "List ingested tables"),
            EndpointInfo::new("GET", "/api/v1/tables/:name", "Row count and columns of a table"),
            EndpointInfo::new("GET", "/api/v1/tables/:name/export", "Download a table as .xlsx"),
            EndpointInfo::new("DELETE", "/api/v1/tables/:name", "Drop a table"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// GET /health - Health check, including a datastore round trip
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match sqlx::query("SELECT 1")
        .execute(state.service.store().pool())
        .await
    {
        Ok(_) => "ok".to_string(),
        Err(e) => {
            warn!(error = %e, "Health check could not reach the database");
            format!("unavailable: {}", e)
        }
    };
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        database,
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec![
            "upload".to_string(),
            "list".to_string(),
            "metadata".to_string(),
            "export".to_string(),
            "delete".to_string(),
        ],
    }))
}

/// Upload response
#[derive(Serialize, Default)]
pub struct UploadResponse {
    pub status: String,
    pub message: String,
    pub request_id: String,
    pub tables_created: Vec<String>,
    pub rows_inserted: u64,
    /// Milliseconds
    pub processing_time: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SheetError>,
}

impl UploadResponse {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            request_id: Uuid::new_v4().to_string(),
            ..Self::default()
        }
    }
}

/// POST /api/v1/upload - Ingest one workbook
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> (StatusCode, Json<UploadResponse>) {
    let field = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => break field,
            Ok(Some(_)) => continue,
            Ok(None) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(UploadResponse::rejected("multipart field 'file' is required")),
                )
            }
            Err(e) => return (e.status(), Json(UploadResponse::rejected(e.body_text()))),
        }
    };

    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = match field.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return (e.status(), Json(UploadResponse::rejected(e.body_text()))),
    };

    let result = match state.service.ingest_bytes(&file_name, bytes.to_vec()).await {
        Ok(result) => result,
        Err(e) => {
            warn!(file = %file_name, error = %e, "Upload rejected");
            return (status_for(&e), Json(UploadResponse::rejected(e.to_string())));
        }
    };

    let processing_time = result.processing_time.as_millis() as u64;
    let request_id = Uuid::new_v4().to_string();
    if result.success {
        let tables_created: Vec<String> = result
            .tables_created
            .iter()
            .map(|t| t.table_name.clone())
            .collect();
        (
            StatusCode::OK,
            Json(UploadResponse {
                status: "success".to_string(),
                message: format!(
                    "Loaded {} rows into {}",
                    result.total_rows,
                    tables_created.join(", ")
                ),
                request_id,
                tables_created,
                rows_inserted: result.total_rows,
                processing_time,
                errors: Vec::new(),
            }),
        )
    } else {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(UploadResponse {
                status: "error".to_string(),
                message: format!(
                    "Ingestion failed with {} error(s); nothing was loaded",
                    result.errors.len()
                ),
                request_id,
                tables_created: Vec::new(),
                rows_inserted: 0,
                processing_time,
                errors: result.errors,
            }),
        )
    }
}

/// Table listing response
#[derive(Serialize)]
pub struct TablesResponse {
    pub count: usize,
    pub tables: Vec<TableMetadata>,
}

/// GET /api/v1/tables - List ingested tables
pub async fn list_tables(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<TablesResponse>>) {
    match state.service.store().list_dynamic_tables().await {
        Ok(tables) => (
            StatusCode::OK,
            Json(ApiResponse::ok(TablesResponse {
                count: tables.len(),
                tables,
            })),
        ),
        Err(e) => failure(&e),
    }
}

/// GET /api/v1/tables/:name - Table metadata
pub async fn table_metadata(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<ApiResponse<TableMetadata>>) {
    match state.service.store().get_metadata(&name).await {
        Ok(metadata) => (StatusCode::OK, Json(ApiResponse::ok(metadata))),
        Err(e) => failure(&e),
    }
}

/// Delete response
#[derive(Serialize)]
pub struct DeleteResponse {
    pub table_name: String,
    pub dropped: bool,
}

/// DELETE /api/v1/tables/:name - Drop a table
pub async fn delete_table(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<ApiResponse<DeleteResponse>>) {
    match state.service.store().drop_table(&name).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::ok(DeleteResponse {
                table_name: name,
                dropped: true,
            })),
        ),
        Err(e) => failure(&e),
    }
}

/// GET /api/v1/tables/:name/export - Table as an .xlsx download
pub async fn export_table(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let store = state.service.store();
    let exported = async {
        let (metadata, rows) = store.fetch_rows(&name).await?;
        TableExporter::new(metadata, rows).to_buffer()
    }
    .await;

    match exported {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}.xlsx\"", name),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => failure::<()>(&e).into_response(),
    }
}
