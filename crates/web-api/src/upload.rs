//! 附件上传接口
//!
//! 客户端在发送 chat-image / chat-file 之前，先把二进制内容上传到
//! 这里，拿到可取回的 URL 后再作为普通事件负载发出。核心路由只
//! 传递 URL 和文件名，从不接触二进制字节。

use std::path::Path;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct FileUploadResponse {
    pub url: String,
    pub name: String,
}

pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, ApiError> {
    let stored = store_upload(&state, multipart).await?;
    Ok(Json(ImageUploadResponse { url: stored.url }))
}

pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<FileUploadResponse>, ApiError> {
    let stored = store_upload(&state, multipart).await?;
    Ok(Json(FileUploadResponse {
        url: stored.url,
        name: stored.original_name,
    }))
}

struct StoredUpload {
    url: String,
    original_name: String,
}

/// 取 multipart 请求里第一个带文件名的部分并落盘
///
/// 存储名由生成的标识符加原始扩展名构成，原始文件名只作为
/// 响应负载返回，从不参与路径拼接。
async fn store_upload(state: &AppState, mut multipart: Multipart) -> Result<StoredUpload, ApiError> {
    let max_bytes = state.config.upload.max_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::new(err.status(), "UPLOAD_ERROR", err.body_text()))?
    {
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::new(err.status(), "UPLOAD_ERROR", err.body_text()))?;

        if data.len() > max_bytes {
            return Err(ApiError::payload_too_large(format!(
                "upload exceeds limit of {max_bytes} bytes"
            )));
        }

        let stored_name = match Path::new(&original_name)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };

        let upload_dir = Path::new(&state.config.upload.dir);
        tokio::fs::create_dir_all(upload_dir).await.map_err(|err| {
            tracing::error!(error = %err, "创建上传目录失败");
            ApiError::internal_server_error("failed to store upload")
        })?;
        tokio::fs::write(upload_dir.join(&stored_name), &data)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, stored = %stored_name, "写入上传文件失败");
                ApiError::internal_server_error("failed to store upload")
            })?;

        tracing::info!(
            name = %original_name,
            stored = %stored_name,
            size = data.len(),
            "附件已保存"
        );

        return Ok(StoredUpload {
            url: format!("/uploads/{stored_name}"),
            original_name,
        });
    }

    Err(ApiError::bad_request(
        "multipart request contained no file part",
    ))
}
