use std::collections::HashMap;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use spanbase_store::read_object;
use spanbase_types::{
    validate_query, validate_upload, FieldValue, FilePart, ObjectPayload, Query as ReadQuery,
    Target,
};

use crate::envelope::Envelope;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

pub const APP_FILE_LIST: &str = "fileList";
pub const ACTION_GET: &str = "getMessage";
pub const ACTION_SEND: &str = "sendMessage";

/// Query-string parameters of the file-list endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FileListParams {
    pub app: Option<String>,
    pub action: Option<String>,
    pub target: Option<String>,
}

impl FileListParams {
    fn require(&self, action: &str) -> ServerResult<()> {
        if self.app.as_deref() == Some(APP_FILE_LIST) && self.action.as_deref() == Some(action) {
            Ok(())
        } else {
            Err(ServerError::InvalidAction {
                app: self.app.clone(),
                action: self.action.clone(),
            })
        }
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "name": "spanbase",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /filelist`: list recent objects, or download one when `target` is set.
pub async fn get_file_list(
    State(state): State<AppState>,
    Query(params): Query<FileListParams>,
) -> ServerResult<Response> {
    params.require(ACTION_GET)?;
    match validate_query(params.target.as_deref())? {
        ReadQuery::ListRecent => {
            let recent = state.store.list_recent(state.list_limit).await?;
            Ok(Json(Envelope::ok(recent)).into_response())
        }
        ReadQuery::Read(target) => {
            let payload = read_object(state.store.as_ref(), target).await?;
            Ok(download(payload))
        }
    }
}

/// `POST /filelist`: store a multipart upload with a `text` label and an
/// optional `file` attachment.
pub async fn post_file_list(
    State(state): State<AppState>,
    Query(params): Query<FileListParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServerResult<Json<Envelope<Target>>> {
    params.require(ACTION_SEND)?;
    let mut multipart = multipart.map_err(|e| ServerError::Multipart {
        status: e.status(),
        message: e.body_text(),
    })?;
    let fields = read_form(&mut multipart).await?;

    let upload = validate_upload(fields.get("text"), fields.get("file"))?;
    let len = upload.len();
    let target = state
        .store
        .put_object(&upload.text, upload.payload.unwrap_or_default())
        .await?;
    tracing::info!(%target, len, "upload stored");
    Ok(Json(Envelope::ok(target)))
}

fn download(payload: ObjectPayload) -> Response {
    let len = payload.content_length();
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (header::CONTENT_LENGTH, HeaderValue::from(len)),
        ],
        payload.data,
    )
        .into_response()
}

/// Collect form fields by name. The first occurrence of a name wins.
async fn read_form(multipart: &mut Multipart) -> ServerResult<HashMap<String, FieldValue>> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await.map_err(multipart_error)?;
        fields
            .entry(name)
            .or_insert_with(|| classify_field(file_name, content_type, data));
    }
    Ok(fields)
}

fn multipart_error(err: MultipartError) -> ServerError {
    ServerError::Multipart {
        status: err.status(),
        message: err.body_text(),
    }
}

/// Parts with a file name are files; parts declaring a non-text content type
/// are raw binary; everything else is text if it decodes as UTF-8.
fn classify_field(
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
) -> FieldValue {
    if file_name.is_some() {
        return FieldValue::File(FilePart {
            file_name,
            content_type,
            data,
        });
    }
    if content_type.as_deref().is_some_and(|ct| !ct.starts_with("text/")) {
        return FieldValue::Binary(data);
    }
    match std::str::from_utf8(&data) {
        Ok(text) => FieldValue::Text(text.to_owned()),
        Err(_) => FieldValue::Binary(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_require_app_and_action() {
        let params = FileListParams {
            app: Some("fileList".into()),
            action: Some("getMessage".into()),
            target: None,
        };
        assert!(params.require(ACTION_GET).is_ok());
        assert!(matches!(
            params.require(ACTION_SEND),
            Err(ServerError::InvalidAction { .. })
        ));
        assert!(FileListParams::default().require(ACTION_GET).is_err());
    }

    #[test]
    fn named_part_is_a_file() {
        let value = classify_field(Some("a.bin".into()), None, Bytes::from_static(b"xyz"));
        assert!(matches!(value, FieldValue::File(ref p) if p.file_name.as_deref() == Some("a.bin")));
    }

    #[test]
    fn octet_stream_part_is_binary() {
        let value = classify_field(
            None,
            Some("application/octet-stream".into()),
            Bytes::from_static(b"abc"),
        );
        assert!(matches!(value, FieldValue::Binary(_)));
    }

    #[test]
    fn plain_part_is_text_unless_invalid_utf8() {
        let text = classify_field(None, None, Bytes::from_static(b"hello"));
        assert_eq!(text, FieldValue::Text("hello".into()));

        let text = classify_field(None, Some("text/plain".into()), Bytes::from_static(b"hi"));
        assert_eq!(text, FieldValue::Text("hi".into()));

        let binary = classify_field(None, None, Bytes::from_static(&[0xff, 0xfe]));
        assert!(matches!(binary, FieldValue::Binary(_)));
    }
}
