//! Buffered reading of `multipart/form-data` uploads.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::http::StatusCode;

use crate::app::errors;

/// Largest accepted request body for uploads.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Extension of the client-supplied name, including the dot (`".png"`), or empty.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default()
    }
}

/// Text fields plus the (optional) file posted under one field name.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

pub async fn read_form(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<UploadForm, axum::response::Response> {
    let mut form = UploadForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => return Err(malformed(e)),
        };
        let name = field.name().unwrap_or_default().to_string();

        if name == file_field {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await.map_err(malformed)?;
            if !bytes.is_empty() {
                form.file = Some(UploadedFile {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field.text().await.map_err(malformed)?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

fn malformed(err: axum::extract::multipart::MultipartError) -> axum::response::Response {
    errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", err.body_text())
}
