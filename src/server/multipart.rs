//! Multipart form data parsing.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use bytes::Bytes;
use futures_util::stream;
use multer::Multipart;
use serde_json::Value;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::core::params::insert_param;
use crate::core::{Params, UploadedFile};

/// Largest file accepted; bigger uploads are recorded with
/// [`UploadedFile::ERR_TOO_LARGE`] and not stored.
pub const MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// Uploaded files grouped by field name.
pub type Files = HashMap<String, Vec<UploadedFile>>;

/// Multipart decoding failure.
#[derive(Debug)]
pub enum MultipartError {
    /// Malformed body or content type.
    Parse(multer::Error),
    /// Storing an upload failed.
    Io(std::io::Error),
}

impl fmt::Display for MultipartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultipartError::Parse(e) => write!(f, "malformed multipart body: {}", e),
            MultipartError::Io(e) => write!(f, "failed to store upload: {}", e),
        }
    }
}

impl std::error::Error for MultipartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MultipartError::Parse(e) => Some(e),
            MultipartError::Io(e) => Some(e),
        }
    }
}

impl From<multer::Error> for MultipartError {
    fn from(e: multer::Error) -> Self {
        MultipartError::Parse(e)
    }
}

impl From<std::io::Error> for MultipartError {
    fn from(e: std::io::Error) -> Self {
        MultipartError::Io(e)
    }
}

/// Decode a multipart body. Text fields become params (bracket keys nest),
/// files are written to `upload_dir` under unique names.
pub async fn parse_multipart(
    content_type: &str,
    body: Bytes,
    upload_dir: &Path,
) -> Result<(Params, Files), MultipartError> {
    let boundary = multer::parse_boundary(content_type)?;

    let mut multipart = Multipart::new(
        stream::once(async { Ok::<_, std::io::Error>(body) }),
        boundary,
    );

    let mut params = Params::new();
    let mut files = Files::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        let original_name = match field.file_name() {
            Some(name) => name.to_string(),
            None => {
                let value = field.text().await?;
                insert_param(&mut params, &field_name, Value::String(value));
                continue;
            }
        };

        // Empty file inputs are submitted with no name
        if original_name.is_empty() {
            continue;
        }

        let mime_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_default();
        let data = field.bytes().await?;
        let size = data.len() as u64;

        let uploaded = if size > MAX_UPLOAD_SIZE {
            UploadedFile {
                name: original_name,
                mime_type,
                tmp_name: Default::default(),
                size,
                error: UploadedFile::ERR_TOO_LARGE,
            }
        } else {
            let tmp_name = upload_dir.join(format!("upload_{}", Uuid::new_v4().simple()));
            let mut file = File::create(&tmp_name).await?;
            file.write_all(&data).await?;
            file.flush().await?;

            UploadedFile {
                name: original_name,
                mime_type,
                tmp_name,
                size,
                error: 0,
            }
        };

        tracing::debug!(
            field = %field_name,
            file = %uploaded.name,
            size = uploaded.size,
            error = uploaded.error,
            "Parsed uploaded file"
        );

        let key = field_name
            .strip_suffix("[]")
            .unwrap_or(&field_name)
            .to_string();
        files.entry(key).or_default().push(uploaded);
    }

    Ok((params, files))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "XBOUNDARY";

    fn body(parts: &[(&str, Option<&str>, &str)]) -> Bytes {
        let mut out = String::new();
        for (name, filename, content) in parts {
            out.push_str(&format!("--{}\r\n", BOUNDARY));
            match filename {
                Some(f) => out.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/plain\r\n\r\n",
                    name, f
                )),
                None => out.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            out.push_str(content);
            out.push_str("\r\n");
        }
        out.push_str(&format!("--{}--\r\n", BOUNDARY));
        Bytes::from(out)
    }

    fn content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    #[tokio::test]
    async fn test_fields_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let data = body(&[
            ("title", None, "Hello"),
            ("user[name]", None, "ada"),
            ("docs[]", Some("a.txt"), "first"),
            ("docs[]", Some("b.txt"), "second"),
            ("empty", Some(""), ""),
        ]);

        let (params, files) = parse_multipart(&content_type(), data, dir.path()).await.unwrap();

        assert_eq!(params["title"], Value::from("Hello"));
        assert_eq!(params["user"]["name"], Value::from("ada"));

        let docs = &files["docs"];
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "a.txt");
        assert_eq!(docs[0].mime_type, "text/plain");
        assert_eq!(docs[0].size, 5);
        assert!(docs[0].is_valid());
        assert!(docs[0].tmp_name.starts_with(dir.path()));
        assert_eq!(std::fs::read_to_string(&docs[1].tmp_name).unwrap(), "second");
        assert!(!files.contains_key("empty"));
    }

    #[tokio::test]
    async fn test_oversized_file_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let big = "x".repeat(MAX_UPLOAD_SIZE as usize + 1);
        let data = body(&[("avatar", Some("big.bin"), &big)]);

        let (_, files) = parse_multipart(&content_type(), data, dir.path()).await.unwrap();
        let file = &files["avatar"][0];
        assert_eq!(file.error, UploadedFile::ERR_TOO_LARGE);
        assert!(!file.is_valid());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let result = parse_multipart("multipart/form-data", Bytes::new(), dir.path()).await;
        assert!(matches!(result, Err(MultipartError::Parse(_))));
    }
}
