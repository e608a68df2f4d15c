use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use super::signer::{ObjectOperation, UrlSigner};
use super::validation::{essence_of, normalize_key, UploadValidationError, UploadValidator};
use crate::config::StorageConfig;
use crate::employees::IMAGE_PROXY_PREFIX;
use crate::error::{AppError, Result};

pub const UPLOAD_PATH: &str = "/api/storage/upload";
pub const OBJECTS_PATH: &str = "/api/storage/objects/";

const DEFAULT_FOLDER: &str = "uploads";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub method: &'static str,
    pub object_key: String,
    /// Path to store on records; served through the image proxy.
    pub object_path: String,
    pub content_type: String,
    pub max_bytes: u64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct ObjectData {
    pub key: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Local-directory object store fronted by signed URLs.
#[derive(Clone)]
pub struct ObjectStorage {
    root: PathBuf,
    validator: UploadValidator,
    signer: UrlSigner,
    ttl_seconds: i64,
}

impl ObjectStorage {
    pub fn new(config: &StorageConfig, signing_secret: &str) -> Self {
        Self {
            root: config.root.clone(),
            validator: UploadValidator::from_config(config),
            signer: UrlSigner::new(signing_secret),
            ttl_seconds: config.signed_url_ttl_seconds,
        }
    }

    pub fn create_upload_url(&self, request: &UploadUrlRequest) -> Result<UploadUrlResponse> {
        let content_type = self
            .validator
            .validate_request(&request.file_name, &request.content_type, request.size)?;

        let folder = match request.folder.as_deref().map(str::trim) {
            Some(folder) if !folder.is_empty() => normalize_key(folder.trim_matches('/'))?,
            _ => DEFAULT_FOLDER.to_string(),
        };

        let extension = extension_for(&request.file_name, &content_type);
        let object_key = format!("{}/{}.{}", folder, Uuid::new_v4(), extension);

        let (token, exp) = self.signer.sign(
            &object_key,
            ObjectOperation::Upload,
            Some(content_type.clone()),
            Some(request.size),
            self.ttl_seconds,
        )?;

        info!(key = %object_key, content_type = %content_type, size = request.size, "Issued upload URL");

        Ok(UploadUrlResponse {
            upload_url: format!("{}?token={}", UPLOAD_PATH, token),
            method: "PUT",
            object_path: format!("{}{}", IMAGE_PROXY_PREFIX, object_key),
            object_key,
            content_type,
            max_bytes: request.size,
            expires_at: timestamp(exp),
        })
    }

    /// Stores the body of a signed upload. The token fixes key, type and size.
    pub async fn put_object(&self, token: &str, content_type: &str, data: &[u8]) -> Result<StoredObject> {
        let claims = self.signer.verify(token, ObjectOperation::Upload)?;
        let key = normalize_key(&claims.key)?;

        let content_type = essence_of(content_type);
        if claims.content_type.as_deref() != Some(content_type.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Content type {} does not match the signed upload",
                content_type
            )));
        }

        let size = data.len() as u64;
        let limit = claims
            .max_bytes
            .unwrap_or(self.validator.max_bytes())
            .min(self.validator.max_bytes());
        if size > limit {
            return Err(UploadValidationError::FileTooLarge { size, max_size: limit }.into());
        }
        self.validator.validate_payload(&content_type, data)?;

        let path = self.path_for(&key);
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let mut file = async_fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        info!(key = %key, size, "Stored object");

        Ok(StoredObject {
            key,
            size,
            content_type,
        })
    }

    /// Signed download URL for an existing object, `None` when nothing is stored under `key`.
    pub async fn signed_download_url(&self, key: &str) -> Result<Option<String>> {
        let key = match normalize_key(key) {
            Ok(key) => key,
            Err(_) => return Ok(None),
        };

        if !self.exists(&key).await {
            debug!(key = %key, "Requested object does not exist");
            return Ok(None);
        }

        let (token, _) = self
            .signer
            .sign(&key, ObjectOperation::Download, None, None, self.ttl_seconds)?;

        Ok(Some(format!("{}{}?token={}", OBJECTS_PATH, key, token)))
    }

    pub async fn read_object(&self, key: &str, token: &str) -> Result<ObjectData> {
        let claims = self.signer.verify(token, ObjectOperation::Download)?;
        let key = normalize_key(key)?;

        if claims.key != key {
            return Err(AppError::Authorization(
                "Signed URL was issued for a different object".to_string(),
            ));
        }

        let bytes = match async_fs::read(self.path_for(&key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound("Object not found".to_string()));
            }
            Err(e) => return Err(AppError::Storage(format!("Failed to read {}: {}", key, e))),
        };

        let content_type = mime_guess::from_path(&key).first_or_octet_stream().to_string();

        Ok(ObjectData {
            key,
            content_type,
            bytes,
        })
    }

    pub async fn exists(&self, key: &str) -> bool {
        match normalize_key(key) {
            Ok(key) => async_fs::metadata(self.path_for(&key))
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn health_check(&self) -> Result<()> {
        let meta = async_fs::metadata(&self.root).await?;
        if !meta.is_dir() {
            return Err(AppError::Storage(format!("{} is not a directory", self.root.display())));
        }
        Ok(())
    }

    fn path_for(&self, normalized_key: &str) -> PathBuf {
        normalized_key
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

fn extension_for(file_name: &str, content_type: &str) -> String {
    let from_name = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| {
            mime_guess::from_ext(ext)
                .iter()
                .any(|guess| guess.essence_str() == content_type)
        });

    from_name
        .or_else(|| {
            mime_guess::get_mime_extensions_str(content_type)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| "bin".to_string())
}

fn timestamp(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().unwrap_or_else(Utc::now)
}
