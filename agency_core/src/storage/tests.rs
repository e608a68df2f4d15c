use crate::config::StorageConfig;
use crate::error::AppError;
use crate::storage::{ObjectStorage, UploadUrlRequest};

const SECRET: &str = "storage-test-secret-0123456789abcdef";
const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

fn storage(dir: &tempfile::TempDir) -> ObjectStorage {
    let config = StorageConfig {
        root: dir.path().join("objects"),
        max_upload_bytes: 64,
        ..StorageConfig::default()
    };
    std::fs::create_dir_all(&config.root).unwrap();
    ObjectStorage::new(&config, SECRET)
}

fn upload_request(content_type: &str, size: u64) -> UploadUrlRequest {
    UploadUrlRequest {
        file_name: "portrait.png".to_string(),
        content_type: content_type.to_string(),
        size,
        folder: Some("employees".to_string()),
    }
}

fn token_of(url: &str) -> &str {
    url.split("?token=").nth(1).unwrap()
}

#[tokio::test]
async fn test_upload_then_download_through_signed_urls() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);

    let issued = storage.create_upload_url(&upload_request("image/png", PNG.len() as u64)).unwrap();
    assert!(issued.object_key.starts_with("employees/"));
    assert!(issued.object_key.ends_with(".png"));
    assert_eq!(issued.object_path, format!("/api/images/{}", issued.object_key));
    assert_eq!(issued.method, "PUT");

    let stored = storage.put_object(token_of(&issued.upload_url), "image/png", PNG).await.unwrap();
    assert_eq!(stored.key, issued.object_key);
    assert_eq!(stored.size, PNG.len() as u64);

    let download = storage.signed_download_url(&stored.key).await.unwrap().unwrap();
    assert!(download.starts_with(&format!("/api/storage/objects/{}?token=", stored.key)));

    let object = storage.read_object(&stored.key, token_of(&download)).await.unwrap();
    assert_eq!(object.bytes, PNG);
    assert_eq!(object.content_type, "image/png");
}

#[tokio::test]
async fn test_upload_url_rejects_bad_type_and_size() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);

    assert!(matches!(
        storage.create_upload_url(&upload_request("application/x-msdownload", 10)),
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        storage.create_upload_url(&upload_request("image/png", 65)),
        Err(AppError::BadRequest(_))
    ));

    let mut traversal = upload_request("image/png", 10);
    traversal.folder = Some("../outside".to_string());
    assert!(matches!(storage.create_upload_url(&traversal), Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn test_upload_folder_must_be_url_safe() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);

    for folder in ["team?x", "team#1", "100%", "my team"] {
        let mut request = upload_request("image/png", 10);
        request.folder = Some(folder.to_string());
        assert!(
            matches!(storage.create_upload_url(&request), Err(AppError::BadRequest(_))),
            "{:?} should be rejected",
            folder
        );
    }

    let mut request = upload_request("image/png", 10);
    request.folder = Some("/team-photos/2024/".to_string());
    let issued = storage.create_upload_url(&request).unwrap();
    assert!(issued.object_key.starts_with("team-photos/2024/"));
    assert!(issued.object_path.starts_with("/api/images/team-photos/2024/"));
}

#[tokio::test]
async fn test_put_enforces_signed_constraints() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);
    let issued = storage.create_upload_url(&upload_request("image/png", 4)).unwrap();
    let token = token_of(&issued.upload_url);

    assert!(matches!(
        storage.put_object(token, "image/jpeg", PNG).await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        storage.put_object(token, "image/png", PNG).await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        storage.put_object("not-a-token", "image/png", PNG).await,
        Err(AppError::Authorization(_))
    ));
    assert!(!storage.exists(&issued.object_key).await);
}

#[tokio::test]
async fn test_download_token_is_bound_to_key() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);
    std::fs::create_dir_all(dir.path().join("objects/employees")).unwrap();
    std::fs::write(dir.path().join("objects/employees/a.png"), PNG).unwrap();
    std::fs::write(dir.path().join("objects/employees/b.png"), PNG).unwrap();

    let url = storage.signed_download_url("employees/a.png").await.unwrap().unwrap();
    assert!(matches!(
        storage.read_object("employees/b.png", token_of(&url)).await,
        Err(AppError::Authorization(_))
    ));

    let upload = storage.create_upload_url(&upload_request("image/png", 4)).unwrap();
    assert!(matches!(
        storage.read_object("employees/a.png", token_of(&upload.upload_url)).await,
        Err(AppError::Authorization(_))
    ));
}

#[tokio::test]
async fn test_missing_or_unsafe_keys_have_no_download_url() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);

    assert_eq!(storage.signed_download_url("employees/missing.png").await.unwrap(), None);
    assert_eq!(storage.signed_download_url("../secret.txt").await.unwrap(), None);
    assert!(storage.health_check().await.is_ok());
}
