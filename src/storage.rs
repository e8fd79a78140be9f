use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Lifetime of a presigned upload URL.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// StorageService
///
/// Object storage for advertisement images. Clients upload directly with a presigned
/// URL and store the resulting public URL on the advertisement.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the bucket if needed. Only used for the local MinIO setup.
    async fn ensure_bucket_exists(&self);

    /// Signs a PUT for `key`, constrained to `content_type`.
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, String>;

    /// Public URL under which `key` is readable once uploaded.
    fn public_url(&self, key: &str) -> String;
}

/// Whether `content_type` names an image MIME type.
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty())
}

/// image_object_key
///
/// Builds a fresh key `advertisements/<owner>/<uuid>.<ext>`. The extension is taken
/// from `filename`, lowercased, and replaced by `bin` if missing or not alphanumeric.
pub fn image_object_key(owner_id: Uuid, filename: &str) -> String {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string());
    format!("advertisements/{}/{}.{}", owner_id, Uuid::new_v4(), extension)
}

/// S3StorageClient
///
/// S3-compatible client: MinIO locally, Supabase Storage in production. Path-style
/// addressing is required by both.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_base_url: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_base_url: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            // Already-existing buckets also land here.
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket skipped");
        }
    }

    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, String> {
        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL).map_err(|e| e.to_string())?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

/// Removes empty, `.` and `..` segments from a key.
fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// Deterministic `StorageService` for tests; no network access.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, presigning fails.
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn presign_upload(&self, key: &str, _content_type: &str) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }

    fn public_url(&self, key: &str) -> String {
        format!("http://localhost:9000/mock-bucket/{}", sanitize_key(key))
    }
}

/// StorageState
///
/// The shared handle to object storage held in the application state.
pub type StorageState = Arc<dyn StorageService>;
