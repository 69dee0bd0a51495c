use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;

/// Presigned upload URLs expire after 10 minutes.
const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// MIME types accepted for festival image uploads. The presigned URL pins the
/// Content-Type, so the browser cannot swap in a different payload type.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// True when the given MIME type may be uploaded as a festival image.
pub fn image_type_allowed(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&content_type)
}

/// StorageService
///
/// Abstract contract for the object-storage layer behind the image pipeline.
/// The trait lets the handlers run against the real S3 client in production
/// and the in-memory mock in tests without any code change at the call site.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Local (MinIO) convenience only;
    /// a no-op against hosted storage.
    async fn ensure_bucket_exists(&self);

    /// Generates a time-limited signed URL allowing the admin frontend to PUT
    /// one image directly into the bucket, bypassing this server.
    ///
    /// # Arguments
    /// * `key`: the object key (path + filename) inside the bucket.
    /// * `content_type`: the pinned MIME type (must be an allowed image type).
    async fn presign_image_upload(&self, key: &str, content_type: &str)
    -> Result<String, String>;

    /// Deletes an uploaded object. Used when an admin removes a gallery image.
    async fn delete_object(&self, key: &str) -> Result<(), String>;
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;

/// S3StorageClient
///
/// Real implementation over the AWS SDK. S3 compatibility covers both targets:
/// - **Local:** Dockerized MinIO instance.
/// - **Production:** the hosted storage gateway.
///
/// `force_path_style(true)` is required for MinIO and most hosted gateways.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    /// Constructs the client from the credentials resolved by AppConfig.
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            // Path-style addressing (http://endpoint/bucket/key) is required
            // for MinIO and hosted gateway endpoints.
            .force_path_style(true)
            .build();

        let client = s3::Client::from_conf(config);

        Self {
            client,
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// ensure_bucket_exists
    ///
    /// CreateBucket is idempotent, so this is safe to call at every startup.
    async fn ensure_bucket_exists(&self) {
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn presign_image_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String> {
        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            // The signed request pins this Content-Type header.
            .content_type(content_type)
            .presigned(
                PresigningConfig::expires_in(UPLOAD_URL_TTL).map_err(|e| e.to_string())?,
            )
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }

    async fn delete_object(&self, key: &str) -> Result<(), String> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// sanitize_key
///
/// Removes directory-navigation components from a key segment so a
/// client-supplied filename can never traverse outside the upload prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// In-memory implementation for unit and integration tests: no network, fully
/// deterministic URLs, and a switch to simulate storage failures.
#[derive(Clone)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
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

impl Default for MockStorageService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {
        // No-op in mock environment.
    }

    async fn presign_image_upload(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: simulation requested".to_string());
        }

        let sanitized_key = sanitize_key(key);

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitized_key
        ))
    }

    async fn delete_object(&self, _key: &str) -> Result<(), String> {
        if self.should_fail {
            return Err("Mock Storage Error: simulation requested".to_string());
        }
        Ok(())
    }
}
