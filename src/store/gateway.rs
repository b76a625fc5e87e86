//! Bundle retrieval through an HTTP content gateway.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{valid_hash, ArtifactBundle, ContentStore, StoreError};

/// File the gateway serves alongside each bundle, naming its contents.
const MANIFEST_FILE: &str = "manifest.json";

/// Store that downloads bundles from a content gateway into a staging
/// directory and reuses the staged copy on later fetches.
pub struct GatewayStore {
    client: reqwest::Client,
    base_url: String,
    staging: PathBuf,
}

#[derive(serde::Deserialize)]
struct BundleManifest {
    files: Vec<String>,
}

impl GatewayStore {
    pub fn new(base_url: impl Into<String>, staging: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base_url = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            staging: staging.into(),
        })
    }

    fn file_url(&self, hash: &str, file: &str) -> String {
        format!("{}/{}/{}", self.base_url, hash, file)
    }

    async fn download(&self, hash: &str, file: &str, dest_root: &Path) -> Result<(), StoreError> {
        let url = self.file_url(hash, file);
        let mut response = self.client.get(&url).send().await?.error_for_status()?;

        let dest = dest_root.join(file);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Weight files run to gigabytes; stream to disk instead of
        // buffering whole bodies.
        let mut out = fs::File::create(&dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        out.flush().await?;
        debug!("Fetched {} ({} bytes)", url, written);
        Ok(())
    }
}

#[async_trait]
impl ContentStore for GatewayStore {
    async fn fetch(&self, hash: &str) -> Result<ArtifactBundle, StoreError> {
        if !valid_hash(hash) {
            return Err(StoreError::NotFound(hash.to_string()));
        }

        let staged = self.staging.join(hash);
        if fs::metadata(&staged).await.map(|m| m.is_dir()).unwrap_or(false) {
            debug!("Bundle {} already staged", hash);
            return Ok(ArtifactBundle::new(staged));
        }

        // Manifest first: it names every file in the bundle.
        let response = self.client.get(self.file_url(hash, MANIFEST_FILE)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(hash.to_string()));
        }
        let manifest: BundleManifest = response.error_for_status()?.json().await?;

        for file in &manifest.files {
            if file.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
                return Err(StoreError::UnsafePath(file.clone()));
            }
        }

        // Stage into a scratch directory and rename at the end, so a partial
        // download never looks like a complete bundle.
        let scratch = self.staging.join(format!("{}.partial", hash));
        if fs::metadata(&scratch).await.is_ok() {
            fs::remove_dir_all(&scratch).await?;
        }
        fs::create_dir_all(&scratch).await?;

        for file in &manifest.files {
            self.download(hash, file, &scratch).await?;
        }

        fs::rename(&scratch, &staged).await?;
        info!("Staged bundle {} ({} files)", hash, manifest.files.len());
        Ok(ArtifactBundle::new(staged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Router;

    const WEIGHTS_LEN: usize = 1_048_576;

    fn store() -> GatewayStore {
        GatewayStore::new("http://127.0.0.1:8080/ipfs/", "/tmp/staging").unwrap()
    }

    /// In-process gateway serving one bundle on an ephemeral port.
    async fn serve_fixture() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
        let app = Router::new()
            .route(
                "/ipfs/QmStage/manifest.json",
                get(|| async { r#"{"files": ["model_config.json", "model/weights.bin"]}"# }),
            )
            .route(
                "/ipfs/QmStage/model_config.json",
                get(|| async { r#"{"model_type": "transformers"}"# }),
            )
            .route(
                "/ipfs/QmStage/model/weights.bin",
                get(|| async { vec![7u8; WEIGHTS_LEN] }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, task)
    }

    #[test]
    fn file_urls_join_cleanly() {
        let store = store();
        assert_eq!(
            store.file_url("QmHash", "model_config.json"),
            "http://127.0.0.1:8080/ipfs/QmHash/model_config.json"
        );
        assert_eq!(
            store.file_url("QmHash", "model/weights.bin"),
            "http://127.0.0.1:8080/ipfs/QmHash/model/weights.bin"
        );
    }

    #[test]
    fn manifest_parses_file_list() {
        let manifest: BundleManifest =
            serde_json::from_str(r#"{"files": ["model_config.json", "model/weights.bin"]}"#)
                .unwrap();
        assert_eq!(manifest.files.len(), 2);
    }

    #[tokio::test]
    async fn fetch_streams_bundle_into_staging() {
        let (addr, server) = serve_fixture().await;
        let staging = tempfile::tempdir().unwrap();
        let store = GatewayStore::new(format!("http://{}/ipfs", addr), staging.path()).unwrap();

        let bundle = store.fetch("QmStage").await.unwrap();

        let config = std::fs::read_to_string(bundle.root().join("model_config.json")).unwrap();
        assert!(config.contains("transformers"));
        let weights = std::fs::read(bundle.root().join("model").join("weights.bin")).unwrap();
        assert_eq!(weights.len(), WEIGHTS_LEN);
        assert!(weights.iter().all(|&b| b == 7));
        assert!(!staging.path().join("QmStage.partial").exists());

        server.abort();
    }

    #[tokio::test]
    async fn second_fetch_reuses_the_staged_copy() {
        let (addr, server) = serve_fixture().await;
        let staging = tempfile::tempdir().unwrap();
        let store = GatewayStore::new(format!("http://{}/ipfs", addr), staging.path()).unwrap();

        store.fetch("QmStage").await.unwrap();
        // The gateway goes away; the staged copy must carry the fetch.
        server.abort();

        let bundle = store.fetch("QmStage").await.unwrap();
        assert!(bundle.root().join("model_config.json").is_file());
    }

    #[tokio::test]
    async fn missing_manifest_is_not_found() {
        let (addr, server) = serve_fixture().await;
        let staging = tempfile::tempdir().unwrap();
        let store = GatewayStore::new(format!("http://{}/ipfs", addr), staging.path()).unwrap();

        assert!(matches!(
            store.fetch("QmAbsent").await,
            Err(StoreError::NotFound(_))
        ));
        server.abort();
    }
}
