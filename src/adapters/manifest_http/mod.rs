// Manifest adapter - Master playlist retrieval over HTTP

use async_trait::async_trait;
use m3u8_rs::Playlist;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// HTTP master playlist adapter
///
/// `file://` URLs are read from disk so local ladders can be analyzed without
/// a web server.
pub struct HttpManifestAdapter {
    client: Client,
}

impl HttpManifestAdapter {
    pub fn new() -> Result<Self, DomainError> {
        let client = Client::builder()
            .user_agent(concat!("ladder-vmaf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }

    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, DomainError> {
        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| DomainError::Fetch(format!("invalid file url {}", url)))?;
            return tokio::fs::read(&path)
                .await
                .map_err(|e| DomainError::Fetch(format!("{} ({})", e, path.display())));
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| DomainError::Fetch(format!("{} ({})", e, url)))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| DomainError::Fetch(format!("{} ({})", e, url)))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ManifestPort for HttpManifestAdapter {
    async fn fetch_variants(&self, manifest_url: &str) -> Result<Vec<VariantSource>, DomainError> {
        info!("Retrieving master manifest from URI {:?}", manifest_url);
        let url = Url::parse(manifest_url)
            .map_err(|e| DomainError::Fetch(format!("invalid manifest URL {:?}: {}", manifest_url, e)))?;
        let body = self.fetch_bytes(&url).await?;
        parse_master_playlist(&body, &url)
    }
}

/// Parse a master playlist into its variants, resolving each URI against the
/// playlist's own URL. I-frame-only variants are not part of the ladder.
pub fn parse_master_playlist(body: &[u8], base: &Url) -> Result<Vec<VariantSource>, DomainError> {
    let playlist = m3u8_rs::parse_playlist_res(body).map_err(|_| {
        DomainError::Fetch("Failed to decode master manifest: not an HLS playlist".to_string())
    })?;

    let master = match playlist {
        Playlist::MasterPlaylist(master) => master,
        Playlist::MediaPlaylist(_) => {
            return Err(DomainError::Fetch(
                "Invalid manifest format, must be a master manifest".to_string(),
            ))
        }
    };

    let mut variants = Vec::with_capacity(master.variants.len());
    for variant in master.variants.into_iter().filter(|v| !v.is_i_frame) {
        let uri = base
            .join(&variant.uri)
            .map_err(|e| DomainError::Fetch(format!("invalid variant URI {:?}: {}", variant.uri, e)))?;
        debug!(uri = %uri, bandwidth = variant.bandwidth, "Found variant");
        variants.push(VariantSource {
            uri: uri.to_string(),
            bandwidth_bps: variant.bandwidth,
        });
    }

    if variants.is_empty() {
        return Err(DomainError::Fetch(
            "master manifest lists no variants".to_string(),
        ));
    }
    Ok(variants)
}
