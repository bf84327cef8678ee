//! Loading of overlay images and preset manifests.

use crate::error::{WaterlogoError, WaterlogoResult};
use reqwest::Client;
use std::path::Path;

static WATERLOGO_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

lazy_static! {
    static ref FETCH_TOKIO_RUNTIME: tokio::runtime::Runtime =
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
    static ref REQWEST_CLIENT: Client = reqwest::ClientBuilder::new()
        .user_agent(WATERLOGO_USER_AGENT)
        .build()
        .expect("Failed to construct reqwest client");
}

/// Resolves a location string to bytes.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, location: &str) -> WaterlogoResult<Vec<u8>>;
}

/// Fetches `http(s)://` URLs over the network and everything else, including
/// `file://` URLs, from the filesystem.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher;

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, location: &str) -> WaterlogoResult<Vec<u8>> {
        if location.starts_with("http://") || location.starts_with("https://") {
            log::debug!(target: "fetch", "GET {}", location);
            FETCH_TOKIO_RUNTIME.block_on(fetch_http(location))
        } else {
            let path = location.strip_prefix("file://").unwrap_or(location);
            std::fs::read(Path::new(path)).map_err(|e| fetch_error(location, e))
        }
    }
}

async fn fetch_http(url: &str) -> WaterlogoResult<Vec<u8>> {
    let response = REQWEST_CLIENT
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_error(url, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(url, format!("HTTP status {status}")));
    }
    let bytes = response.bytes().await.map_err(|e| fetch_error(url, e))?;
    Ok(bytes.to_vec())
}

fn fetch_error(location: &str, message: impl ToString) -> WaterlogoError {
    WaterlogoError::Fetch {
        location: location.to_string(),
        message: message.to_string(),
    }
}
