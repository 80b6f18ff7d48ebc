//! Image download ahead of assembly.
//!
//! Assembly itself is synchronous, so every image block is fetched up front
//! and handed over as a map from block index to bytes or failure reason.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures::future::join_all;
use reqwest::{Client, Url, header};

use super::spec::{ContentBlock, DocumentSpec};

pub const USER_AGENT: &str = "docx-generator-bot/1.0";

/// Block index to image bytes, or the reason the image was not fetched.
pub type FetchedImages = HashMap<usize, Result<Vec<u8>, String>>;

#[derive(Debug, Clone)]
pub struct ImageLimits {
    pub timeout: Option<Duration>,
    pub max_bytes: usize,
}

impl Default for ImageLimits {
    fn default() -> Self {
        ImageLimits {
            timeout: Some(Duration::from_secs(20)),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

pub async fn prefetch(http: &Client, spec: &DocumentSpec, limits: &ImageLimits) -> FetchedImages {
    let jobs = spec.content.iter().enumerate().filter_map(|(idx, block)| match block {
        ContentBlock::Image(image) => {
            let url = image.url.clone().filter(|u| !u.trim().is_empty())?;
            Some(async move {
                let result = fetch(http, &url, limits).await.map_err(|e| {
                    log::warn!("failed to fetch image {url}: {e:#}");
                    format!("{e:#}")
                });
                (idx, result)
            })
        }
        _ => None,
    });
    join_all(jobs).await.into_iter().collect()
}

async fn fetch(http: &Client, raw_url: &str, limits: &ImageLimits) -> Result<Vec<u8>> {
    let url = Url::parse(raw_url.trim()).context("invalid image URL")?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported image URL scheme '{}'", url.scheme());
    }

    let mut request = http.get(url).header(header::USER_AGENT, USER_AGENT);
    if let Some(timeout) = limits.timeout {
        request = request.timeout(timeout);
    }
    let mut response = request.send().await?.error_for_status()?;

    if let Some(length) = response.content_length() {
        if length as usize > limits.max_bytes {
            bail!("image is {length} bytes, limit is {}", limits.max_bytes);
        }
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if bytes.len() + chunk.len() > limits.max_bytes {
            bail!("image exceeds {} bytes", limits.max_bytes);
        }
        bytes.extend_from_slice(&chunk);
    }
    if bytes.is_empty() {
        bail!("image response was empty");
    }
    Ok(bytes)
}
