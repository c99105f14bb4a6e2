//! Asynchronous image loading.
//!
//! An [`AssetSource`] turns a URL into bytes; [`AssetLoader`] validates
//! them against [`AssetLimits`], decodes on the blocking pool, and bounds the
//! whole load by a timeout and a [`CancellationToken`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stage_core::ImageAsset;
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;

use crate::asset::{decode_image, parse_data_uri, AssetLimits};
use crate::cancel::{CancellationSource, CancellationToken};
use crate::error::{RenderError, RenderResult};

/// Default bound on a single image load.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw bytes fetched for an image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    /// Encoded payload.
    pub bytes: Vec<u8>,
    /// MIME type declared by the source, if any.
    pub mime: Option<String>,
}

/// Somewhere image bytes can be fetched from.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the encoded bytes behind `url`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::AssetLoad`] if the URL is unsupported or
    /// unreadable.
    async fn fetch(&self, url: &str) -> RenderResult<FetchedAsset>;
}

/// Resolves `data:` URIs, `file://` URLs and plain filesystem paths.
///
/// Files are never read past the size limit: the reported length is checked
/// first, and the read itself stops one byte after the limit so that special
/// files reporting no length stay bounded too.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAssetSource {
    limits: AssetLimits,
}

impl LocalAssetSource {
    /// Create a source enforcing `limits` while reading files.
    #[must_use]
    pub fn new(limits: AssetLimits) -> Self {
        Self { limits }
    }

    fn path_for(url: &str) -> RenderResult<PathBuf> {
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if let Some((scheme, _)) = url.split_once("://") {
            return Err(RenderError::AssetLoad(format!(
                "Unsupported URL scheme: {scheme}"
            )));
        }
        Ok(PathBuf::from(url))
    }

    async fn read_bounded(&self, path: &Path) -> RenderResult<Vec<u8>> {
        let io_error = |e: std::io::Error| {
            RenderError::AssetLoad(format!("Failed to read {}: {e}", path.display()))
        };
        let max = self.limits.max_bytes as u64;

        let file = tokio::fs::File::open(path).await.map_err(io_error)?;
        let len = file.metadata().await.map_err(io_error)?.len();
        if len > max {
            return Err(RenderError::AssetLoad(format!(
                "Image file {} is {len} bytes, limit is {max}",
                path.display()
            )));
        }

        let mut bytes = Vec::with_capacity(usize::try_from(len).unwrap_or_default());
        file.take(max + 1)
            .read_to_end(&mut bytes)
            .await
            .map_err(io_error)?;
        if bytes.len() as u64 > max {
            return Err(RenderError::AssetLoad(format!(
                "Image file {} is larger than the {max} byte limit",
                path.display()
            )));
        }
        Ok(bytes)
    }
}

#[async_trait]
impl AssetSource for LocalAssetSource {
    async fn fetch(&self, url: &str) -> RenderResult<FetchedAsset> {
        if url.starts_with("data:") {
            let uri = parse_data_uri(url)?;
            return Ok(FetchedAsset {
                bytes: uri.bytes,
                mime: Some(uri.mime),
            });
        }

        let path = Self::path_for(url)?;
        let bytes = self.read_bounded(&path).await?;
        tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(FetchedAsset { bytes, mime: None })
    }
}

/// Identifies a load started with `start_image_load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Raw ticket number.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "load#{}", self.0)
    }
}

/// A load running on its own task.
#[derive(Debug)]
pub struct PendingLoad {
    /// Ticket handed to the caller.
    pub ticket: LoadTicket,
    /// Requested URL, for diagnostics.
    pub url: String,
    cancel: CancellationSource,
    handle: JoinHandle<RenderResult<ImageAsset>>,
}

impl PendingLoad {
    /// Request cancellation of the task.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the result for at most `wait`.
    ///
    /// Returns `Err(self)` if the load is still running, so the caller can
    /// keep it.
    pub async fn join_within(mut self, wait: Duration) -> Result<RenderResult<ImageAsset>, Self> {
        match tokio::time::timeout(wait, &mut self.handle).await {
            Ok(joined) => Ok(joined.unwrap_or_else(|e| {
                Err(RenderError::AssetLoad(format!("Load task failed: {e}")))
            })),
            Err(_) => Err(self),
        }
    }

    /// Wait for the result with no bound beyond the load's own timeout.
    pub async fn join(self) -> RenderResult<ImageAsset> {
        self.handle
            .await
            .unwrap_or_else(|e| Err(RenderError::AssetLoad(format!("Load task failed: {e}"))))
    }
}

/// Fetches, validates and decodes images.
#[derive(Clone)]
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
    limits: AssetLimits,
    timeout: Duration,
    next_ticket: u64,
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("limits", &self.limits)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new(
            Arc::new(LocalAssetSource::default()),
            AssetLimits::default(),
            DEFAULT_LOAD_TIMEOUT,
        )
    }
}

impl AssetLoader {
    /// Create a loader over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn AssetSource>, limits: AssetLimits, timeout: Duration) -> Self {
        Self {
            source,
            limits,
            timeout,
            next_ticket: 1,
        }
    }

    /// The per-load timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Load one image, bounded by the timeout and `token`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::AssetLoad`] on fetch, validation or decode
    /// failure, on timeout, and on cancellation.
    pub async fn load(&self, url: &str, token: &CancellationToken) -> RenderResult<ImageAsset> {
        let work = async {
            let fetched = self.source.fetch(url).await?;
            self.limits
                .validate(&fetched.bytes, fetched.mime.as_deref())?;
            let bytes = fetched.bytes;
            let asset = tokio::task::spawn_blocking(move || decode_image(&bytes))
                .await
                .map_err(|e| RenderError::AssetLoad(format!("Decode task failed: {e}")))??;
            Ok::<_, RenderError>(asset)
        };

        tokio::select! {
            () = token.cancelled() => {
                tracing::debug!("Load of {} cancelled", short(url));
                Err(RenderError::AssetLoad("Load cancelled".to_string()))
            }
            outcome = tokio::time::timeout(self.timeout, work) => {
                outcome.map_err(|_| {
                    RenderError::AssetLoad(format!(
                        "Timed out after {}ms loading {}",
                        self.timeout.as_millis(),
                        short(url)
                    ))
                })?
            }
        }
    }

    /// Start a load on its own task.
    pub fn spawn(&mut self, url: String) -> PendingLoad {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;

        let cancel = CancellationSource::new();
        let token = cancel.token();
        let loader = self.clone();
        let task_url = url.clone();
        let handle = tokio::spawn(async move { loader.load(&task_url, &token).await });
        tracing::debug!("Started {ticket} for {}", short(&url));

        PendingLoad {
            ticket,
            url,
            cancel,
            handle,
        }
    }
}

/// Truncate long URLs (data URIs) for logs and messages.
pub(crate) fn short(url: &str) -> &str {
    const MAX: usize = 64;
    match url.char_indices().nth(MAX) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}
