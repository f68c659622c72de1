//! Byte stream sources for the extractor thread

use crate::{CaptureConfig, CaptureError};
use std::time::Duration;
use tracing::{debug, info};

/// An open byte stream yielding chunks until the remote end closes it.
///
/// Futures are polled on the extractor thread's own runtime and need not be
/// `Send`.
#[allow(async_fn_in_trait)]
pub trait ChunkStream {
    /// Next chunk of bytes, `None` at end of stream
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, CaptureError>;
}

/// Opens byte streams for a caller-supplied address
#[allow(async_fn_in_trait)]
pub trait StreamSource: Send + 'static {
    type Stream: ChunkStream;

    async fn open(&self, url: &str) -> Result<Self::Stream, CaptureError>;
}

/// HTTP MJPEG source (e.g. an IP webcam `/video` endpoint)
#[derive(Debug, Clone)]
pub struct HttpStreamSource {
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl HttpStreamSource {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
        }
    }
}

impl Default for HttpStreamSource {
    fn default() -> Self {
        Self::new(&CaptureConfig::default())
    }
}

impl StreamSource for HttpStreamSource {
    type Stream = HttpStream;

    async fn open(&self, url: &str) -> Result<HttpStream, CaptureError> {
        // One client per connection: pooled connections must not outlive the
        // extractor thread's runtime.
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| CaptureError::Open(e.to_string()))?;

        let response = tokio::time::timeout(self.connect_timeout, client.get(url).send())
            .await
            .map_err(|_| CaptureError::Timeout(self.connect_timeout.as_millis() as u64))?
            .map_err(|e| CaptureError::Open(e.to_string()))?;

        let status = response.status();
        debug!("Response Code: {}", status.as_u16());
        if !status.is_success() {
            return Err(CaptureError::Http(status.as_u16()));
        }

        info!("Connected to stream {}", url);
        Ok(HttpStream {
            response,
            read_timeout: self.read_timeout,
        })
    }
}

/// Body of an HTTP MJPEG response
pub struct HttpStream {
    response: reqwest::Response,
    read_timeout: Duration,
}

impl ChunkStream for HttpStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, CaptureError> {
        match tokio::time::timeout(self.read_timeout, self.response.chunk()).await {
            Ok(Ok(chunk)) => Ok(chunk.map(|bytes| bytes.to_vec())),
            Ok(Err(e)) => Err(CaptureError::Stream(e.to_string())),
            Err(_) => Err(CaptureError::Timeout(self.read_timeout.as_millis() as u64)),
        }
    }
}
