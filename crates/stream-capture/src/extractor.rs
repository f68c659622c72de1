//! Frame extractor thread
//!
//! Owns the network read for one stream. The thread runs a single-threaded
//! runtime so that a pending read can be abandoned as soon as a stop is
//! requested; dropping the stream closes the connection.

use crate::frame::{decode_jpeg, VideoFrame};
use crate::framer::JpegFramer;
use crate::source::{ChunkStream, StreamSource};
use crate::{CaptureConfig, CaptureError, CaptureEvent};
use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Log progress every this many bytes read
const PROGRESS_LOG_BYTES: u64 = 200_000;

/// Handle to a running extractor thread
pub struct FrameExtractor {
    url: String,
    stop_tx: watch::Sender<bool>,
    /// Disconnects when the thread exits (its sender is dropped)
    done_rx: std_mpsc::Receiver<()>,
    handle: Option<JoinHandle<()>>,
    grace: Duration,
}

impl FrameExtractor {
    /// Spawn the extractor thread for `url`.
    ///
    /// Decoded frames are offered to `frames` without blocking; when the
    /// processing queue is full the frame is dropped. Connection lifecycle
    /// is reported on `events`.
    pub fn spawn<S: StreamSource>(
        source: S,
        url: impl Into<String>,
        config: CaptureConfig,
        frames: mpsc::Sender<VideoFrame>,
        events: mpsc::UnboundedSender<CaptureEvent>,
    ) -> Result<Self, CaptureError> {
        let url = url.into();
        let (stop_tx, stop_rx) = watch::channel(false);
        let (done_tx, done_rx) = std_mpsc::sync_channel::<()>(1);
        let grace = config.stop_grace();

        let thread_url = url.clone();
        let handle = std::thread::Builder::new()
            .name("frame-extractor".to_string())
            .spawn(move || {
                let _done = done_tx;
                run_capture(source, thread_url, config, frames, events, stop_rx);
            })
            .map_err(|e| CaptureError::Thread(e.to_string()))?;

        Ok(Self {
            url,
            stop_tx,
            done_rx,
            handle: Some(handle),
            grace,
        })
    }

    /// Address this extractor is reading from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the thread is still running
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Signal the thread to stop and wait at most the grace period.
    ///
    /// Returns `false` if the thread did not exit in time; it is then
    /// detached and will exit on its own once it observes the signal.
    pub fn stop(&mut self) -> bool {
        self.stop_tx.send_replace(true);

        let Some(handle) = self.handle.take() else {
            return true;
        };

        match self.done_rx.recv_timeout(self.grace) {
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Frame extractor did not stop within {}ms, detaching",
                    self.grace.as_millis()
                );
                false
            }
            _ => {
                if handle.join().is_err() {
                    error!("Frame extractor thread panicked");
                }
                info!("Frame extractor stopped ({})", self.url);
                true
            }
        }
    }
}

impl Drop for FrameExtractor {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

fn run_capture<S: StreamSource>(
    source: S,
    url: String,
    config: CaptureConfig,
    frames: mpsc::Sender<VideoFrame>,
    events: mpsc::UnboundedSender<CaptureEvent>,
    stop_rx: watch::Receiver<bool>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to build extractor runtime: {}", e);
            let _ = events.send(CaptureEvent::Error(e.to_string()));
            return;
        }
    };

    let emitter = FrameEmitter {
        downsample: config.downsample,
        frames,
        sequence: 0,
    };
    runtime.block_on(capture_loop(source, url, config, emitter, events, stop_rx));
}

async fn capture_loop<S: StreamSource>(
    source: S,
    url: String,
    config: CaptureConfig,
    mut emitter: FrameEmitter,
    events: mpsc::UnboundedSender<CaptureEvent>,
    mut stop_rx: watch::Receiver<bool>,
) {
    debug!("Attempting connection to {}", url);

    let opened = tokio::select! {
        opened = source.open(&url) => opened,
        _ = stop_rx.changed() => {
            debug!("Stop requested before stream opened");
            return;
        }
    };

    let mut stream = match opened {
        Ok(stream) => stream,
        Err(e) => {
            error!("Stream error: {}", e);
            let _ = events.send(CaptureEvent::Error(e.to_string()));
            return;
        }
    };
    let _ = events.send(CaptureEvent::Connected);

    let mut framer = JpegFramer::new(config.window_size);
    let mut total_read: u64 = 0;

    loop {
        let next = tokio::select! {
            next = stream.next_chunk() => next,
            _ = stop_rx.changed() => break,
        };

        match next {
            Ok(Some(chunk)) => {
                let before = total_read / PROGRESS_LOG_BYTES;
                total_read += chunk.len() as u64;
                if total_read / PROGRESS_LOG_BYTES != before {
                    debug!("Streaming data... Total: {}", total_read);
                }
                feed(&mut framer, &chunk, &mut emitter);
            }
            Ok(None) => {
                warn!("End of stream");
                let _ = events.send(CaptureEvent::Ended);
                break;
            }
            Err(e) => {
                error!("Stream error: {}", e);
                let _ = events.send(CaptureEvent::Error(e.to_string()));
                break;
            }
        }
    }

    info!(
        total_read,
        frames = emitter.sequence,
        overflows = framer.overflow_count(),
        "Capture loop finished"
    );
}

/// Push a chunk through the window, emitting every complete image
fn feed(framer: &mut JpegFramer, mut chunk: &[u8], emitter: &mut FrameEmitter) {
    while !chunk.is_empty() {
        let taken = framer.extend(chunk);
        chunk = &chunk[taken..];

        while let Some(jpeg) = framer.next_image() {
            emitter.emit(&jpeg);
        }

        if framer.is_full() {
            warn!("Buffer overflow, dropping {} bytes", framer.buffered());
            metrics::counter!("capture_buffer_overflows_total").increment(1);
            framer.discard();
        }
    }
}

struct FrameEmitter {
    downsample: u32,
    frames: mpsc::Sender<VideoFrame>,
    sequence: u64,
}

impl FrameEmitter {
    fn emit(&mut self, jpeg: &[u8]) {
        match decode_jpeg(jpeg, self.downsample, self.sequence) {
            Ok(frame) => {
                self.sequence += 1;
                metrics::counter!("capture_frames_decoded_total").increment(1);
                match self.frames.try_send(frame) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!("Processing queue full, frame dropped");
                        metrics::counter!("capture_frames_dropped_total").increment(1);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!("Frame receiver closed");
                    }
                }
            }
            Err(e) => {
                warn!("Decode error: {}", e);
                metrics::counter!("capture_decode_errors_total").increment(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::tests::solid_jpeg;
    use std::collections::VecDeque;
    use std::time::Instant;

    /// In-memory source: yields the chunks, then ends or hangs forever
    struct MemorySource {
        chunks: Vec<Vec<u8>>,
        hang: bool,
        fail_open: bool,
    }

    struct MemoryStream {
        chunks: VecDeque<Vec<u8>>,
        hang: bool,
    }

    impl StreamSource for MemorySource {
        type Stream = MemoryStream;

        async fn open(&self, _url: &str) -> Result<MemoryStream, CaptureError> {
            if self.fail_open {
                return Err(CaptureError::Http(404));
            }
            Ok(MemoryStream {
                chunks: self.chunks.clone().into(),
                hang: self.hang,
            })
        }
    }

    impl ChunkStream for MemoryStream {
        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, CaptureError> {
            match self.chunks.pop_front() {
                Some(chunk) => Ok(Some(chunk)),
                None if self.hang => std::future::pending().await,
                None => Ok(None),
            }
        }
    }

    fn channels() -> (
        mpsc::Sender<VideoFrame>,
        mpsc::Receiver<VideoFrame>,
        mpsc::UnboundedSender<CaptureEvent>,
        mpsc::UnboundedReceiver<CaptureEvent>,
    ) {
        let (frame_tx, frame_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (frame_tx, frame_rx, event_tx, event_rx)
    }

    #[test]
    fn test_extracts_frames_across_chunk_boundaries() {
        let mut stream = solid_jpeg(64, 64, [0, 255, 0]);
        stream.extend(solid_jpeg(64, 64, [255, 0, 0]));
        let chunks: Vec<Vec<u8>> = stream.chunks(97).map(|c| c.to_vec()).collect();

        let (frame_tx, mut frame_rx, event_tx, mut event_rx) = channels();
        let source = MemorySource { chunks, hang: false, fail_open: false };
        let mut extractor = FrameExtractor::spawn(
            source,
            "mem://cabin",
            CaptureConfig::default(),
            frame_tx,
            event_tx,
        )
        .unwrap();

        let first = frame_rx.blocking_recv().unwrap();
        let second = frame_rx.blocking_recv().unwrap();
        assert_eq!((first.width, first.height), (16, 16));
        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert!(first.get_pixel(8, 8).unwrap()[1] > 200);
        assert!(second.get_pixel(8, 8).unwrap()[0] > 200);

        assert_eq!(event_rx.blocking_recv(), Some(CaptureEvent::Connected));
        assert_eq!(event_rx.blocking_recv(), Some(CaptureEvent::Ended));
        assert!(extractor.stop());
    }

    #[test]
    fn test_corrupt_frame_is_skipped() {
        let mut stream = vec![0xFF, 0xD8, 0x01, 0x02, 0xFF, 0xD9];
        stream.extend(solid_jpeg(32, 32, [0, 0, 255]));

        let (frame_tx, mut frame_rx, event_tx, _event_rx) = channels();
        let source = MemorySource { chunks: vec![stream], hang: false, fail_open: false };
        let _extractor =
            FrameExtractor::spawn(source, "mem://cabin", CaptureConfig::default(), frame_tx, event_tx)
                .unwrap();

        let frame = frame_rx.blocking_recv().unwrap();
        assert_eq!(frame.sequence, 0);
        assert!(frame.get_pixel(4, 4).unwrap()[2] > 200);
        assert!(frame_rx.blocking_recv().is_none());
    }

    #[test]
    fn test_window_overflow_discards_and_resumes() {
        let config = CaptureConfig::default();
        // An image that never terminates, longer than the whole window
        let mut stream = vec![0xFF, 0xD8];
        stream.extend(std::iter::repeat(0u8).take(config.window_size + 50_000));
        let mut chunks: Vec<Vec<u8>> = stream.chunks(64 * 1024).map(|c| c.to_vec()).collect();
        chunks.push(solid_jpeg(64, 64, [255, 0, 0]));

        let (frame_tx, mut frame_rx, event_tx, _event_rx) = channels();
        let source = MemorySource { chunks, hang: false, fail_open: false };
        let _extractor =
            FrameExtractor::spawn(source, "mem://cabin", config, frame_tx, event_tx).unwrap();

        let frame = frame_rx.blocking_recv().unwrap();
        assert_eq!(frame.sequence, 0);
        assert!(frame.get_pixel(8, 8).unwrap()[0] > 200);
        assert!(frame_rx.blocking_recv().is_none());
    }

    #[test]
    fn test_open_failure_reports_error_without_frames() {
        let (frame_tx, mut frame_rx, event_tx, mut event_rx) = channels();
        let source = MemorySource { chunks: vec![], hang: false, fail_open: true };
        let mut extractor =
            FrameExtractor::spawn(source, "mem://cabin", CaptureConfig::default(), frame_tx, event_tx)
                .unwrap();

        assert_eq!(
            event_rx.blocking_recv(),
            Some(CaptureEvent::Error("Connection Failed: HTTP 404".to_string()))
        );
        assert!(frame_rx.blocking_recv().is_none());
        assert!(extractor.stop());
    }

    #[test]
    fn test_stop_interrupts_pending_read() {
        let (frame_tx, _frame_rx, event_tx, mut event_rx) = channels();
        let source = MemorySource { chunks: vec![vec![0u8; 16]], hang: true, fail_open: false };
        let config = CaptureConfig::default();
        let grace = config.stop_grace();
        let mut extractor =
            FrameExtractor::spawn(source, "mem://cabin", config, frame_tx, event_tx).unwrap();

        assert_eq!(event_rx.blocking_recv(), Some(CaptureEvent::Connected));
        assert!(extractor.is_running());

        let started = Instant::now();
        assert!(extractor.stop());
        assert!(started.elapsed() < grace);
        assert!(!extractor.is_running());
        // Second stop is a no-op
        assert!(extractor.stop());
    }
}
