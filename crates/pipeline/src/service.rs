//! Running pipeline: capture thread, processing context and watchdog

use crate::inference::LandmarkInference;
use crate::processor::{ControlCommand, FrameProcessor};
use crate::status::{StatusSink, StatusSnapshot, StatusUpdate};
use crate::watchdog::{run_watchdog, Heartbeat, StreamSupervisor, Watchdog};
use crate::{PipelineConfig, ServiceError};
use dispatcher::{CommandDispatcher, Effector};
use std::sync::{Arc, Mutex, PoisonError};
use storage::MappingStore;
use stream_capture::{CaptureConfig, CaptureError, CaptureEvent, FrameExtractor, StreamSource, VideoFrame};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

type Spawner = Arc<
    dyn Fn(&str, mpsc::Sender<VideoFrame>, mpsc::UnboundedSender<CaptureEvent>) -> Result<FrameExtractor, CaptureError>
        + Send
        + Sync,
>;

struct Inner {
    spawn_extractor: Spawner,
    /// Held across a whole start or stop so only one extractor is ever live
    stream_lock: tokio::sync::Mutex<()>,
    extractor: Mutex<Option<FrameExtractor>>,
    last_url: Mutex<Option<String>>,
    frames_tx: mpsc::Sender<VideoFrame>,
    events_tx: mpsc::UnboundedSender<CaptureEvent>,
    control_tx: mpsc::UnboundedSender<ControlCommand>,
    sink: StatusSink,
    heartbeat: Heartbeat,
    store: Arc<dyn MappingStore>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Handle to the running pipeline
#[derive(Clone)]
pub struct CabinService {
    inner: Arc<Inner>,
}

impl CabinService {
    /// Start the processing context and watchdog.
    ///
    /// No stream is opened until [`CabinService::start_stream`] is called.
    /// Must be called from within a Tokio runtime.
    pub fn spawn<S>(
        config: PipelineConfig,
        source: S,
        inference: Box<dyn LandmarkInference>,
        store: Arc<dyn MappingStore>,
        effector: Arc<dyn Effector>,
    ) -> Self
    where
        S: StreamSource + Clone + Sync,
    {
        let (frames_tx, frames_rx) = mpsc::channel(config.frame_queue.max(1));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sink = StatusSink::new(config.status_capacity);
        let heartbeat = Heartbeat::new();

        let capture: CaptureConfig = config.capture.clone();
        let spawn_extractor: Spawner = Arc::new(move |url, frames, events| {
            FrameExtractor::spawn(source.clone(), url, capture.clone(), frames, events)
        });

        let dispatcher = CommandDispatcher::new(config.dispatcher.clone(), store.clone(), effector);
        let processor = FrameProcessor::new(&config, inference, dispatcher, sink.clone(), heartbeat.clone());

        let service = Self {
            inner: Arc::new(Inner {
                spawn_extractor,
                stream_lock: tokio::sync::Mutex::new(()),
                extractor: Mutex::new(None),
                last_url: Mutex::new(None),
                frames_tx,
                events_tx,
                control_tx,
                sink: sink.clone(),
                heartbeat: heartbeat.clone(),
                store,
                shutdown_tx,
                tasks: Mutex::new(Vec::new()),
            }),
        };

        let tasks = vec![
            tokio::spawn(run_processor(processor, frames_rx, control_rx, shutdown_rx.clone())),
            tokio::spawn(run_capture_events(events_rx, sink.clone(), shutdown_rx.clone())),
            tokio::spawn(run_watchdog(
                Watchdog::new(config.watchdog.clone()),
                heartbeat,
                service.clone(),
                sink,
                shutdown_rx,
            )),
        ];
        *service.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner) = tasks;

        info!("Cabin service started");
        service
    }

    /// Replace the current stream with one reading from `url`
    pub async fn start_stream(&self, url: &str) -> Result<(), ServiceError> {
        let _guard = self.inner.stream_lock.lock().await;
        self.stop_current().await?;

        *self.inner.last_url.lock().unwrap_or_else(PoisonError::into_inner) = Some(url.to_string());
        // A fresh stream gets the full stall allowance
        self.inner
            .heartbeat
            .beat(tokio::time::Instant::now().into_std());

        info!("Starting stream: {}", url);
        let extractor = (self.inner.spawn_extractor)(
            url,
            self.inner.frames_tx.clone(),
            self.inner.events_tx.clone(),
        )?;
        let displaced = self
            .inner
            .extractor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(extractor);
        if let Some(old) = displaced {
            stop_extractor(old).await?;
        }
        Ok(())
    }

    /// Stop the current stream, if any. The recorded address is kept.
    pub async fn stop_stream(&self) -> Result<(), ServiceError> {
        let _guard = self.inner.stream_lock.lock().await;
        self.stop_current().await
    }

    /// Caller holds `stream_lock`
    async fn stop_current(&self) -> Result<(), ServiceError> {
        let extractor = self
            .inner
            .extractor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match extractor {
            Some(extractor) => stop_extractor(extractor).await,
            None => Ok(()),
        }
    }

    /// Reconnect to the last address
    pub async fn restart_stream(&self) -> Result<(), ServiceError> {
        let url = self.last_url().ok_or(ServiceError::NoSource)?;
        self.start_stream(&url).await
    }

    pub fn last_url(&self) -> Option<String> {
        self.inner
            .last_url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_streaming(&self) -> bool {
        self.inner
            .extractor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(false, FrameExtractor::is_running)
    }

    /// Ask the processing context to clear the calm-mode latch
    pub fn reset_calm_mode(&self) -> Result<(), ServiceError> {
        self.inner
            .control_tx
            .send(ControlCommand::ResetCalmMode)
            .map_err(|_| ServiceError::ChannelClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.inner.sink.subscribe()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.sink.snapshot()
    }

    pub fn mapping_store(&self) -> Arc<dyn MappingStore> {
        self.inner.store.clone()
    }

    /// Stop the stream and all background tasks
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Shutting down cabin service");
        self.inner.shutdown_tx.send_replace(true);
        self.stop_stream().await?;

        let tasks = std::mem::take(&mut *self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        for task in tasks {
            task.await?;
        }
        Ok(())
    }
}

impl StreamSupervisor for CabinService {
    fn has_source(&self) -> bool {
        self.last_url().is_some()
    }

    async fn restart(&self) {
        if let Err(e) = self.restart_stream().await {
            error!("Stream restart failed: {}", e);
            self.inner.sink.status(format!("Error: {}", e));
        }
    }
}

/// Stop an extractor off the async workers; the wait lasts up to the grace period
async fn stop_extractor(mut extractor: FrameExtractor) -> Result<(), ServiceError> {
    info!("Stopping stream: {}", extractor.url());
    let stopped = tokio::task::spawn_blocking(move || extractor.stop()).await?;
    if !stopped {
        metrics::counter!("capture_extractors_detached_total").increment(1);
    }
    Ok(())
}

/// Processing context: frames and control commands, one at a time
async fn run_processor(
    mut processor: FrameProcessor,
    mut frames: mpsc::Receiver<VideoFrame>,
    mut control: mpsc::UnboundedReceiver<ControlCommand>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Processing context started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            Some(command) = control.recv() => processor.handle_command(command),
            frame = frames.recv() => {
                let Some(frame) = frame else { break };
                let now = tokio::time::Instant::now().into_std();
                let result = tokio::task::spawn_blocking(move || {
                    processor.process_frame(&frame, now);
                    processor
                })
                .await;
                match result {
                    Ok(p) => processor = p,
                    Err(e) => {
                        error!("Frame processing panicked: {}", e);
                        return;
                    }
                }
            }
        }
    }

    info!("Processing context stopped");
}

/// Turn capture lifecycle events into status messages
async fn run_capture_events(
    mut events: mpsc::UnboundedReceiver<CaptureEvent>,
    sink: StatusSink,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.changed() => break,
            event = events.recv() => event,
        };
        match event {
            Some(CaptureEvent::Connected) => sink.status("Camera Connected"),
            Some(CaptureEvent::Error(reason)) => sink.status(format!("Error: {}", reason)),
            Some(CaptureEvent::Ended) => sink.status("Error: End of stream"),
            None => break,
        }
    }
}
