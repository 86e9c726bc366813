//! Synthesis on dedicated worker threads
//!
//! Each worker owns an OS thread driving a current-thread runtime and a
//! private [`Pipeline`]. Requests arrive over a bounded queue and every
//! request receives exactly one reply on its own oneshot channel.

use crate::io::configuration::{MAX_WORKERS, OFFLOAD_QUEUE_CAPACITY, SynthesisConfig};
use crate::io::error::{Result, channel_error, invalid_parameter};
use crate::io::image::EncodedImage;
use crate::offload::protocol::{OffloadRequest, OffloadResponse, parse_request, to_json};
use crate::synthesis::backend::SynthesisBackend;
use crate::synthesis::options::TileOptions;
use crate::synthesis::pipeline::Pipeline;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

struct Envelope {
    request: OffloadRequest,
    reply: oneshot::Sender<OffloadResponse>,
}

/// Cloneable sender of requests to one worker
#[derive(Debug, Clone)]
pub struct OffloadHandle {
    sender: mpsc::Sender<Envelope>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("bytes", &self.request.image.len())
            .field("options", &self.request.options)
            .finish_non_exhaustive()
    }
}

impl OffloadHandle {
    /// Send one request and wait for its reply
    ///
    /// # Errors
    ///
    /// Returns [`Channel`](crate::SynthesisError::Channel) if the worker is
    /// gone before replying, or the worker's failure as rebuilt by
    /// [`OffloadResponse::into_result`]
    pub async fn submit(&self, request: OffloadRequest) -> Result<EncodedImage> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Envelope { request, reply })
            .await
            .map_err(|_closed| channel_error(&"worker stopped accepting requests"))?;
        response
            .await
            .map_err(|_dropped| channel_error(&"worker closed before responding"))?
            .into_result()
    }

    /// Whether the worker has shut down
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl SynthesisBackend for OffloadHandle {
    fn run(
        &self,
        image: Vec<u8>,
        options: TileOptions,
    ) -> impl Future<Output = Result<EncodedImage>> + Send {
        self.submit(OffloadRequest { image, options })
    }
}

/// One worker thread and the handle feeding it
#[derive(Debug)]
pub struct OffloadWorker {
    handle: OffloadHandle,
    thread: JoinHandle<()>,
}

impl OffloadWorker {
    /// Start a worker running a pipeline built from `config`
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error for a bad `config` and
    /// [`Channel`](crate::SynthesisError::Channel) if the runtime or thread
    /// cannot be created
    pub fn spawn(config: SynthesisConfig, cancel: CancellationToken) -> Result<Self> {
        Self::spawn_named(config, cancel, "seamtile-offload-0")
    }

    fn spawn_named(config: SynthesisConfig, cancel: CancellationToken, name: &str) -> Result<Self> {
        let pipeline = Pipeline::new(config)?.with_cancellation(cancel);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| channel_error(&format!("worker runtime: {e}")))?;
        let (sender, inbox) = mpsc::channel(OFFLOAD_QUEUE_CAPACITY);

        let thread = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || runtime.block_on(serve(pipeline, inbox)))
            .map_err(|e| channel_error(&format!("worker thread: {e}")))?;

        Ok(Self {
            handle: OffloadHandle { sender },
            thread,
        })
    }

    /// Handle for submitting requests
    pub fn handle(&self) -> OffloadHandle {
        self.handle.clone()
    }

    /// Stop accepting requests and wait for the thread to finish
    ///
    /// The thread exits once every outstanding handle has been dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Channel`](crate::SynthesisError::Channel) if the worker
    /// thread panicked
    pub fn shutdown(self) -> Result<()> {
        drop(self.handle);
        self.thread
            .join()
            .map_err(|_panic| channel_error(&"worker thread panicked"))
    }
}

async fn serve(pipeline: Pipeline, mut inbox: mpsc::Receiver<Envelope>) {
    while let Some(Envelope { request, reply }) = inbox.recv().await {
        let outcome = pipeline.synthesize(&request.image, &request.options).await;
        if let Err(e) = &outcome {
            debug!(error = %e, "offloaded synthesis failed");
        }
        if reply.send(OffloadResponse::from_result(outcome)).is_err() {
            debug!("requester dropped before the reply was sent");
        }
    }
    debug!("offload worker stopped");
}

/// Answer one raw JSON request with one raw JSON response
///
/// Malformed requests produce a failure response rather than an error.
///
/// # Errors
///
/// Returns [`Channel`](crate::SynthesisError::Channel) only if the response
/// itself cannot be serialized
pub async fn respond_to_message(pipeline: &Pipeline, message: &str) -> Result<String> {
    let response = match parse_request(message) {
        Ok(request) => OffloadResponse::from_result(
            pipeline
                .synthesize(&request.image, &request.options)
                .await,
        ),
        Err(e) => {
            warn!(error = %e, "rejecting offload message");
            OffloadResponse::from_error(&e)
        }
    };
    to_json(&response)
}

/// Fixed set of workers served round-robin
#[derive(Debug)]
pub struct OffloadPool {
    workers: Vec<OffloadWorker>,
    next: AtomicUsize,
}

impl OffloadPool {
    /// Start `count` workers sharing `config` and `cancel`
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if `count` is zero or above
    /// [`MAX_WORKERS`], or any error from [`OffloadWorker::spawn`]
    pub fn spawn(config: SynthesisConfig, count: usize, cancel: &CancellationToken) -> Result<Self> {
        if count == 0 || count > MAX_WORKERS {
            return Err(invalid_parameter(
                "workers",
                &count,
                &format!("must be within 1..={MAX_WORKERS}"),
            ));
        }

        let workers = (0..count)
            .map(|index| {
                OffloadWorker::spawn_named(
                    config,
                    cancel.clone(),
                    &format!("seamtile-offload-{index}"),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            workers,
            next: AtomicUsize::new(0),
        })
    }

    /// Number of workers
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether the pool has no workers
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Handle of the next worker in rotation
    ///
    /// # Errors
    ///
    /// Returns [`Channel`](crate::SynthesisError::Channel) if the pool is empty
    pub fn handle(&self) -> Result<OffloadHandle> {
        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.workers.len().max(1);
        self.workers
            .get(slot)
            .map(OffloadWorker::handle)
            .ok_or_else(|| channel_error(&"offload pool has no workers"))
    }

    /// Shut down every worker
    ///
    /// # Errors
    ///
    /// Returns the first worker shutdown failure
    pub fn shutdown(self) -> Result<()> {
        self.workers
            .into_iter()
            .map(OffloadWorker::shutdown)
            .collect::<Result<Vec<()>>>()
            .map(|_| ())
    }
}

impl SynthesisBackend for OffloadPool {
    fn run(
        &self,
        image: Vec<u8>,
        options: TileOptions,
    ) -> impl Future<Output = Result<EncodedImage>> + Send {
        let handle = self.handle();
        async move { handle?.submit(OffloadRequest { image, options }).await }
    }
}
