//! A depth-one decode queue.
//!
//! Decoding runs on one dedicated worker thread, so at most one decode
//! executes at a time and callers never block. Submitting a new request
//! supersedes the one in flight: its cancellation token is set and its
//! result, if it finishes anyway, is discarded. Last request wins, not
//! last to finish.

use crate::decoder::{decode, CancelToken, DecodeOutcome};
use crate::errors::EnvelopeError;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Invoked on the worker thread with the originating request identity
/// and the decode result. Never invoked for superseded or cancelled
/// requests.
pub type DecodeCallback = Box<dyn FnOnce(&str, Result<DecodeOutcome, EnvelopeError>) + Send>;

struct Job {
    generation: u64,
    request: String,
    payload: Vec<u8>,
    cancel: CancelToken,
    callback: DecodeCallback,
}

pub struct DecodeQueue {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    generation: Arc<AtomicU64>,
    current_cancel: Mutex<CancelToken>,
}

impl DecodeQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let generation = Arc::new(AtomicU64::new(0));
        let latest = Arc::clone(&generation);

        let worker = std::thread::spawn(move || {
            for job in receiver {
                // Superseded while still queued: skip without decoding.
                if latest.load(Ordering::SeqCst) != job.generation {
                    debug!("skipping superseded decode for request {}", job.request);
                    continue;
                }

                let result = decode(&job.payload, &job.cancel);

                // Superseded or cancelled while decoding: the result is
                // stale and must not be published.
                if latest.load(Ordering::SeqCst) != job.generation || job.cancel.is_cancelled() {
                    debug!("discarding stale decode result for request {}", job.request);
                    continue;
                }

                (job.callback)(&job.request, result);
            }
        });

        Self {
            sender: Some(sender),
            worker: Some(worker),
            generation,
            current_cancel: Mutex::new(CancelToken::new()),
        }
    }

    /// Enqueues a decode of `payload` and returns immediately. The
    /// in-flight decode, if any, is cancelled. `request` identifies the
    /// originating query; it is handed back to the callback so callers
    /// can discard results they no longer care about.
    pub fn submit(
        &self,
        request: impl Into<String>,
        payload: Vec<u8>,
        callback: impl FnOnce(&str, Result<DecodeOutcome, EnvelopeError>) + Send + 'static,
    ) {
        let cancel = CancelToken::new();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut current = self.current_cancel.lock().unwrap();
            current.cancel();
            *current = cancel.clone();
        }

        let job = Job {
            generation,
            request: request.into(),
            payload,
            cancel,
            callback: Box::new(callback),
        };

        if let Some(sender) = &self.sender {
            // The worker lives as long as the queue, so this only fails
            // during teardown.
            let _ = sender.send(job);
        }
    }

    /// Cancels the decode in flight and invalidates anything still
    /// queued, without submitting a replacement.
    pub fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.current_cancel.lock().unwrap().cancel();
    }
}

impl Default for DecodeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DecodeQueue {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop.
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
