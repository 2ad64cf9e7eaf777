// SPDX-License-Identifier: GPL-3.0-only

//! Single-shot photo capture against a running session
//!
//! [`CaptureCoordinator::take_photo`] returns as soon as the shutter has been
//! issued. The hardware completes on its own worker, the payload is verified
//! off the async workers, and the result is handed to the caller's sink.
//!
//! Every sink runs on the coordinator's delivery task, one at a time, in
//! completion order. That holds for precondition failures too, so a sink
//! never runs inline on the thread that called `take_photo`.

use super::encoding::{self, EncodingFormat};
use crate::backends::camera::session::SessionController;
use crate::backends::camera::types::{PendingCapture, PhotoSettings, RawPhoto};
use crate::constants;
use crate::errors::CaptureError;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Unique id of one capture request
pub type RequestId = Uuid;

/// Outcome of one capture request
pub type CaptureResult = Result<Photo, CaptureError>;

/// Caller-supplied consumer of a capture outcome
pub type ResultSink = Box<dyn FnOnce(CaptureResult) + Send + 'static>;

/// A captured, verified still
///
/// The payload is opaque to the core: encoded bytes plus a format tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// Request this photo answers
    pub request_id: RequestId,
    /// Encoded image bytes, never empty
    pub data: Vec<u8>,
    pub format: EncodingFormat,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Local>,
}

/// One outstanding photo request
///
/// Owns the result sink until it fires. A request dropped without being
/// completed fires its sink with `CaptureHardwareFailure` from `Drop`, so the
/// sink runs exactly once on every path.
pub struct CaptureRequest {
    pub id: RequestId,
    pub settings: PhotoSettings,
    sink: Option<ResultSink>,
}

impl CaptureRequest {
    fn new(settings: PhotoSettings, sink: ResultSink) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            sink: Some(sink),
        }
    }

    /// Fire the sink with `result`, consuming the request
    fn complete(mut self, result: CaptureResult) {
        if let Some(sink) = self.sink.take() {
            Self::invoke(self.id, sink, result);
        }
    }

    fn invoke(id: RequestId, sink: ResultSink, result: CaptureResult) {
        match &result {
            Ok(photo) => debug!(request = %id, size = photo.data.len(), "Delivering photo"),
            Err(e) => debug!(request = %id, error = %e, "Delivering capture error"),
        }

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || sink(result)));
        if outcome.is_err() {
            error!(request = %id, "Result sink panicked");
        }
    }
}

impl Drop for CaptureRequest {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            warn!(request = %self.id, "Capture request abandoned before completion");
            Self::invoke(
                self.id,
                sink,
                Err(CaptureError::CaptureHardwareFailure(
                    "capture request abandoned".to_string(),
                )),
            );
        }
    }
}

impl std::fmt::Debug for CaptureRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureRequest")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .field("pending", &self.sink.is_some())
            .finish()
    }
}

/// A finished request waiting for the delivery task
struct Delivery {
    request: CaptureRequest,
    result: CaptureResult,
}

struct CoordinatorInner {
    session: SessionController,
    /// Runtime the coordinator was created on; `take_photo` may be called from any thread
    runtime: Handle,
    settings: PhotoSettings,
    timeout: Duration,
    deliveries: mpsc::UnboundedSender<Delivery>,
    in_flight: Mutex<HashSet<RequestId>>,
}

/// Issues captures and delivers their results exactly once
///
/// Must be created inside a Tokio runtime. The delivery task and the
/// per-request completion tasks are spawned on that runtime, so
/// `take_photo` itself can be called from any thread.
#[derive(Clone)]
pub struct CaptureCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl CaptureCoordinator {
    /// Create a coordinator with default photo settings and timeout
    pub fn new(session: SessionController) -> Self {
        Self::with_settings(
            session,
            PhotoSettings::default(),
            Duration::from_millis(constants::DEFAULT_CAPTURE_TIMEOUT_MS),
        )
    }

    /// Create a coordinator with explicit per-shot settings
    ///
    /// # Arguments
    /// * `session` - Controller whose running session captures are issued against
    /// * `settings` - Encoding requested for every shot
    /// * `timeout` - How long to wait for the hardware before reporting failure
    pub fn with_settings(
        session: SessionController,
        settings: PhotoSettings,
        timeout: Duration,
    ) -> Self {
        let runtime = Handle::current();
        let (deliveries, mut receiver) = mpsc::unbounded_channel::<Delivery>();

        runtime.spawn(async move {
            while let Some(delivery) = receiver.recv().await {
                delivery.request.complete(delivery.result);
            }
            debug!("Capture delivery task finished");
        });

        Self {
            inner: Arc::new(CoordinatorInner {
                session,
                runtime,
                settings,
                timeout,
                deliveries,
                in_flight: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Take a single photo
    ///
    /// Returns immediately. The sink fires exactly once, later, on the
    /// delivery task.
    ///
    /// # Returns
    /// * `Ok(RequestId)` - Shutter issued; success or a hardware/decode error follows through the sink
    /// * `Err(CaptureError::SessionNotRunning)` - Nothing issued; the sink also receives this error
    /// * `Err(CaptureError::NoSinkBound)` - Nothing issued, nothing delivered
    pub fn take_photo(&self, sink: Option<ResultSink>) -> Result<RequestId, CaptureError> {
        CoordinatorInner::take_photo(&self.inner, sink)
    }

    /// Take a photo and wait for its result
    pub async fn capture(&self) -> CaptureResult {
        let (sender, receiver) = oneshot::channel();
        let sink: ResultSink = Box::new(move |result| {
            let _ = sender.send(result);
        });

        // The sink reports every outcome, including a refused shutter
        let _ = self.take_photo(Some(sink));

        receiver.await.unwrap_or_else(|_| {
            Err(CaptureError::CaptureHardwareFailure(
                "result sink dropped".to_string(),
            ))
        })
    }

    /// Number of requests issued to the hardware and not yet delivered
    pub fn in_flight(&self) -> usize {
        self.inner.lock_in_flight().len()
    }

    /// Non-owning shutter trigger for UI code
    pub fn shutter(&self) -> Shutter {
        Shutter {
            coordinator: Arc::downgrade(&self.inner),
            runtime: self.inner.runtime.clone(),
        }
    }

    /// The session this coordinator captures from
    pub fn session(&self) -> &SessionController {
        &self.inner.session
    }
}

impl CoordinatorInner {
    fn take_photo(this: &Arc<Self>, sink: Option<ResultSink>) -> Result<RequestId, CaptureError> {
        let Some(sink) = sink else {
            warn!("Capture requested without a result sink");
            return Err(CaptureError::NoSinkBound);
        };

        let request = CaptureRequest::new(this.settings, sink);
        let id = request.id;

        match this.session.issue_capture(&request.settings) {
            Ok(pending) => {
                info!(request = %id, format = ?request.settings.format, "Capture issued");
                this.lock_in_flight().insert(id);

                let inner = Arc::clone(this);
                let format = request.settings.format;
                this.runtime.spawn(async move {
                    let result = inner.await_completion(id, format, pending).await;
                    inner.lock_in_flight().remove(&id);
                    inner.dispatch(Delivery { request, result });
                });
                Ok(id)
            }
            Err(CaptureError::SessionNotRunning) => {
                warn!(request = %id, "Capture requested while session not running");
                this.dispatch(Delivery {
                    request,
                    result: Err(CaptureError::SessionNotRunning),
                });
                Err(CaptureError::SessionNotRunning)
            }
            Err(e) => {
                warn!(request = %id, error = %e, "Hardware refused capture");
                this.dispatch(Delivery {
                    request,
                    result: Err(e),
                });
                Ok(id)
            }
        }
    }

    /// Wait for the hardware and verify what it returned
    async fn await_completion(
        &self,
        id: RequestId,
        format: EncodingFormat,
        pending: PendingCapture,
    ) -> CaptureResult {
        let raw = match tokio::time::timeout(self.timeout, pending).await {
            Ok(Ok(Ok(raw))) => raw,
            Ok(Ok(Err(e))) => return Err(e.into()),
            Ok(Err(_canceled)) => {
                return Err(CaptureError::CaptureHardwareFailure(
                    "hardware dropped the capture".to_string(),
                ));
            }
            Err(_elapsed) => {
                return Err(CaptureError::CaptureHardwareFailure(format!(
                    "no completion within {:?}",
                    self.timeout
                )));
            }
        };

        Self::decode(id, format, raw).await
    }

    async fn decode(id: RequestId, expected: EncodingFormat, raw: RawPhoto) -> CaptureResult {
        let RawPhoto { data, format } = raw;
        if format != expected {
            return Err(CaptureError::DecodeFailed(format!(
                "requested {:?}, hardware returned {:?}",
                expected, format
            )));
        }

        // Decoding is CPU-bound
        tokio::task::spawn_blocking(move || {
            let info = encoding::decode(&data, expected).map_err(CaptureError::DecodeFailed)?;
            Ok(Photo {
                request_id: id,
                data,
                format: expected,
                width: info.width,
                height: info.height,
                captured_at: Local::now(),
            })
        })
        .await
        .map_err(|e| CaptureError::DecodeFailed(format!("decode task error: {}", e)))?
    }

    fn dispatch(&self, delivery: Delivery) {
        if let Err(mpsc::error::SendError(delivery)) = self.deliveries.send(delivery) {
            // Delivery task is gone (runtime shutting down); deliver here instead
            delivery.request.complete(delivery.result);
        }
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<RequestId>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Weak shutter handle
///
/// Lets a view trigger captures without keeping the coordinator alive.
#[derive(Clone)]
pub struct Shutter {
    coordinator: Weak<CoordinatorInner>,
    runtime: Handle,
}

impl Shutter {
    /// Trigger a capture if the coordinator still exists
    ///
    /// When it does not, the sink still receives `SessionNotRunning`, from a
    /// task on the coordinator's runtime rather than inline.
    pub fn press(&self, sink: ResultSink) -> Result<RequestId, CaptureError> {
        match self.coordinator.upgrade() {
            Some(inner) => CoordinatorInner::take_photo(&inner, Some(sink)),
            None => {
                debug!("Shutter pressed after coordinator was dropped");
                let request = CaptureRequest::new(PhotoSettings::default(), sink);
                self.runtime.spawn(async move {
                    request.complete(Err(CaptureError::SessionNotRunning));
                });
                Err(CaptureError::SessionNotRunning)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::synthetic::{SyntheticBackend, SyntheticConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn running_session() -> (SessionController, crate::backends::camera::synthetic::SyntheticFaults) {
        let backend = SyntheticBackend::new(SyntheticConfig {
            capture_latency: Duration::from_millis(5),
            ..SyntheticConfig::default()
        });
        let faults = backend.faults();
        let session = SessionController::new(Box::new(backend));
        session.configure().unwrap();
        session.start().unwrap();
        (session, faults)
    }

    #[tokio::test]
    async fn test_capture_delivers_photo() {
        let (session, _faults) = running_session();
        let coordinator = CaptureCoordinator::new(session.clone());

        let photo = coordinator.capture().await.unwrap();
        assert!(!photo.data.is_empty());
        assert_eq!(photo.format, EncodingFormat::Jpeg);
        assert_eq!((photo.width, photo.height), (320, 240));
        assert_eq!(coordinator.in_flight(), 0);
        session.stop();
    }

    #[tokio::test]
    async fn test_missing_sink_is_rejected() {
        let (session, _faults) = running_session();
        let coordinator = CaptureCoordinator::new(session.clone());

        assert_eq!(coordinator.take_photo(None), Err(CaptureError::NoSinkBound));
        assert_eq!(coordinator.in_flight(), 0);
        session.stop();
    }

    #[tokio::test]
    async fn test_not_running_reports_through_sink() {
        let (session, _faults) = running_session();
        session.stop();
        let coordinator = CaptureCoordinator::new(session);

        let (tx, rx) = oneshot::channel();
        let result = coordinator.take_photo(Some(Box::new(move |r| {
            let _ = tx.send(r);
        })));

        assert_eq!(result, Err(CaptureError::SessionNotRunning));
        assert_eq!(rx.await.unwrap(), Err(CaptureError::SessionNotRunning));
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_decode_failure() {
        let (session, faults) = running_session();
        faults.set_corrupt_payload(true);
        let coordinator = CaptureCoordinator::new(session.clone());

        let result = coordinator.capture().await;
        assert!(matches!(result, Err(CaptureError::DecodeFailed(_))));
        assert!(session.is_running());
        session.stop();
    }

    #[tokio::test]
    async fn test_dropped_request_still_fires_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);

        let request = CaptureRequest::new(
            PhotoSettings::default(),
            Box::new(move |result| {
                assert!(matches!(result, Err(CaptureError::CaptureHardwareFailure(_))));
                fired_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        drop(request);

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutter_after_coordinator_dropped() {
        let (session, _faults) = running_session();
        let coordinator = CaptureCoordinator::new(session.clone());
        let shutter = coordinator.shutter();
        drop(coordinator);

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);
        let (tx, rx) = oneshot::channel();
        let result = shutter.press(Box::new(move |r| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(r);
        }));

        assert_eq!(result, Err(CaptureError::SessionNotRunning));
        // Delivered later on the runtime, never inline
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(rx.await.unwrap(), Err(CaptureError::SessionNotRunning));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        session.stop();
    }

    #[test]
    fn test_take_photo_from_thread_without_runtime() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let (session, _faults) = running_session();
        let coordinator = rt.block_on(async { CaptureCoordinator::new(session.clone()) });

        let (tx, rx) = oneshot::channel();
        let caller = coordinator.clone();
        let issued = std::thread::spawn(move || {
            caller.take_photo(Some(Box::new(move |r| {
                let _ = tx.send(r);
            })))
        })
        .join()
        .unwrap();

        assert!(issued.is_ok());
        let photo = rt.block_on(rx).unwrap().unwrap();
        assert_eq!(Some(photo.request_id), issued.ok());
        session.stop();
    }
}
