//! Test doubles for backends.

use crate::backend::{BackendId, BackendProvider, Transform};
use crate::config::ToolOptions;
use crate::error::TransformError;
use crate::job::JobEvent;
use crate::optimizer::Reporter;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Returns its input unchanged
pub struct Identity {
    name: String,
}

impl Identity {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

impl Transform for Identity {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, input: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, TransformError>> {
        Box::pin(async move { Ok(input) })
    }
}

/// Keeps the first half of the input
pub struct Halve;

impl Transform for Halve {
    fn name(&self) -> &str {
        "halve"
    }

    fn apply(&self, mut input: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, TransformError>> {
        Box::pin(async move {
            input.truncate(input.len() / 2);
            Ok(input)
        })
    }
}

/// Pads the input with `extra` bytes
pub struct Grow {
    pub extra: usize,
}

impl Transform for Grow {
    fn name(&self) -> &str {
        "grow"
    }

    fn apply(&self, mut input: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, TransformError>> {
        let extra = self.extra;
        Box::pin(async move {
            input.extend(std::iter::repeat(0u8).take(extra));
            Ok(input)
        })
    }
}

/// Fails when the input starts with `trigger`, identity otherwise
pub struct FailOn {
    pub trigger: Vec<u8>,
}

impl Transform for FailOn {
    fn name(&self) -> &str {
        "fail_on"
    }

    fn apply(&self, input: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, TransformError>> {
        Box::pin(async move {
            if input.starts_with(&self.trigger) {
                Err(TransformError::failed("fail_on", "malformed input"))
            } else {
                Ok(input)
            }
        })
    }
}

/// Sleeps before returning the input
pub struct Sleep {
    pub duration: Duration,
}

impl Transform for Sleep {
    fn name(&self) -> &str {
        "sleep"
    }

    fn apply(&self, input: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, TransformError>> {
        Box::pin(async move {
            tokio::time::sleep(self.duration).await;
            Ok(input)
        })
    }
}

/// Records the highest number of concurrent invocations
#[derive(Default)]
pub struct ConcurrencyProbe {
    running: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transform for ConcurrencyProbe {
    fn name(&self) -> &str {
        "probe"
    }

    fn apply(&self, input: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, TransformError>> {
        Box::pin(async move {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(input)
        })
    }
}

/// Hands out preconfigured transforms, counts how many it provided
#[derive(Default)]
pub struct FakeProvider {
    transforms: HashMap<BackendId, Arc<dyn Transform>>,
    provided: AtomicUsize,
}

impl FakeProvider {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: BackendId, transform: impl Transform + 'static) -> Self {
        self.transforms.insert(id, Arc::new(transform));
        self
    }

    pub fn with_shared(mut self, id: BackendId, transform: Arc<dyn Transform>) -> Self {
        self.transforms.insert(id, transform);
        self
    }

    pub fn provided(&self) -> usize {
        self.provided.load(Ordering::SeqCst)
    }
}

impl BackendProvider for FakeProvider {
    fn provide(&self, id: BackendId, _options: &ToolOptions) -> Result<Arc<dyn Transform>, TransformError> {
        self.provided.fetch_add(1, Ordering::SeqCst);
        self.transforms.get(&id).cloned().ok_or_else(|| TransformError::Unavailable {
            backend: id.name().to_string(),
            message: "not installed".to_string(),
        })
    }
}

/// Collects every event it receives
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<JobEvent>>,
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<JobEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

impl Reporter for RecordingReporter {
    fn batch_started(&self, _total: usize) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn job_finished(&self, event: &JobEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn batch_finished(&self, _result: &crate::job::BatchResult) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}
