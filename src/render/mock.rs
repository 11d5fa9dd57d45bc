/*!
 * Scriptable toolchain for testing.
 *
 * `FakeToolchain` never spawns processes. Its probe result and the outcome of
 * each encode path are configured up front, and every encode request is
 * recorded so tests can assert on the retry sequence:
 * - `FakeToolchain::new(res)` - probe succeeds, both paths succeed
 * - `.failing_accelerated()` / `.failing_software()` - that path exits non-zero
 * - `.failing_probe(msg)` - geometry cannot be determined
 * - `.without_hardware()` - the accelerated codec is not listed
 * - `.with_encode_delay(d)` - each encode takes `d`, so overlapping encodes
 *   can be observed through `peak_accelerated()` and `peak_encodes()`
 */

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::RenderError;
use crate::render::EncodePath;
use crate::render::encoder::EncodeRequest;
use crate::render::resolution::Resolution;
use crate::render::toolchain::MediaToolchain;

/// Bytes written to the output on a simulated successful encode
pub const FAKE_RENDER_BYTES: &[u8] = b"fake rendered video";

/// Fake media toolchain with configurable outcomes
#[derive(Debug, Clone)]
pub struct FakeToolchain {
    probe: Result<Resolution, String>,
    hardware_available: bool,
    accelerated_fails: bool,
    software_fails: bool,
    requests: Arc<Mutex<Vec<EncodeRequest>>>,
    encode_delay: Option<Duration>,
    accelerated_gauge: Arc<Gauge>,
    encode_gauge: Arc<Gauge>,
}

// @struct: Current and peak count of in-flight encodes
#[derive(Debug, Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl FakeToolchain {
    /// Probe reports `native`, every encode succeeds
    pub fn new(native: Resolution) -> Self {
        Self {
            probe: Ok(native),
            hardware_available: true,
            accelerated_fails: false,
            software_fails: false,
            requests: Arc::new(Mutex::new(Vec::new())),
            encode_delay: None,
            accelerated_gauge: Arc::new(Gauge::default()),
            encode_gauge: Arc::new(Gauge::default()),
        }
    }

    pub fn failing_probe(mut self, message: &str) -> Self {
        self.probe = Err(message.to_string());
        self
    }

    pub fn failing_accelerated(mut self) -> Self {
        self.accelerated_fails = true;
        self
    }

    pub fn failing_software(mut self) -> Self {
        self.software_fails = true;
        self
    }

    pub fn without_hardware(mut self) -> Self {
        self.hardware_available = false;
        self
    }

    /// Every encode sleeps for `delay` before finishing
    pub fn with_encode_delay(mut self, delay: Duration) -> Self {
        self.encode_delay = Some(delay);
        self
    }

    /// Most accelerated encodes ever running at the same time
    pub fn peak_accelerated(&self) -> usize {
        self.accelerated_gauge.peak()
    }

    /// Most encodes of either path ever running at the same time
    pub fn peak_encodes(&self) -> usize {
        self.encode_gauge.peak()
    }

    /// Every encode request received, in order
    pub fn requests(&self) -> Vec<EncodeRequest> {
        self.requests.lock().clone()
    }

    /// Encode paths attempted, in order
    pub fn attempted_paths(&self) -> Vec<EncodePath> {
        self.requests.lock().iter().map(|r| r.path).collect()
    }
}

#[async_trait]
impl MediaToolchain for FakeToolchain {
    async fn probe_dimensions(&self, _path: &Path) -> Result<Resolution, RenderError> {
        self.probe.clone().map_err(RenderError::ProbeFailed)
    }

    async fn has_encoder(&self, _codec: &str) -> bool {
        self.hardware_available
    }

    async fn encode(&self, request: &EncodeRequest) -> Result<(), RenderError> {
        self.requests.lock().push(request.clone());

        if let Some(delay) = self.encode_delay {
            let accelerated = request.path == EncodePath::Accelerated;
            self.encode_gauge.enter();
            if accelerated {
                self.accelerated_gauge.enter();
            }
            tokio::time::sleep(delay).await;
            if accelerated {
                self.accelerated_gauge.leave();
            }
            self.encode_gauge.leave();
        }

        let fails = match request.path {
            EncodePath::Accelerated => self.accelerated_fails,
            EncodePath::Software => self.software_fails,
        };

        if fails {
            // Real encoders leave truncated files behind
            std::fs::write(&request.output, b"partial")?;
            return Err(RenderError::EncodeFailed {
                path: request.path,
                message: "simulated non-zero exit".to_string(),
            });
        }

        std::fs::write(&request.output, FAKE_RENDER_BYTES)?;
        Ok(())
    }
}
