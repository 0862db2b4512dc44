//! Shared scripted mocks for the contract tests
//!
//! Each mock is a cheap `Clone` over shared inner state so a test can
//! keep a handle for assertions while the agent owns another.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use rotip_core::traits::{
    Command, ControlPlane, IpChangeReport, PlatformControl, PublicIpResolver, Registration,
    StatusUpdate,
};
use rotip_core::{Error, LoopConfig, RotationConfig};

/// Rotation config with zeroed delays for fast tests
pub fn fast_rotation_config() -> RotationConfig {
    RotationConfig {
        settle_on_ms: 0,
        settle_off_ms: 0,
        max_confirm_attempts: 15,
        confirm_poll_ms: 0,
    }
}

/// Loop config with a short tick for fast tests
pub fn fast_loop_config() -> LoopConfig {
    LoopConfig {
        command_interval_secs: 5,
        status_interval_secs: 30,
        tick_interval_ms: 100,
        error_backoff_secs: 5,
    }
}

/// Resolver that replays a scripted sequence of outcomes
///
/// Each `resolve()` consumes one script entry (`Some(ip)` = resolved,
/// `None` = unresolved). When the script runs out, the configured default
/// outcome repeats forever.
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    inner: Arc<ResolverInner>,
}

#[derive(Default)]
struct ResolverInner {
    script: Mutex<VecDeque<Option<Ipv4Addr>>>,
    default: Mutex<Option<Ipv4Addr>>,
    calls: AtomicUsize,
}

impl ScriptedResolver {
    /// Resolver that always fails
    pub fn unresolvable() -> Self {
        Self::default()
    }

    /// Resolver that always returns the same IP
    pub fn fixed(ip: [u8; 4]) -> Self {
        let resolver = Self::default();
        *resolver.inner.default.lock().unwrap() = Some(Ipv4Addr::from(ip));
        resolver
    }

    /// Queue one scripted outcome
    pub fn push(&self, outcome: Option<[u8; 4]>) {
        self.inner
            .script
            .lock()
            .unwrap()
            .push_back(outcome.map(Ipv4Addr::from));
    }

    /// Set the outcome used after the script is exhausted
    pub fn set_default(&self, outcome: Option<[u8; 4]>) {
        *self.inner.default.lock().unwrap() = outcome.map(Ipv4Addr::from);
    }

    /// Number of `resolve()` calls so far
    pub fn call_count(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PublicIpResolver for ScriptedResolver {
    async fn resolve(&self) -> Result<Ipv4Addr, Error> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);

        let outcome = {
            let mut script = self.inner.script.lock().unwrap();
            match script.pop_front() {
                Some(entry) => entry,
                None => *self.inner.default.lock().unwrap(),
            }
        };

        outcome.ok_or_else(|| Error::resolve("scripted: unresolved"))
    }
}

/// Platform control that records calls and can be made to fail
#[derive(Clone, Default)]
pub struct MockPlatform {
    inner: Arc<PlatformInner>,
}

#[derive(Default)]
struct PlatformInner {
    airplane_on: AtomicUsize,
    airplane_off: AtomicUsize,
    data_resets: AtomicUsize,
    failing: AtomicBool,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail
    pub fn failing() -> Self {
        let platform = Self::default();
        platform.inner.failing.store(true, Ordering::SeqCst);
        platform
    }

    pub fn airplane_on_count(&self) -> usize {
        self.inner.airplane_on.load(Ordering::SeqCst)
    }

    pub fn airplane_off_count(&self) -> usize {
        self.inner.airplane_off.load(Ordering::SeqCst)
    }

    pub fn data_reset_count(&self) -> usize {
        self.inner.data_resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformControl for MockPlatform {
    async fn set_airplane_mode(&self, enabled: bool) -> Result<(), Error> {
        if enabled {
            self.inner.airplane_on.fetch_add(1, Ordering::SeqCst);
        } else {
            self.inner.airplane_off.fetch_add(1, Ordering::SeqCst);
        }

        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(Error::platform("mock: toggle refused"));
        }
        Ok(())
    }

    async fn reset_mobile_data(&self) -> Result<(), Error> {
        self.inner.data_resets.fetch_add(1, Ordering::SeqCst);

        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(Error::platform("mock: reset refused"));
        }
        Ok(())
    }
}

/// Control plane that records traffic and replays scripted command batches
///
/// Each `fetch_commands` call consumes one queued batch; an empty queue
/// yields an empty list (the normal idle case).
#[derive(Clone, Default)]
pub struct MockControlPlane {
    inner: Arc<ControlInner>,
}

#[derive(Default)]
struct ControlInner {
    registrations: Mutex<Vec<Registration>>,
    statuses: Mutex<Vec<StatusUpdate>>,
    reports: Mutex<Vec<IpChangeReport>>,
    batches: Mutex<VecDeque<Vec<Command>>>,
    fetch_calls: AtomicUsize,
    fail_register: AtomicBool,
    fail_report: AtomicBool,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one batch of commands for a future fetch
    pub fn push_batch(&self, batch: Vec<Command>) {
        self.inner.batches.lock().unwrap().push_back(batch);
    }

    pub fn fail_register(&self) {
        self.inner.fail_register.store(true, Ordering::SeqCst);
    }

    pub fn fail_report(&self) {
        self.inner.fail_report.store(true, Ordering::SeqCst);
    }

    pub fn registration_count(&self) -> usize {
        self.inner.registrations.lock().unwrap().len()
    }

    pub fn status_count(&self) -> usize {
        self.inner.statuses.lock().unwrap().len()
    }

    pub fn statuses(&self) -> Vec<StatusUpdate> {
        self.inner.statuses.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.inner.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn reports(&self) -> Vec<IpChangeReport> {
        self.inner.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn register(&self, registration: &Registration) -> Result<(), Error> {
        if self.inner.fail_register.load(Ordering::SeqCst) {
            return Err(Error::control_plane("mock: register refused"));
        }
        self.inner
            .registrations
            .lock()
            .unwrap()
            .push(registration.clone());
        Ok(())
    }

    async fn send_status(&self, status: &StatusUpdate) -> Result<(), Error> {
        self.inner.statuses.lock().unwrap().push(status.clone());
        Ok(())
    }

    async fn fetch_commands(&self, _device_id: &str) -> Result<Vec<Command>, Error> {
        self.inner.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let batch = self
            .inner
            .batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        Ok(batch)
    }

    async fn report_ip_change(&self, report: &IpChangeReport) -> Result<(), Error> {
        self.inner.reports.lock().unwrap().push(report.clone());
        if self.inner.fail_report.load(Ordering::SeqCst) {
            return Err(Error::control_plane("mock: report refused"));
        }
        Ok(())
    }
}
