//! Shared test helpers: a call-recording store provider with failure
//! injection, layered over `MemoryProvider`.

#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use stashmux::store::MemoryHandle;
use stashmux::{MemoryProvider, StoreHandle, StoreProvider};

/// Collaborator call observed by the recording provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(String),
    Save(String),
}

#[derive(Default)]
struct Shared {
    calls: Vec<Call>,
    fail_open: HashSet<String>,
    fail_save: HashSet<String>,
}

/// Provider that records every open/save and can be told to fail them
#[derive(Clone)]
pub struct RecordingProvider {
    inner: MemoryProvider,
    shared: Arc<Mutex<Shared>>,
}

impl RecordingProvider {
    pub fn with_lengths(lengths: &[usize]) -> (Self, Vec<String>) {
        let (inner, names) = MemoryProvider::with_lengths(lengths);
        let provider = Self {
            inner,
            shared: Arc::new(Mutex::new(Shared::default())),
        };
        (provider, names)
    }

    pub fn memory(&self) -> &MemoryProvider {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.shared.lock().calls.clear();
    }

    pub fn open_count(&self, name: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == Call::Open(name.to_string()))
            .count()
    }

    pub fn save_count(&self, name: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == Call::Save(name.to_string()))
            .count()
    }

    pub fn fail_open(&self, name: &str, fail: bool) {
        let mut shared = self.shared.lock();
        if fail {
            shared.fail_open.insert(name.to_string());
        } else {
            shared.fail_open.remove(name);
        }
    }

    pub fn fail_save(&self, name: &str, fail: bool) {
        let mut shared = self.shared.lock();
        if fail {
            shared.fail_save.insert(name.to_string());
        } else {
            shared.fail_save.remove(name);
        }
    }
}

impl StoreProvider for RecordingProvider {
    type Id = String;
    type Handle = RecordingHandle;

    fn open(&self, id: &String) -> io::Result<RecordingHandle> {
        {
            let mut shared = self.shared.lock();
            shared.calls.push(Call::Open(id.clone()));
            if shared.fail_open.contains(id) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected open failure"));
            }
        }

        Ok(RecordingHandle {
            inner: self.inner.open(id)?,
            shared: Arc::clone(&self.shared),
        })
    }
}

pub struct RecordingHandle {
    inner: MemoryHandle,
    shared: Arc<Mutex<Shared>>,
}

impl StoreHandle for RecordingHandle {
    fn len(&self) -> u64 {
        self.inner.len()
    }

    fn get_byte(&mut self, offset: u64) -> io::Result<u8> {
        self.inner.get_byte(offset)
    }

    fn set_byte(&mut self, offset: u64, value: u8) -> io::Result<()> {
        self.inner.set_byte(offset, value)
    }

    fn read(&mut self, offset: u64, length: u64) -> io::Result<Vec<u8>> {
        self.inner.read(offset, length)
    }

    fn write(&mut self, data: &[u8], offset: u64) -> io::Result<()> {
        self.inner.write(data, offset)
    }

    fn save(&mut self) -> io::Result<()> {
        let name = self.inner.name().to_string();
        {
            let mut shared = self.shared.lock();
            shared.calls.push(Call::Save(name.clone()));
            if shared.fail_save.contains(&name) {
                return Err(io::Error::new(io::ErrorKind::Other, "injected save failure"));
            }
        }
        self.inner.save()
    }
}

/// Route `tracing` output to the test harness (RUST_LOG=stashmux=trace)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
