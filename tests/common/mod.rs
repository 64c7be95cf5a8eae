// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Handlers shared by the control channel integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracer_ctrl::ctrl::{SockoptError, SockoptHandler, SockoptId};

/// Stores one value per handler: any set replaces it, any get returns it.
/// Counts calls so tests can tell which handler served a request.
pub struct Store {
    name: &'static str,
    value: Mutex<Vec<u8>>,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
}

impl Store {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            value: Mutex::new(Vec::new()),
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

impl SockoptHandler for Store {
    fn name(&self) -> &str {
        self.name
    }

    fn set(&self, _opt: SockoptId, input: &[u8]) -> Result<(), SockoptError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if input.is_empty() {
            return Err(SockoptError::invalid("empty value"));
        }
        *self.value.lock().unwrap() = input.to_vec();
        Ok(())
    }

    fn get(&self, _opt: SockoptId, _input: &[u8]) -> Result<Vec<u8>, SockoptError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.value.lock().unwrap().clone())
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
