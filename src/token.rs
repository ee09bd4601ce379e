//! The shared `access_token` slot: single writer (the session manager),
//! multiple readers (the request sender) — spec §3, §5.

use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
pub struct AccessTokenSlot(RwLock<Arc<String>>);

impl AccessTokenSlot {
    pub fn new() -> Self {
        Self(RwLock::new(Arc::new(String::new())))
    }

    pub fn get(&self) -> Arc<String> {
        Arc::clone(&self.0.read().unwrap())
    }

    pub fn set(&self, token: String) {
        *self.0.write().unwrap() = Arc::new(token);
    }
}
