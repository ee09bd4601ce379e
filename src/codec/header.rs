//! [`RequestHeader`]: the identity/routing envelope carried on every
//! outbound message.

use serde::{Deserialize, Serialize};

use super::types::ClientId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestHeader {
    pub client_id: ClientId,
    pub sender_comp_id: String,
    pub access_token: String,
    /// Caller-supplied; this crate never increments it (spec §9 open
    /// question — the single-client facade owns its own counter instead).
    pub request_id: i64,
}

impl RequestHeader {
    pub fn new(client_id: ClientId, sender_comp_id: impl Into<String>) -> Self {
        Self {
            client_id,
            sender_comp_id: sender_comp_id.into(),
            access_token: String::new(),
            request_id: 0,
        }
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = access_token.into();
        self
    }
}
