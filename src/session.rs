//! The Session Manager (C5): drives logon/logoff, installs granted access
//! tokens into the shared slot, and schedules their refresh ahead of
//! expiry (spec §3, §4.5).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::codec::{AccountCredentials, ClientId, RequestHeader};
use crate::error::Result;
use crate::sender::RequestSender;
use crate::token::AccessTokenSlot;

/// Session lifecycle (spec §3): `LOGGED_OUT -> AUTHENTICATING ->
/// AUTHORIZED -> REFRESHING -> LOGGED_OUT`. Orthogonal to the transport
/// state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    Authenticating,
    Authorized,
    Refreshing,
}

/// Drives session state and the access-token refresh timer. The sole
/// writer of the shared [`AccessTokenSlot`] (spec §3).
pub struct SessionManager {
    sender: Arc<RequestSender>,
    access_token: Arc<AccessTokenSlot>,
    state: Arc<Mutex<SessionState>>,
    /// `(client_id, sender_comp_id)` captured from the header passed to
    /// `logon`, reused to stamp the scheduled refresh's header (spec §4.5
    /// point v — the refresh carries the session's own identity, not a
    /// fabricated one).
    identity: Mutex<Option<(ClientId, String)>>,
    /// The refresh token from the most recent `authorization_grant`,
    /// distinct from the access token (spec §4.5 point v — the scheduled
    /// refresh sends the refresh token, not the access token).
    refresh_token: Mutex<String>,
    refresh_safety_fraction: f64,
    /// Bumped on every logon/logoff so a stale refresh timer from a prior
    /// session recognizes itself as cancelled (spec §4.5 "logoff
    /// cancellation").
    generation: Arc<AtomicU64>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(
        sender: Arc<RequestSender>,
        access_token: Arc<AccessTokenSlot>,
        refresh_safety_fraction: f64,
    ) -> Self {
        Self {
            sender,
            access_token,
            state: Arc::new(Mutex::new(SessionState::LoggedOut)),
            identity: Mutex::new(None),
            refresh_token: Mutex::new(String::new()),
            refresh_safety_fraction,
            generation: Arc::new(AtomicU64::new(0)),
            refresh_task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// Send the logon request. Transitions `LOGGED_OUT -> AUTHENTICATING`;
    /// a no-op if already past `LOGGED_OUT` (spec §4.5 illegal transitions
    /// are no-ops, not errors).
    pub fn logon(
        &self,
        header: RequestHeader,
        client_secret: impl Into<String>,
        credentials: Vec<AccountCredentials>,
    ) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            if *state != SessionState::LoggedOut {
                return Ok(());
            }
            *state = SessionState::Authenticating;
        }
        *self.identity.lock().unwrap() = Some((header.client_id, header.sender_comp_id.clone()));
        self.sender.logon(header, client_secret, credentials)
    }

    /// Send the logoff request, clear the access token, and cancel any
    /// pending refresh timer (spec §4.5).
    pub fn logoff(&self, header: RequestHeader) -> Result<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.refresh_task.lock().unwrap().take() {
            task.abort();
        }
        *self.state.lock().unwrap() = SessionState::LoggedOut;
        *self.identity.lock().unwrap() = None;
        *self.refresh_token.lock().unwrap() = String::new();
        self.access_token.set(String::new());
        self.sender.logoff(header)
    }

    /// Called by the dispatcher on `on_logon_ack` (spec §4.5): a
    /// successful ack moves to `AUTHORIZED`; the grant itself (and its
    /// refresh schedule) arrives separately via `on_authorization_grant`.
    pub fn handle_logon_ack(&self, success: bool) {
        let mut state = self.state.lock().unwrap();
        if *state != SessionState::Authenticating {
            return;
        }
        *state = if success {
            SessionState::Authorized
        } else {
            SessionState::LoggedOut
        };
    }

    /// Called by the dispatcher on `on_authorization_grant`: installs the
    /// new access token and (re)schedules the next refresh at
    /// `expires_in * refresh_safety_fraction` seconds out (spec §4.5).
    pub fn handle_authorization_grant(
        &self,
        access_token: String,
        refresh_token: String,
        expires_in: f64,
    ) {
        self.access_token.set(access_token);
        *self.refresh_token.lock().unwrap() = refresh_token;
        {
            let mut state = self.state.lock().unwrap();
            *state = SessionState::Authorized;
        }
        self.schedule_refresh(expires_in);
    }

    fn schedule_refresh(&self, expires_in: f64) {
        if let Some(task) = self.refresh_task.lock().unwrap().take() {
            task.abort();
        }
        let delay_secs = (expires_in * self.refresh_safety_fraction).max(0.0);
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let sender = Arc::clone(&self.sender);
        let state = Arc::clone(&self.state);
        let identity = self.identity.lock().unwrap().clone();
        let refresh_token = self.refresh_token.lock().unwrap().clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs_f64(delay_secs)).await;
            if generation.load(Ordering::SeqCst) != my_generation {
                return;
            }
            let Some((client_id, sender_comp_id)) = identity else {
                warn!("scheduled token refresh fired with no session identity on record");
                return;
            };
            *state.lock().unwrap() = SessionState::Refreshing;
            let header = RequestHeader::new(client_id, sender_comp_id);
            if let Err(e) = sender.request_authorization_refresh(header, refresh_token) {
                warn!(error = %e, "failed to enqueue scheduled token refresh");
            } else {
                info!(delay_secs, "scheduled access token refresh sent");
            }
        });
        *self.refresh_task.lock().unwrap() = Some(handle);
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(task) = self.refresh_task.lock().unwrap().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::transport::Transport;

    fn manager() -> SessionManager {
        let transport = Arc::new(Transport::new(GatewayConfig::new(
            "inproc://session-test",
            "session-x",
        )));
        let access_token = Arc::new(AccessTokenSlot::new());
        let sender = Arc::new(RequestSender::new(transport, Arc::clone(&access_token)));
        SessionManager::new(sender, access_token, 0.75)
    }

    #[test]
    fn starts_logged_out() {
        assert_eq!(manager().state(), SessionState::LoggedOut);
    }

    #[test]
    fn logon_ack_failure_returns_to_logged_out() {
        let manager = manager();
        // logon() itself fails since the transport isn't running, but the
        // state transition to AUTHENTICATING happens before that send.
        let _ = manager.logon(RequestHeader::new(1, "session-x"), "secret", vec![]);
        assert_eq!(manager.state(), SessionState::Authenticating);
        manager.handle_logon_ack(false);
        assert_eq!(manager.state(), SessionState::LoggedOut);
    }

    #[test]
    fn double_logon_is_a_no_op() {
        let manager = manager();
        let _ = manager.logon(RequestHeader::new(1, "session-x"), "secret", vec![]);
        assert_eq!(manager.state(), SessionState::Authenticating);
        manager.handle_logon_ack(true);
        assert_eq!(manager.state(), SessionState::Authorized);
        let _ = manager.logon(RequestHeader::new(1, "session-x"), "secret2", vec![]);
        assert_eq!(manager.state(), SessionState::Authorized);
    }

    #[tokio::test]
    async fn authorization_grant_installs_token_and_sets_authorized() {
        let manager = manager();
        manager.handle_authorization_grant("tok-1".into(), "refresh-1".into(), 100.0);
        assert_eq!(manager.state(), SessionState::Authorized);
        assert_eq!(manager.access_token.get().as_str(), "tok-1");
        assert_eq!(manager.refresh_token.lock().unwrap().as_str(), "refresh-1");
    }

    #[tokio::test]
    async fn logoff_clears_token_and_resets_state() {
        let manager = manager();
        manager.handle_authorization_grant("tok-1".into(), "refresh-1".into(), 100.0);
        let _ = manager.logoff(RequestHeader::new(1, "session-x"));
        assert_eq!(manager.state(), SessionState::LoggedOut);
        assert_eq!(manager.access_token.get().as_str(), "");
        assert_eq!(manager.refresh_token.lock().unwrap().as_str(), "");
    }

    #[tokio::test]
    async fn scheduled_refresh_reuses_the_logon_identity() {
        let manager = manager();
        let _ = manager.logon(RequestHeader::new(7, "session-x"), "secret", vec![]);
        manager.handle_logon_ack(true);
        manager.handle_authorization_grant("tok-1".into(), "refresh-1".into(), 0.0);
        assert_eq!(
            manager.identity.lock().unwrap().clone(),
            Some((7, "session-x".to_string()))
        );
    }
}
