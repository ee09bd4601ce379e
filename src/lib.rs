//! Omega gateway client
//!
//! An async client library connecting a trading application to the Omega
//! order-routing service over a framed binary message bus (ZeroMQ
//! DEALER/ROUTER).
//!
//! # Modules
//!
//! - [`codec`] - wire types, the contingent order algebra, and typed
//!   builders/parser for every message variant (C1)
//! - [`transport`] - the authenticated socket, outbound queue, and poll
//!   loop (C2)
//! - [`sender`] - builds and enqueues outbound requests (C3)
//! - [`dispatcher`] - decodes inbound frames and routes them to handler
//!   callbacks (C4)
//! - [`session`] - logon/logoff and access-token refresh scheduling (C5)
//! - [`connection`] - the composed facade (C6)
//! - [`config`] - gateway configuration
//! - [`error`] - the synchronous error taxonomy
//! - [`logging`] - structured logging setup
//! - [`token`] - the shared access-token slot

pub mod codec;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod sender;
pub mod session;
pub mod token;
pub mod transport;

pub use config::GatewayConfig;
pub use connection::{OmegaConnection, SingleClientConnection};
pub use dispatcher::{Dispatcher, PrintingResponseHandler, ResponseHandler};
pub use error::{OmegaError, Result};
pub use sender::RequestSender;
pub use session::{SessionManager, SessionState};
pub use transport::{Transport, TransportState};
