//! The message codec (C1): wire types, the contingent order algebra, and
//! typed builders/parser for every message variant in spec §4.1.

pub mod contingent;
pub mod envelope;
pub mod header;
pub mod reports;
pub mod types;

pub use contingent::{Batch, BatchOrOco, ContingentOrder, Oco, Opo};
pub use envelope::{
    Envelope, MessageBody, build_authorization_refresh, build_cancel_all_orders,
    build_cancel_order, build_heartbeat, build_logoff, build_logon, build_place_contingent_order,
    build_place_order, build_replace_order, build_request_account_balances,
    build_request_account_data, build_request_completed_orders, build_request_exchange_properties,
    build_request_open_positions, build_request_order_status, build_request_working_orders,
    build_server_time_request, build_test_message, encode, parse,
};
pub use header::RequestHeader;
pub use reports::*;
pub use types::*;
