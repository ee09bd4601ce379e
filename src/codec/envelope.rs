//! The message codec (C1): typed builders for every outbound variant, and
//! a single `parse` entry point that decodes any inbound frame into a
//! `(RequestHeader, MessageBody)` pair.
//!
//! Framing (spec §4.1, §9): the source schema is a capnp tagged union;
//! this port represents it as a plain Rust enum serialized with `bincode`
//! (the binary codec the teacher already uses for its WAL — see
//! `wal_v2.rs` in the corpus). One `Envelope` is one logical frame.

use serde::{Deserialize, Serialize};

use super::contingent::ContingentOrder;
use super::header::RequestHeader;
use super::reports::{
    AccountBalancesReport, AccountDataReport, AuthorizationGrant, CompletedOrdersReport,
    ExchangePropertiesReport, ExecutionReport, LogoffAck, LogonAck, OpenPositionsReport,
    OrderStatusReport, SystemNotification, TestReply, WorkingOrdersReport,
};
use super::types::{AccountCredentials, AccountInfo, Order, OrderType, Side, TimeInForce};
use crate::error::{OmegaError, Result};

/// The tagged union selector, covering every request and report variant
/// named in spec §4.1. One wire schema serves both directions of the
/// duplex bus; which subset is meaningful in which direction is a
/// protocol convention, not a type-level split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MessageBody {
    // --- outbound (requests) ---
    Logon {
        client_secret: String,
        credentials: Vec<AccountCredentials>,
    },
    Logoff,
    Heartbeat,
    ServerTimeRequest,
    PlaceOrder {
        order: Order,
    },
    ReplaceOrder {
        account_info: AccountInfo,
        order_id: String,
        order_type: OrderType,
        quantity: f64,
        price: f64,
        stop_price: f64,
        time_in_force: TimeInForce,
        expire_at: f64,
    },
    CancelOrder {
        account_info: AccountInfo,
        order_id: String,
    },
    CancelAllOrders {
        account_info: AccountInfo,
        symbol: Option<String>,
        side: Option<Side>,
    },
    RequestAccountData {
        account_info: AccountInfo,
    },
    RequestAccountBalances {
        account_info: AccountInfo,
    },
    RequestOpenPositions {
        account_info: AccountInfo,
    },
    RequestWorkingOrders {
        account_info: AccountInfo,
    },
    RequestOrderStatus {
        account_info: AccountInfo,
        order_id: String,
    },
    RequestCompletedOrders {
        account_info: AccountInfo,
        count: Option<i64>,
        since: Option<f64>,
    },
    RequestExchangeProperties {
        exchange: super::types::Exchange,
    },
    AuthorizationRefresh {
        refresh_token: String,
    },
    PlaceContingentOrder {
        contingent_order: ContingentOrder,
    },
    TestMessage {
        payload: String,
    },

    // --- inbound (reports) ---
    ExecutionReport(ExecutionReport),
    AccountDataReport(AccountDataReport),
    AccountBalancesReport(AccountBalancesReport),
    OpenPositionsReport(OpenPositionsReport),
    WorkingOrdersReport(WorkingOrdersReport),
    CompletedOrdersReport(CompletedOrdersReport),
    OrderStatusReport(OrderStatusReport),
    ExchangePropertiesReport(ExchangePropertiesReport),
    LogonAck(LogonAck),
    LogoffAck(LogoffAck),
    AuthorizationGrant(AuthorizationGrant),
    SystemNotification(SystemNotification),
    TestReply(TestReply),
}

impl MessageBody {
    /// The variant tag, used by the dispatcher (C4) to pick a handler
    /// method and in logging.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Logon { .. } => "logon",
            Self::Logoff => "logoff",
            Self::Heartbeat => "heartbeat",
            Self::ServerTimeRequest => "server_time_request",
            Self::PlaceOrder { .. } => "place_order",
            Self::ReplaceOrder { .. } => "replace_order",
            Self::CancelOrder { .. } => "cancel_order",
            Self::CancelAllOrders { .. } => "cancel_all_orders",
            Self::RequestAccountData { .. } => "request_account_data",
            Self::RequestAccountBalances { .. } => "request_account_balances",
            Self::RequestOpenPositions { .. } => "request_open_positions",
            Self::RequestWorkingOrders { .. } => "request_working_orders",
            Self::RequestOrderStatus { .. } => "request_order_status",
            Self::RequestCompletedOrders { .. } => "request_completed_orders",
            Self::RequestExchangeProperties { .. } => "request_exchange_properties",
            Self::AuthorizationRefresh { .. } => "authorization_refresh",
            Self::PlaceContingentOrder { .. } => "place_contingent_order",
            Self::TestMessage { .. } => "test_message",
            Self::ExecutionReport(_) => "execution_report",
            Self::AccountDataReport(_) => "account_data_report",
            Self::AccountBalancesReport(_) => "account_balances_report",
            Self::OpenPositionsReport(_) => "open_positions_report",
            Self::WorkingOrdersReport(_) => "working_orders_report",
            Self::CompletedOrdersReport(_) => "completed_orders_report",
            Self::OrderStatusReport(_) => "order_status_report",
            Self::ExchangePropertiesReport(_) => "exchange_properties_report",
            Self::LogonAck(_) => "logon_ack",
            Self::LogoffAck(_) => "logoff_ack",
            Self::AuthorizationGrant(_) => "authorization_grant",
            Self::SystemNotification(_) => "system_notification",
            Self::TestReply(_) => "test_reply",
        }
    }
}

/// The outermost wrapper: a header plus a tagged-union payload. Exactly
/// one of these is transmitted per logical frame (spec §4.2 framing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub header: RequestHeader,
    pub body: MessageBody,
}

/// Serialize an envelope to the bytes that go out on the wire.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>> {
    bincode::serialize(envelope).map_err(OmegaError::Encode)
}

/// Decode a raw inbound frame into its header and tagged payload
/// (spec §4.1 `parse`). Callers needing the `ProtocolError` path (spec §7)
/// should prefer going through [`crate::dispatcher::Dispatcher`], which
/// turns this `Err` into an `on_protocol_error` callback instead of
/// propagating it.
pub fn parse(bytes: &[u8]) -> Result<Envelope> {
    bincode::deserialize(bytes).map_err(OmegaError::Encode)
}

// ---------------------------------------------------------------------
// Typed builders (spec §4.1 `build_V`). Each takes the header verbatim —
// access-token stamping happens one layer up, in the request sender,
// never here — and returns the constructed envelope.
// ---------------------------------------------------------------------

pub fn build_logon(
    header: RequestHeader,
    client_secret: impl Into<String>,
    credentials: Vec<AccountCredentials>,
) -> Envelope {
    Envelope {
        header,
        body: MessageBody::Logon {
            client_secret: client_secret.into(),
            credentials,
        },
    }
}

pub fn build_logoff(header: RequestHeader) -> Envelope {
    Envelope {
        header,
        body: MessageBody::Logoff,
    }
}

pub fn build_heartbeat(header: RequestHeader) -> Envelope {
    Envelope {
        header,
        body: MessageBody::Heartbeat,
    }
}

pub fn build_server_time_request(header: RequestHeader) -> Envelope {
    Envelope {
        header,
        body: MessageBody::ServerTimeRequest,
    }
}

pub fn build_place_order(header: RequestHeader, order: Order) -> Envelope {
    Envelope {
        header,
        body: MessageBody::PlaceOrder { order },
    }
}

#[allow(clippy::too_many_arguments)]
pub fn build_replace_order(
    header: RequestHeader,
    account_info: AccountInfo,
    order_id: impl Into<String>,
    order_type: impl AsRef<str>,
    quantity: f64,
    price: f64,
    stop_price: f64,
    time_in_force: impl AsRef<str>,
    expire_at: f64,
) -> Envelope {
    Envelope {
        header,
        body: MessageBody::ReplaceOrder {
            account_info,
            order_id: order_id.into(),
            order_type: order_type.as_ref().into(),
            quantity,
            price,
            stop_price,
            time_in_force: time_in_force.as_ref().into(),
            expire_at,
        },
    }
}

pub fn build_cancel_order(
    header: RequestHeader,
    account_info: AccountInfo,
    order_id: impl Into<String>,
) -> Envelope {
    Envelope {
        header,
        body: MessageBody::CancelOrder {
            account_info,
            order_id: order_id.into(),
        },
    }
}

pub fn build_cancel_all_orders(
    header: RequestHeader,
    account_info: AccountInfo,
    symbol: Option<String>,
    side: Option<String>,
) -> Envelope {
    Envelope {
        header,
        body: MessageBody::CancelAllOrders {
            account_info,
            symbol,
            side: side.map(|s| s.as_str().into()),
        },
    }
}

pub fn build_request_account_data(header: RequestHeader, account_info: AccountInfo) -> Envelope {
    Envelope {
        header,
        body: MessageBody::RequestAccountData { account_info },
    }
}

pub fn build_request_account_balances(
    header: RequestHeader,
    account_info: AccountInfo,
) -> Envelope {
    Envelope {
        header,
        body: MessageBody::RequestAccountBalances { account_info },
    }
}

pub fn build_request_open_positions(header: RequestHeader, account_info: AccountInfo) -> Envelope {
    Envelope {
        header,
        body: MessageBody::RequestOpenPositions { account_info },
    }
}

pub fn build_request_working_orders(header: RequestHeader, account_info: AccountInfo) -> Envelope {
    Envelope {
        header,
        body: MessageBody::RequestWorkingOrders { account_info },
    }
}

pub fn build_request_order_status(
    header: RequestHeader,
    account_info: AccountInfo,
    order_id: impl Into<String>,
) -> Envelope {
    Envelope {
        header,
        body: MessageBody::RequestOrderStatus {
            account_info,
            order_id: order_id.into(),
        },
    }
}

pub fn build_request_completed_orders(
    header: RequestHeader,
    account_info: AccountInfo,
    count: Option<i64>,
    since: Option<f64>,
) -> Envelope {
    Envelope {
        header,
        body: MessageBody::RequestCompletedOrders {
            account_info,
            count,
            since,
        },
    }
}

pub fn build_request_exchange_properties(
    header: RequestHeader,
    exchange: impl AsRef<str>,
) -> Envelope {
    Envelope {
        header,
        body: MessageBody::RequestExchangeProperties {
            exchange: exchange.as_ref().into(),
        },
    }
}

pub fn build_authorization_refresh(
    header: RequestHeader,
    refresh_token: impl Into<String>,
) -> Envelope {
    Envelope {
        header,
        body: MessageBody::AuthorizationRefresh {
            refresh_token: refresh_token.into(),
        },
    }
}

pub fn build_place_contingent_order(
    header: RequestHeader,
    contingent_order: ContingentOrder,
) -> Envelope {
    Envelope {
        header,
        body: MessageBody::PlaceContingentOrder { contingent_order },
    }
}

pub fn build_test_message(header: RequestHeader, payload: impl Into<String>) -> Envelope {
    Envelope {
        header,
        body: MessageBody::TestMessage {
            payload: payload.into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::contingent::{BatchOrOco, Oco};

    fn sample_order(price: f64, side: &str) -> Order {
        Order::new(
            AccountInfo::new(100),
            "8675309",
            "a123",
            "BTC/USD",
            side,
            "limit",
            1.1,
            price,
            0.0,
            "gtc",
            0.0,
            "none",
            0.0,
        )
    }

    #[test]
    fn round_trips_through_bincode() {
        let header = RequestHeader::new(1, "sender").with_access_token("tok");
        let envelope = build_place_order(header.clone(), sample_order(6000.01, "buy"));
        let bytes = encode(&envelope).unwrap();
        let decoded = parse(&bytes).unwrap();
        assert_eq!(decoded.header, header);
        match decoded.body {
            MessageBody::PlaceOrder { order } => {
                assert_eq!(order.side, Side::Buy);
                assert_eq!(order.price, 6000.01);
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn leverage_exchange_default_has_zero_leverage() {
        let order = Order::new(
            AccountInfo::new(100),
            "1",
            "a",
            "BTC/USD",
            "buy",
            "market",
            1.1,
            0.0,
            0.0,
            "gtc",
            0.0,
            "exchangeDefault",
            0.0,
        );
        assert_eq!(
            order.leverage_type,
            super::super::types::LeverageType::ExchangeDefault
        );
        assert_eq!(order.leverage, 0.0);
    }

    #[test]
    fn leverage_custom_carries_value() {
        let order = Order::new(
            AccountInfo::new(100),
            "1",
            "a",
            "BTC/USD",
            "buy",
            "market",
            1.1,
            0.0,
            0.0,
            "gtc",
            0.0,
            "custom",
            2.0,
        );
        assert_eq!(
            order.leverage_type,
            super::super::types::LeverageType::Custom
        );
        assert_eq!(order.leverage, 2.0);
    }

    #[test]
    fn opo_with_oco_secondary_nests_correctly() {
        let primary = sample_order(6000.01, "buy");
        let secondary = Oco::new(vec![
            sample_order(6200.11, "sell"),
            sample_order(5800.11, "buy"),
        ]);
        let contingent = ContingentOrder::opo(primary, BatchOrOco::Oco(secondary));
        match contingent {
            ContingentOrder::Opo(opo) => {
                assert_eq!(opo.primary.side, Side::Buy);
                match *opo.secondary {
                    BatchOrOco::Oco(oco) => assert_eq!(oco.orders.len(), 2),
                    _ => panic!("expected oco secondary"),
                }
            }
            _ => panic!("expected opo"),
        }
    }

    #[test]
    fn exchange_gdax_maps_to_undefined() {
        let header = RequestHeader::new(1, "sender");
        let envelope = build_request_exchange_properties(header, "gdax");
        match envelope.body {
            MessageBody::RequestExchangeProperties { exchange } => {
                assert_eq!(exchange, super::super::types::Exchange::Undefined);
            }
            _ => panic!("unexpected body"),
        }
    }
}
