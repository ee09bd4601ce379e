//! The Response Receiver / Dispatcher (C4): installed as the transport's
//! inbound sink, decodes every frame and routes it to the matching
//! handler method (spec §4.4).

use std::sync::Arc;

use tracing::warn;

use crate::codec::{
    self, AccountBalancesReport, AccountDataReport, AuthorizationGrant, CompletedOrdersReport,
    ExchangePropertiesReport, ExecutionReport, LogoffAck, LogonAck, MessageBody,
    OpenPositionsReport, OrderStatusReport, RequestHeader, SystemNotification, TestReply,
    WorkingOrdersReport,
};

/// One method per inbound variant, default no-op (spec §4.4). Implement
/// only the variants you care about.
pub trait ResponseHandler: Send + Sync {
    fn on_execution_report(&self, _header: &RequestHeader, _report: &ExecutionReport) {}
    fn on_account_data_report(&self, _header: &RequestHeader, _report: &AccountDataReport) {}
    fn on_account_balances_report(&self, _header: &RequestHeader, _report: &AccountBalancesReport) {
    }
    fn on_open_positions_report(&self, _header: &RequestHeader, _report: &OpenPositionsReport) {}
    fn on_working_orders_report(&self, _header: &RequestHeader, _report: &WorkingOrdersReport) {}
    fn on_completed_orders_report(&self, _header: &RequestHeader, _report: &CompletedOrdersReport) {
    }
    fn on_order_status_report(&self, _header: &RequestHeader, _report: &OrderStatusReport) {}
    fn on_exchange_properties_report(
        &self,
        _header: &RequestHeader,
        _report: &ExchangePropertiesReport,
    ) {
    }
    fn on_logon_ack(&self, _header: &RequestHeader, _ack: &LogonAck) {}
    fn on_logoff_ack(&self, _header: &RequestHeader, _ack: &LogoffAck) {}
    fn on_authorization_grant(&self, _header: &RequestHeader, _grant: &AuthorizationGrant) {}
    fn on_system_notification(&self, _header: &RequestHeader, _notification: &SystemNotification) {}
    fn on_test_reply(&self, _header: &RequestHeader, _reply: &TestReply) {}
    fn on_heartbeat(&self, _header: &RequestHeader) {}

    /// A frame whose bytes could not be decoded (spec §4.4, §7
    /// `ProtocolError`). Never aborts the receive loop.
    fn on_protocol_error(&self, _raw_bytes: &[u8], _reason: String) {}

    /// A decoded tagged union whose tag the dispatcher does not route
    /// (should not normally occur; defensive catch-all per spec §4.4).
    fn on_unknown_message(&self, _header: &RequestHeader) {}
}

/// A [`ResponseHandler`] that logs every callback to stderr, for
/// diagnostics (spec §4.4 "printing variant").
#[derive(Default)]
pub struct PrintingResponseHandler;

impl ResponseHandler for PrintingResponseHandler {
    fn on_execution_report(&self, header: &RequestHeader, report: &ExecutionReport) {
        eprintln!("[execution_report] header={header:?} report={report:?}");
    }
    fn on_account_data_report(&self, header: &RequestHeader, report: &AccountDataReport) {
        eprintln!("[account_data_report] header={header:?} report={report:?}");
    }
    fn on_account_balances_report(&self, header: &RequestHeader, report: &AccountBalancesReport) {
        eprintln!("[account_balances_report] header={header:?} report={report:?}");
    }
    fn on_open_positions_report(&self, header: &RequestHeader, report: &OpenPositionsReport) {
        eprintln!("[open_positions_report] header={header:?} report={report:?}");
    }
    fn on_working_orders_report(&self, header: &RequestHeader, report: &WorkingOrdersReport) {
        eprintln!("[working_orders_report] header={header:?} report={report:?}");
    }
    fn on_completed_orders_report(&self, header: &RequestHeader, report: &CompletedOrdersReport) {
        eprintln!("[completed_orders_report] header={header:?} report={report:?}");
    }
    fn on_order_status_report(&self, header: &RequestHeader, report: &OrderStatusReport) {
        eprintln!("[order_status_report] header={header:?} report={report:?}");
    }
    fn on_exchange_properties_report(
        &self,
        header: &RequestHeader,
        report: &ExchangePropertiesReport,
    ) {
        eprintln!("[exchange_properties_report] header={header:?} report={report:?}");
    }
    fn on_logon_ack(&self, header: &RequestHeader, ack: &LogonAck) {
        eprintln!("[logon_ack] header={header:?} ack={ack:?}");
    }
    fn on_logoff_ack(&self, header: &RequestHeader, ack: &LogoffAck) {
        eprintln!("[logoff_ack] header={header:?} ack={ack:?}");
    }
    fn on_authorization_grant(&self, header: &RequestHeader, grant: &AuthorizationGrant) {
        eprintln!(
            "[authorization_grant] header={header:?} expires_in={}",
            grant.expires_in
        );
    }
    fn on_system_notification(&self, header: &RequestHeader, notification: &SystemNotification) {
        eprintln!("[system_notification] header={header:?} notification={notification:?}");
    }
    fn on_test_reply(&self, header: &RequestHeader, reply: &TestReply) {
        eprintln!("[test_reply] header={header:?} reply={reply:?}");
    }
    fn on_heartbeat(&self, header: &RequestHeader) {
        eprintln!("[heartbeat] header={header:?}");
    }
    fn on_protocol_error(&self, raw_bytes: &[u8], reason: String) {
        eprintln!(
            "[protocol_error] {} bytes, reason={reason}",
            raw_bytes.len()
        );
    }
    fn on_unknown_message(&self, header: &RequestHeader) {
        eprintln!("[unknown_message] header={header:?}");
    }
}

/// Decodes each inbound frame and routes it to the matching handler
/// method, in the order frames are delivered by the transport (spec §4.4,
/// §5 "inbound dispatch is serialized").
pub struct Dispatcher {
    handler: Arc<dyn ResponseHandler>,
}

impl Dispatcher {
    pub fn new(handler: Arc<dyn ResponseHandler>) -> Self {
        Self { handler }
    }

    /// Decode and route one frame. Never panics or propagates a decode
    /// failure — it is turned into `on_protocol_error` (spec §4.4, §7).
    pub fn dispatch(&self, raw: &[u8]) {
        let envelope = match codec::parse(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(bytes = raw.len(), error = %e, "failed to decode inbound frame");
                self.handler.on_protocol_error(raw, e.to_string());
                return;
            }
        };
        let header = &envelope.header;
        match &envelope.body {
            MessageBody::ExecutionReport(r) => self.handler.on_execution_report(header, r),
            MessageBody::AccountDataReport(r) => self.handler.on_account_data_report(header, r),
            MessageBody::AccountBalancesReport(r) => {
                self.handler.on_account_balances_report(header, r)
            }
            MessageBody::OpenPositionsReport(r) => self.handler.on_open_positions_report(header, r),
            MessageBody::WorkingOrdersReport(r) => self.handler.on_working_orders_report(header, r),
            MessageBody::CompletedOrdersReport(r) => {
                self.handler.on_completed_orders_report(header, r)
            }
            MessageBody::OrderStatusReport(r) => self.handler.on_order_status_report(header, r),
            MessageBody::ExchangePropertiesReport(r) => {
                self.handler.on_exchange_properties_report(header, r)
            }
            MessageBody::LogonAck(r) => self.handler.on_logon_ack(header, r),
            MessageBody::LogoffAck(r) => self.handler.on_logoff_ack(header, r),
            MessageBody::AuthorizationGrant(r) => self.handler.on_authorization_grant(header, r),
            MessageBody::SystemNotification(r) => self.handler.on_system_notification(header, r),
            MessageBody::TestReply(r) => self.handler.on_test_reply(header, r),
            MessageBody::Heartbeat => self.handler.on_heartbeat(header),
            _ => self.handler.on_unknown_message(header),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{AccountInfo, OrderStatus, OrderType, Side};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        execution_reports: AtomicUsize,
        unknowns: AtomicUsize,
        protocol_errors: AtomicUsize,
    }

    impl ResponseHandler for CountingHandler {
        fn on_execution_report(&self, _header: &RequestHeader, _report: &ExecutionReport) {
            self.execution_reports.fetch_add(1, Ordering::SeqCst);
        }
        fn on_unknown_message(&self, _header: &RequestHeader) {
            self.unknowns.fetch_add(1, Ordering::SeqCst);
        }
        fn on_protocol_error(&self, _raw_bytes: &[u8], _reason: String) {
            self.protocol_errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn execution_report() -> ExecutionReport {
        ExecutionReport {
            account_info: AccountInfo::new(1),
            order_id: "o1".into(),
            client_order_id: "c1".into(),
            symbol: "BTC/USD".into(),
            side: Side::Buy,
            order_type: OrderType::Limit,
            order_status: OrderStatus::New,
            price: 1.0,
            quantity: 1.0,
            filled_quantity: 0.0,
            avg_fill_price: 0.0,
            limit_price: 1.0,
            stop_price: 0.0,
            rejection_reason: None,
        }
    }

    #[test]
    fn routes_execution_report_to_matching_handler() {
        let handler = Arc::new(CountingHandler::default());
        let dispatcher = Dispatcher::new(handler.clone());
        let header = RequestHeader::new(1, "sender");
        let envelope = codec::Envelope {
            header,
            body: MessageBody::ExecutionReport(execution_report()),
        };
        let bytes = codec::encode(&envelope).unwrap();
        dispatcher.dispatch(&bytes);
        assert_eq!(handler.execution_reports.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn malformed_frame_surfaces_protocol_error_without_panicking() {
        let handler = Arc::new(CountingHandler::default());
        let dispatcher = Dispatcher::new(handler.clone());
        dispatcher.dispatch(&[0xff, 0x00, 0x01]);
        assert_eq!(handler.protocol_errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn outbound_only_variant_reaching_dispatch_is_unknown() {
        let handler = Arc::new(CountingHandler::default());
        let dispatcher = Dispatcher::new(handler.clone());
        let header = RequestHeader::new(1, "sender");
        let envelope = codec::Envelope {
            header,
            body: MessageBody::Logoff,
        };
        let bytes = codec::encode(&envelope).unwrap();
        dispatcher.dispatch(&bytes);
        assert_eq!(handler.unknowns.load(Ordering::SeqCst), 1);
    }
}
