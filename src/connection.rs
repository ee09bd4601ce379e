//! The Connection Facade (C6): composes the transport (C2), request
//! sender (C3), dispatcher (C4), and session manager (C5) behind a single
//! handle (spec §4.6).

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::codec::{
    AccountCredentials, AccountInfo, AuthorizationGrant, ContingentOrder, LogonAck, Order,
    RequestHeader,
};
use crate::config::GatewayConfig;
use crate::dispatcher::{Dispatcher, ResponseHandler};
use crate::error::Result;
use crate::sender::RequestSender;
use crate::session::SessionManager;
use crate::token::AccessTokenSlot;
use crate::transport::Transport;

/// Wraps a caller-supplied [`ResponseHandler`], intercepting the two
/// variants that drive session state (spec §4.5) before forwarding every
/// callback unchanged to the caller's handler.
struct SessionAwareHandler {
    session: Arc<SessionManager>,
    inner: Arc<dyn ResponseHandler>,
}

impl ResponseHandler for SessionAwareHandler {
    fn on_execution_report(&self, header: &RequestHeader, report: &crate::codec::ExecutionReport) {
        self.inner.on_execution_report(header, report)
    }
    fn on_account_data_report(
        &self,
        header: &RequestHeader,
        report: &crate::codec::AccountDataReport,
    ) {
        self.inner.on_account_data_report(header, report)
    }
    fn on_account_balances_report(
        &self,
        header: &RequestHeader,
        report: &crate::codec::AccountBalancesReport,
    ) {
        self.inner.on_account_balances_report(header, report)
    }
    fn on_open_positions_report(
        &self,
        header: &RequestHeader,
        report: &crate::codec::OpenPositionsReport,
    ) {
        self.inner.on_open_positions_report(header, report)
    }
    fn on_working_orders_report(
        &self,
        header: &RequestHeader,
        report: &crate::codec::WorkingOrdersReport,
    ) {
        self.inner.on_working_orders_report(header, report)
    }
    fn on_completed_orders_report(
        &self,
        header: &RequestHeader,
        report: &crate::codec::CompletedOrdersReport,
    ) {
        self.inner.on_completed_orders_report(header, report)
    }
    fn on_order_status_report(
        &self,
        header: &RequestHeader,
        report: &crate::codec::OrderStatusReport,
    ) {
        self.inner.on_order_status_report(header, report)
    }
    fn on_exchange_properties_report(
        &self,
        header: &RequestHeader,
        report: &crate::codec::ExchangePropertiesReport,
    ) {
        self.inner.on_exchange_properties_report(header, report)
    }
    fn on_logon_ack(&self, header: &RequestHeader, ack: &LogonAck) {
        self.session.handle_logon_ack(ack.success);
        self.inner.on_logon_ack(header, ack)
    }
    fn on_logoff_ack(&self, header: &RequestHeader, ack: &crate::codec::LogoffAck) {
        self.inner.on_logoff_ack(header, ack)
    }
    fn on_authorization_grant(&self, header: &RequestHeader, grant: &AuthorizationGrant) {
        self.session.handle_authorization_grant(
            grant.access_token.clone(),
            grant.refresh_token.clone(),
            grant.expires_in,
        );
        self.inner.on_authorization_grant(header, grant)
    }
    fn on_system_notification(
        &self,
        header: &RequestHeader,
        notification: &crate::codec::SystemNotification,
    ) {
        self.inner.on_system_notification(header, notification)
    }
    fn on_test_reply(&self, header: &RequestHeader, reply: &crate::codec::TestReply) {
        self.inner.on_test_reply(header, reply)
    }
    fn on_heartbeat(&self, header: &RequestHeader) {
        self.inner.on_heartbeat(header)
    }
    fn on_protocol_error(&self, raw_bytes: &[u8], reason: String) {
        self.inner.on_protocol_error(raw_bytes, reason)
    }
    fn on_unknown_message(&self, header: &RequestHeader) {
        self.inner.on_unknown_message(header)
    }
}

/// The general-purpose facade: one transport, shared across however many
/// tenants (`client_id`s) the caller manages. Callers build their own
/// [`RequestHeader`]s; see [`SingleClientConnection`] for the common
/// one-tenant case (spec §4.6).
pub struct OmegaConnection {
    transport: Arc<Transport>,
    sender: Arc<RequestSender>,
    session: Arc<SessionManager>,
}

impl OmegaConnection {
    /// Build a connection, installing `handler` as the dispatcher's
    /// response handler before the transport starts.
    pub fn new(config: GatewayConfig, handler: Arc<dyn ResponseHandler>) -> Self {
        let refresh_safety_fraction = config.refresh_safety_fraction;
        let transport = Arc::new(Transport::new(config));
        let access_token = Arc::new(AccessTokenSlot::new());
        let sender = Arc::new(RequestSender::new(
            Arc::clone(&transport),
            Arc::clone(&access_token),
        ));
        let session = Arc::new(SessionManager::new(
            Arc::clone(&sender),
            access_token,
            refresh_safety_fraction,
        ));

        let session_aware_handler = Arc::new(SessionAwareHandler {
            session: Arc::clone(&session),
            inner: handler,
        });
        let dispatcher = Dispatcher::new(session_aware_handler);
        transport.set_inbound_sink(Arc::new(move |bytes| dispatcher.dispatch(&bytes)));

        Self {
            transport,
            sender,
            session,
        }
    }

    /// Convenience constructor for [`SingleClientConnection`] (spec §4.6).
    pub fn configure_single_client(
        config: GatewayConfig,
        handler: Arc<dyn ResponseHandler>,
        client_id: i64,
    ) -> SingleClientConnection {
        SingleClientConnection::new(Self::new(config, handler), client_id)
    }

    pub async fn start(&self) -> Result<()> {
        self.transport.start().await
    }

    pub async fn wait_until_running(&self, timeout: Option<std::time::Duration>) -> bool {
        self.transport.wait_until_running(timeout).await
    }

    pub fn is_running(&self) -> bool {
        self.transport.is_running()
    }

    pub fn stop(&self) {
        self.transport.stop();
    }

    pub async fn cleanup(&self) {
        self.transport.cleanup().await;
    }

    pub fn sender(&self) -> &RequestSender {
        &self.sender
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn logon(
        &self,
        header: RequestHeader,
        client_secret: impl Into<String>,
        credentials: Vec<AccountCredentials>,
    ) -> Result<()> {
        self.session.logon(header, client_secret, credentials)
    }

    pub fn logoff(&self, header: RequestHeader) -> Result<()> {
        self.session.logoff(header)
    }

    pub fn send_heartbeat(&self, header: RequestHeader) -> Result<()> {
        self.sender.send_heartbeat(header)
    }

    pub fn request_server_time(&self, header: RequestHeader) -> Result<()> {
        self.sender.request_server_time(header)
    }

    pub fn place_order(&self, header: RequestHeader, order: Order) -> Result<()> {
        self.sender.place_order(header, order)
    }

    pub fn cancel_order(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
        order_id: impl Into<String>,
    ) -> Result<()> {
        self.sender.cancel_order(header, account_info, order_id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn replace_order(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
        order_id: impl Into<String>,
        order_type: impl AsRef<str>,
        quantity: f64,
        price: f64,
        stop_price: f64,
        time_in_force: impl AsRef<str>,
        expire_at: f64,
    ) -> Result<()> {
        self.sender.replace_order(
            header,
            account_info,
            order_id,
            order_type,
            quantity,
            price,
            stop_price,
            time_in_force,
            expire_at,
        )
    }

    pub fn cancel_all_orders(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
        symbol: Option<String>,
        side: Option<String>,
    ) -> Result<()> {
        self.sender
            .cancel_all_orders(header, account_info, symbol, side)
    }

    pub fn place_contingent_order(
        &self,
        header: RequestHeader,
        contingent_order: ContingentOrder,
    ) -> Result<()> {
        self.sender.place_contingent_order(header, contingent_order)
    }

    pub fn request_account_data(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
    ) -> Result<()> {
        self.sender.request_account_data(header, account_info)
    }

    pub fn request_account_balances(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
    ) -> Result<()> {
        self.sender.request_account_balances(header, account_info)
    }

    pub fn request_open_positions(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
    ) -> Result<()> {
        self.sender.request_open_positions(header, account_info)
    }

    pub fn request_working_orders(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
    ) -> Result<()> {
        self.sender.request_working_orders(header, account_info)
    }

    pub fn request_order_status(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
        order_id: impl Into<String>,
    ) -> Result<()> {
        self.sender
            .request_order_status(header, account_info, order_id)
    }

    pub fn request_completed_orders(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
        count: Option<i64>,
        since: Option<f64>,
    ) -> Result<()> {
        self.sender
            .request_completed_orders(header, account_info, count, since)
    }

    pub fn request_exchange_properties(
        &self,
        header: RequestHeader,
        exchange: impl AsRef<str>,
    ) -> Result<()> {
        self.sender.request_exchange_properties(header, exchange)
    }

    pub fn request_authorization_refresh(
        &self,
        header: RequestHeader,
        refresh_token: impl Into<String>,
    ) -> Result<()> {
        self.sender
            .request_authorization_refresh(header, refresh_token)
    }

    pub fn send_test_message(
        &self,
        header: RequestHeader,
        payload: impl Into<String>,
    ) -> Result<()> {
        self.sender.send_test_message(header, payload)
    }
}

/// A facade specialized to one `(client_id, sender_comp_id)` tenant: it
/// owns the monotonic `request_id` counter so callers never have to stamp
/// one themselves (spec §4.6, §9 open question — counters live here, not
/// in [`RequestHeader`] itself).
pub struct SingleClientConnection {
    connection: OmegaConnection,
    client_id: i64,
    sender_comp_id: String,
    next_request_id: AtomicI64,
}

impl SingleClientConnection {
    pub fn new(connection: OmegaConnection, client_id: i64) -> Self {
        let sender_comp_id = connection.transport.sender_comp_id().to_string();
        Self {
            connection,
            client_id,
            sender_comp_id,
            next_request_id: AtomicI64::new(1),
        }
    }

    fn header(&self) -> RequestHeader {
        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let mut header = RequestHeader::new(self.client_id, self.sender_comp_id.clone());
        header.request_id = request_id;
        header
    }

    pub async fn start(&self) -> Result<()> {
        self.connection.start().await
    }

    pub async fn wait_until_running(&self, timeout: Option<std::time::Duration>) -> bool {
        self.connection.wait_until_running(timeout).await
    }

    pub fn stop(&self) {
        self.connection.stop();
    }

    pub async fn cleanup(&self) {
        self.connection.cleanup().await;
    }

    pub fn logon(
        &self,
        client_secret: impl Into<String>,
        credentials: Vec<AccountCredentials>,
    ) -> Result<()> {
        self.connection
            .logon(self.header(), client_secret, credentials)
    }

    pub fn logoff(&self) -> Result<()> {
        self.connection.logoff(self.header())
    }

    pub fn send_heartbeat(&self) -> Result<()> {
        self.connection.send_heartbeat(self.header())
    }

    pub fn request_server_time(&self) -> Result<()> {
        self.connection.request_server_time(self.header())
    }

    pub fn place_order(&self, order: Order) -> Result<()> {
        self.connection.place_order(self.header(), order)
    }

    pub fn cancel_order(
        &self,
        account_info: AccountInfo,
        order_id: impl Into<String>,
    ) -> Result<()> {
        self.connection
            .cancel_order(self.header(), account_info, order_id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn replace_order(
        &self,
        account_info: AccountInfo,
        order_id: impl Into<String>,
        order_type: impl AsRef<str>,
        quantity: f64,
        price: f64,
        stop_price: f64,
        time_in_force: impl AsRef<str>,
        expire_at: f64,
    ) -> Result<()> {
        self.connection.replace_order(
            self.header(),
            account_info,
            order_id,
            order_type,
            quantity,
            price,
            stop_price,
            time_in_force,
            expire_at,
        )
    }

    pub fn cancel_all_orders(
        &self,
        account_info: AccountInfo,
        symbol: Option<String>,
        side: Option<String>,
    ) -> Result<()> {
        self.connection
            .cancel_all_orders(self.header(), account_info, symbol, side)
    }

    pub fn place_contingent_order(&self, contingent_order: ContingentOrder) -> Result<()> {
        self.connection
            .place_contingent_order(self.header(), contingent_order)
    }

    pub fn request_account_data(&self, account_info: AccountInfo) -> Result<()> {
        self.connection
            .request_account_data(self.header(), account_info)
    }

    pub fn request_account_balances(&self, account_info: AccountInfo) -> Result<()> {
        self.connection
            .request_account_balances(self.header(), account_info)
    }

    pub fn request_open_positions(&self, account_info: AccountInfo) -> Result<()> {
        self.connection
            .request_open_positions(self.header(), account_info)
    }

    pub fn request_working_orders(&self, account_info: AccountInfo) -> Result<()> {
        self.connection
            .request_working_orders(self.header(), account_info)
    }

    pub fn request_order_status(
        &self,
        account_info: AccountInfo,
        order_id: impl Into<String>,
    ) -> Result<()> {
        self.connection
            .request_order_status(self.header(), account_info, order_id)
    }

    pub fn request_completed_orders(
        &self,
        account_info: AccountInfo,
        count: Option<i64>,
        since: Option<f64>,
    ) -> Result<()> {
        self.connection
            .request_completed_orders(self.header(), account_info, count, since)
    }

    pub fn request_exchange_properties(&self, exchange: impl AsRef<str>) -> Result<()> {
        self.connection
            .request_exchange_properties(self.header(), exchange)
    }

    pub fn request_authorization_refresh(&self, refresh_token: impl Into<String>) -> Result<()> {
        self.connection
            .request_authorization_refresh(self.header(), refresh_token)
    }

    pub fn send_test_message(&self, payload: impl Into<String>) -> Result<()> {
        self.connection.send_test_message(self.header(), payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::PrintingResponseHandler;

    #[test]
    fn single_client_header_increments_request_id() {
        let config = GatewayConfig::new("inproc://connection-test", "sender-y");
        let connection =
            OmegaConnection::configure_single_client(config, Arc::new(PrintingResponseHandler), 42);
        let first = connection.header();
        let second = connection.header();
        assert_eq!(first.client_id, 42);
        assert_eq!(second.request_id, first.request_id + 1);
    }
}
