//! The Request Sender (C3): a thin, stateless-modulo-access-token façade
//! that builds a wire envelope from caller arguments and enqueues it on
//! the transport.
//!
//! Per the redesign notes (spec §9), request methods return `()` —
//! "fire-and-enqueue", not a promise of delivery or reply. The codec's
//! `build_*` functions remain public for direct inspection in tests,
//! rather than smuggling a builder back out of the production API.

use std::sync::Arc;

use crate::codec::{self, AccountCredentials, AccountInfo, ContingentOrder, Order, RequestHeader};
use crate::error::Result;
use crate::token::AccessTokenSlot;
use crate::transport::Transport;

pub struct RequestSender {
    transport: Arc<Transport>,
    access_token: Arc<AccessTokenSlot>,
}

impl RequestSender {
    pub fn new(transport: Arc<Transport>, access_token: Arc<AccessTokenSlot>) -> Self {
        Self {
            transport,
            access_token,
        }
    }

    /// Stamp the current access token into `header`, except for `logon`
    /// (spec §4.3 point 1, §8 "Logon bypass").
    fn stamped(&self, mut header: RequestHeader) -> RequestHeader {
        header.access_token = (*self.access_token.get()).clone();
        header
    }

    fn send(&self, bytes: Vec<u8>) -> Result<()> {
        self.transport.enqueue(bytes)
    }

    pub fn logon(
        &self,
        header: RequestHeader,
        client_secret: impl Into<String>,
        credentials: Vec<AccountCredentials>,
    ) -> Result<()> {
        // Bypassed: header's access_token (including empty) travels
        // unchanged (spec §8 "Logon bypass").
        let envelope = codec::build_logon(header, client_secret, credentials);
        self.send(codec::encode(&envelope)?)
    }

    pub fn logoff(&self, header: RequestHeader) -> Result<()> {
        let envelope = codec::build_logoff(self.stamped(header));
        self.send(codec::encode(&envelope)?)
    }

    pub fn send_heartbeat(&self, header: RequestHeader) -> Result<()> {
        let envelope = codec::build_heartbeat(self.stamped(header));
        self.send(codec::encode(&envelope)?)
    }

    pub fn request_server_time(&self, header: RequestHeader) -> Result<()> {
        let envelope = codec::build_server_time_request(self.stamped(header));
        self.send(codec::encode(&envelope)?)
    }

    pub fn place_order(&self, header: RequestHeader, order: Order) -> Result<()> {
        let envelope = codec::build_place_order(self.stamped(header), order);
        self.send(codec::encode(&envelope)?)
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
        let envelope = codec::build_replace_order(
            self.stamped(header),
            account_info,
            order_id,
            order_type,
            quantity,
            price,
            stop_price,
            time_in_force,
            expire_at,
        );
        self.send(codec::encode(&envelope)?)
    }

    pub fn cancel_order(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
        order_id: impl Into<String>,
    ) -> Result<()> {
        let envelope = codec::build_cancel_order(self.stamped(header), account_info, order_id);
        self.send(codec::encode(&envelope)?)
    }

    pub fn cancel_all_orders(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
        symbol: Option<String>,
        side: Option<String>,
    ) -> Result<()> {
        let envelope =
            codec::build_cancel_all_orders(self.stamped(header), account_info, symbol, side);
        self.send(codec::encode(&envelope)?)
    }

    pub fn request_account_data(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
    ) -> Result<()> {
        let envelope = codec::build_request_account_data(self.stamped(header), account_info);
        self.send(codec::encode(&envelope)?)
    }

    pub fn request_account_balances(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
    ) -> Result<()> {
        let envelope = codec::build_request_account_balances(self.stamped(header), account_info);
        self.send(codec::encode(&envelope)?)
    }

    pub fn request_open_positions(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
    ) -> Result<()> {
        let envelope = codec::build_request_open_positions(self.stamped(header), account_info);
        self.send(codec::encode(&envelope)?)
    }

    pub fn request_working_orders(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
    ) -> Result<()> {
        let envelope = codec::build_request_working_orders(self.stamped(header), account_info);
        self.send(codec::encode(&envelope)?)
    }

    pub fn request_order_status(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
        order_id: impl Into<String>,
    ) -> Result<()> {
        let envelope =
            codec::build_request_order_status(self.stamped(header), account_info, order_id);
        self.send(codec::encode(&envelope)?)
    }

    pub fn request_completed_orders(
        &self,
        header: RequestHeader,
        account_info: AccountInfo,
        count: Option<i64>,
        since: Option<f64>,
    ) -> Result<()> {
        let envelope =
            codec::build_request_completed_orders(self.stamped(header), account_info, count, since);
        self.send(codec::encode(&envelope)?)
    }

    pub fn request_exchange_properties(
        &self,
        header: RequestHeader,
        exchange: impl AsRef<str>,
    ) -> Result<()> {
        let envelope = codec::build_request_exchange_properties(self.stamped(header), exchange);
        self.send(codec::encode(&envelope)?)
    }

    pub fn request_authorization_refresh(
        &self,
        header: RequestHeader,
        refresh_token: impl Into<String>,
    ) -> Result<()> {
        let envelope = codec::build_authorization_refresh(self.stamped(header), refresh_token);
        self.send(codec::encode(&envelope)?)
    }

    pub fn place_contingent_order(
        &self,
        header: RequestHeader,
        contingent_order: ContingentOrder,
    ) -> Result<()> {
        let envelope = codec::build_place_contingent_order(self.stamped(header), contingent_order);
        self.send(codec::encode(&envelope)?)
    }

    pub fn send_test_message(
        &self,
        header: RequestHeader,
        payload: impl Into<String>,
    ) -> Result<()> {
        let envelope = codec::build_test_message(self.stamped(header), payload);
        self.send(codec::encode(&envelope)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    fn sender() -> RequestSender {
        let transport = Arc::new(Transport::new(GatewayConfig::new(
            "inproc://sender-test",
            "sender-x",
        )));
        RequestSender::new(transport, Arc::new(AccessTokenSlot::new()))
    }

    #[test]
    fn rejects_when_transport_not_running() {
        let sender = sender();
        let header = RequestHeader::new(1, "sender-x");
        assert!(sender.send_heartbeat(header).is_err());
    }
}
