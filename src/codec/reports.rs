//! Inbound report payload shapes: the data carried by each of Omega's
//! asynchronous reply variants (spec §4.1).

use serde::{Deserialize, Serialize};

use super::types::{
    AccountInfo, Exchange, LeverageType, OrderStatus, OrderType, Side, TimeInForce,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub account_info: AccountInfo,
    pub order_id: String,
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub order_status: OrderStatus,
    pub price: f64,
    pub quantity: f64,
    pub filled_quantity: f64,
    pub avg_fill_price: f64,
    pub limit_price: f64,
    pub stop_price: f64,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderInfo {
    pub account_info: AccountInfo,
    pub order_id: String,
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub order_status: OrderStatus,
    pub price: f64,
    pub quantity: f64,
    pub filled_quantity: f64,
    pub time_in_force: TimeInForce,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    pub asset: String,
    pub full_balance: f64,
    pub available_balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub account_info: AccountInfo,
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub initial_price: f64,
    pub unrealized_pl: f64,
    pub leverage_type: LeverageType,
    pub leverage: f64,
    pub liquidation_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDataReport {
    pub account_info: AccountInfo,
    pub balances: Vec<AccountBalance>,
    pub positions: Vec<OpenPosition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalancesReport {
    pub account_info: AccountInfo,
    pub balances: Vec<AccountBalance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPositionsReport {
    pub account_info: AccountInfo,
    pub positions: Vec<OpenPosition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingOrdersReport {
    pub account_info: AccountInfo,
    pub orders: Vec<OrderInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedOrdersReport {
    pub account_info: AccountInfo,
    pub orders: Vec<OrderInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusReport {
    pub account_info: AccountInfo,
    pub order: OrderInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolProperties {
    pub symbol: String,
    pub price_decimals: u32,
    pub quantity_decimals: u32,
    pub min_quantity: f64,
    pub max_quantity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangePropertiesReport {
    pub exchange: Exchange,
    pub symbol_properties: Vec<SymbolProperties>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogonAck {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoffAck {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until `access_token` expires. The session manager schedules
    /// the next refresh at `expires_in * refresh_safety_fraction`.
    pub expires_in: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemNotification {
    pub message: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReply {
    pub payload: String,
}
