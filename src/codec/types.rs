//! Wire-level data types: identities, enums, and the order/account shapes
//! carried inside request and report variants.
//!
//! Enum mapping policy (spec §4.1): any textual enum value is resolved
//! case-insensitively against the closed set below; unmatched strings map
//! to that enum's `Undefined` variant instead of raising. This is
//! deliberately permissive — the server is authoritative, the client's
//! role is to transmit, not to judge (spec §4.3).

use serde::{Deserialize, Serialize};

macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant,)+
            Undefined,
        }

        impl $name {
            pub fn as_wire_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Undefined => "undefined",
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(if s.eq_ignore_ascii_case($wire) { return Ok(Self::$variant); })+
                Ok(Self::Undefined)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                s.parse().unwrap()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_wire_str())
            }
        }
    };
}

wire_enum!(Side {
    Buy => "buy",
    Sell => "sell",
});

wire_enum!(OrderType {
    Market => "market",
    Limit => "limit",
    Stop => "stop",
    StopLimit => "stopLimit",
});

wire_enum!(TimeInForce {
    Gtc => "gtc",
    Gtd => "gtd",
    Fok => "fok",
    Ioc => "ioc",
});

wire_enum!(LeverageType {
    None => "none",
    ExchangeDefault => "exchangeDefault",
    Custom => "custom",
});

wire_enum!(Exchange {
    Gemini => "gemini",
    Bitfinex => "bitfinex",
    Bittrex => "bittrex",
    Poloniex => "poloniex",
    Binance => "binance",
    Kraken => "kraken",
    Coinbase => "coinbase",
    Okcoin => "okcoin",
    Huobi => "huobi",
});

wire_enum!(OrderStatus {
    PendingNew => "pendingNew",
    New => "new",
    PartiallyFilled => "partiallyFilled",
    Filled => "filled",
    PendingCancel => "pendingCancel",
    Canceled => "canceled",
    Rejected => "rejected",
    Expired => "expired",
});

/// Stable tenant identifier.
pub type ClientId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_id: i64,
}

impl AccountInfo {
    pub fn new(account_id: i64) -> Self {
        Self { account_id }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCredentials {
    pub account_info: AccountInfo,
    pub api_key: String,
    pub secret_key: String,
    /// Absent passphrase serializes as the schema's empty-string default
    /// (spec §3), not as a wire-level optional.
    pub passphrase: Option<String>,
}

impl AccountCredentials {
    pub fn new(
        account_info: AccountInfo,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        passphrase: Option<String>,
    ) -> Self {
        Self {
            account_info,
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            passphrase,
        }
    }

    pub fn wire_passphrase(&self) -> &str {
        self.passphrase.as_deref().unwrap_or("")
    }
}

/// A single order leg, shared by `place_order` and the contingent order
/// algebra ([`crate::codec::contingent::ContingentOrder`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub account_info: AccountInfo,
    pub client_order_id: String,
    pub client_order_link_id: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: f64,
    pub price: f64,
    pub stop_price: f64,
    pub time_in_force: TimeInForce,
    /// Unix seconds. Only meaningful when `time_in_force == Gtd` (spec §3).
    pub expire_at: f64,
    pub leverage_type: LeverageType,
    /// Only meaningful when `leverage_type == Custom` (spec §3).
    pub leverage: f64,
}

#[allow(clippy::too_many_arguments)]
impl Order {
    pub fn new(
        account_info: AccountInfo,
        client_order_id: impl Into<String>,
        client_order_link_id: impl Into<String>,
        symbol: impl Into<String>,
        side: impl AsRef<str>,
        order_type: impl AsRef<str>,
        quantity: f64,
        price: f64,
        stop_price: f64,
        time_in_force: impl AsRef<str>,
        expire_at: f64,
        leverage_type: impl AsRef<str>,
        leverage: f64,
    ) -> Self {
        Self {
            account_info,
            client_order_id: client_order_id.into(),
            client_order_link_id: client_order_link_id.into(),
            symbol: symbol.into(),
            side: side.as_ref().into(),
            order_type: order_type.as_ref().into(),
            quantity,
            price,
            stop_price,
            time_in_force: time_in_force.as_ref().into(),
            expire_at,
            // Invariant (spec §3): leverage only applies under Custom.
            leverage_type: leverage_type.as_ref().into(),
            leverage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRefresh {
    pub refresh_token: String,
}

impl AuthorizationRefresh {
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn enum_mapping_is_case_insensitive() {
        assert_eq!(Exchange::from_str("GEMINI").unwrap(), Exchange::Gemini);
        assert_eq!(Exchange::from_str("Gemini").unwrap(), Exchange::Gemini);
    }

    #[test]
    fn unknown_enum_value_maps_to_undefined() {
        assert_eq!(Exchange::from_str("gdax").unwrap(), Exchange::Undefined);
    }

    #[test]
    fn wire_passphrase_defaults_to_empty_string() {
        let creds = AccountCredentials::new(AccountInfo::new(1), "k", "s", None);
        assert_eq!(creds.wire_passphrase(), "");
    }
}
