//! The contingent order algebra (spec §3, §4.1): `Batch`, `OCO`, and `OPO`,
//! where `OPO.secondary` is itself restricted to `Batch | OCO` (recursion
//! depth fixed at 2 — an `OPO` cannot trigger another `OPO`).

use serde::{Deserialize, Serialize};

use super::types::Order;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub orders: Vec<Order>,
}

impl Batch {
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Oco {
    pub orders: Vec<Order>,
}

impl Oco {
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }
}

/// The restricted sum `Batch | OCO` usable as an `OPO`'s secondary leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BatchOrOco {
    Batch(Batch),
    Oco(Oco),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opo {
    pub primary: Order,
    pub secondary: Box<BatchOrOco>,
}

impl Opo {
    pub fn new(primary: Order, secondary: BatchOrOco) -> Self {
        Self {
            primary,
            secondary: Box::new(secondary),
        }
    }
}

/// In-memory contingent order sum type. The codec flattens this into the
/// wire's recursive tagged union without loss (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ContingentOrder {
    Batch(Batch),
    Oco(Oco),
    Opo(Opo),
}

impl ContingentOrder {
    pub fn batch(orders: Vec<Order>) -> Self {
        Self::Batch(Batch::new(orders))
    }

    pub fn oco(orders: Vec<Order>) -> Self {
        Self::Oco(Oco::new(orders))
    }

    pub fn opo(primary: Order, secondary: BatchOrOco) -> Self {
        Self::Opo(Opo::new(primary, secondary))
    }
}
