//! Order payment.

use std::fmt;

use tracing::info;
use txscope_resource::MemoryStore;
use txscope_session::Session;
use txscope_transaction::{TransactionDefinition, TransactionResult};

use crate::error::{ServiceError, ServiceResult};

pub const ORDER_TABLE: &str = "orders";

/// Customers with this name trigger a payment system failure.
pub const SYSTEM_FAILURE_CUSTOMER: &str = "exception";
/// Customers with this name do not have enough money.
pub const INSUFFICIENT_FUNDS_CUSTOMER: &str = "insufficient";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayStatus {
    Waiting,
    Complete,
}

impl PayStatus {
    fn as_str(&self) -> &'static str {
        match self {
            PayStatus::Waiting => "waiting",
            PayStatus::Complete => "complete",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(PayStatus::Waiting),
            "complete" => Some(PayStatus::Complete),
            _ => None,
        }
    }
}

impl fmt::Display for PayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: u64,
    pub username: String,
    pub pay_status: Option<PayStatus>,
}

impl Order {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            pay_status: None,
        }
    }

    fn encode(&self) -> String {
        let status = self.pay_status.map_or("", |s| s.as_str());
        format!("{}|{}", self.username, status)
    }

    fn decode(id: u64, row: &str) -> Option<Self> {
        let (username, status) = row.split_once('|')?;
        Some(Self {
            id,
            username: username.to_string(),
            pay_status: PayStatus::parse(status),
        })
    }
}

pub struct OrderRepository;

impl OrderRepository {
    /// Save within the caller's transaction.
    pub fn save(session: &mut Session<'_, MemoryStore>, order: &Order) -> TransactionResult<()> {
        session
            .connection()?
            .put(ORDER_TABLE, &order.id.to_string(), order.encode());
        Ok(())
    }

    pub fn find_by_id(store: &MemoryStore, id: u64) -> Option<Order> {
        store
            .get(ORDER_TABLE, &id.to_string())
            .and_then(|row| Order::decode(id, &row))
    }
}

pub struct OrderService {
    definition: TransactionDefinition,
}

impl Default for OrderService {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderService {
    pub fn new() -> Self {
        Self {
            definition: TransactionDefinition::required().with_name("order.pay"),
        }
    }

    /// Save and pay for `order`.
    ///
    /// A payment system failure rolls the order back. Insufficient funds
    /// keep the order in [`PayStatus::Waiting`] and report
    /// [`ServiceError::NotEnoughMoney`] so the caller can notify the
    /// customer.
    pub fn order(
        &self,
        session: &mut Session<'_, MemoryStore>,
        order: &mut Order,
    ) -> ServiceResult<()> {
        session.transactional(&self.definition, |s, _| {
            info!(order = order.id, "order call");
            OrderRepository::save(s, order)?;

            info!(order = order.id, "entering payment process");
            match order.username.as_str() {
                SYSTEM_FAILURE_CUSTOMER => {
                    info!(order = order.id, "system failure");
                    Err(ServiceError::PaymentSystem { order: order.id })
                }
                INSUFFICIENT_FUNDS_CUSTOMER => {
                    info!(order = order.id, "insufficient balance, business failure");
                    order.pay_status = Some(PayStatus::Waiting);
                    OrderRepository::save(s, order)?;
                    Err(ServiceError::NotEnoughMoney { order: order.id })
                }
                _ => {
                    info!(order = order.id, "payment approved");
                    order.pay_status = Some(PayStatus::Complete);
                    OrderRepository::save(s, order)?;
                    Ok(())
                }
            }
        })
    }
}
