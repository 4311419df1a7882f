//! Domain Models
//!
//! Customers and their orders. Prices use `rust_decimal`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub username: String,
}

impl Customer {
    pub fn new(
        id: &str,
        name: &str,
        email: &str,
        phone: &str,
        username: &str,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            username: username.into(),
        }
    }

    /// Value of the attribute a lookup key refers to
    pub fn field(&self, key: LookupKey) -> &str {
        match key {
            LookupKey::Email => &self.email,
            LookupKey::Phone => &self.phone,
            LookupKey::Username => &self.username,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub product: String,
    pub quantity: u32,
    pub price: Decimal,
    pub status: OrderStatus,
}

impl Order {
    pub fn new(
        id: &str,
        customer_id: &str,
        product: &str,
        quantity: u32,
        price: Decimal,
        status: OrderStatus,
    ) -> Self {
        Self {
            id: id.into(),
            customer_id: customer_id.into(),
            product: product.into(),
            quantity,
            price,
            status,
        }
    }
}

/// Attributes a customer can be looked up by
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupKey {
    Email,
    Phone,
    Username,
}

impl FromStr for LookupKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "username" => Ok(Self::Username),
            other => Err(StoreError::InvalidKey(other.to_string())),
        }
    }
}

/// Result of a customer lookup. None of these is an error to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserLookup {
    Found(Customer),
    NotFound { key: String, value: String },
    InvalidKey(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    AlreadyCancelled,
    /// Past the point where it can be stopped
    NotCancellable(OrderStatus),
    NotFound,
}
