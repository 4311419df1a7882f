//! Customer Store
//!
//! In-memory customer and order records. The store is owned by whoever builds
//! the tool set and shared with the tools through an `Arc`.

use rust_decimal_macros::dec;
use tokio::sync::RwLock;

use crate::model::{CancelOutcome, Customer, LookupKey, Order, OrderStatus, UserLookup};

#[derive(Debug, Default)]
struct Records {
    customers: Vec<Customer>,
    orders: Vec<Order>,
}

#[derive(Debug, Default)]
pub struct CustomerStore {
    records: RwLock<Records>,
}

impl CustomerStore {
    pub fn new(customers: Vec<Customer>, orders: Vec<Order>) -> Self {
        Self {
            records: RwLock::new(Records { customers, orders }),
        }
    }

    /// The demo data set
    pub fn sample() -> Self {
        use OrderStatus::{Delivered, Processing, Shipped};

        let customers = vec![
            Customer::new("1213210", "John Doe", "john@gmail.com", "123-456-7890", "johndoe"),
            Customer::new("2837622", "Priya Patel", "priya@candy.com", "987-654-3210", "priya123"),
            Customer::new("3924156", "Liam Nguyen", "lnguyen@yahoo.com", "555-123-4567", "liamn"),
            Customer::new("4782901", "Aaliyah Davis", "aaliyahd@hotmail.com", "111-222-3333", "adavis"),
            Customer::new("5190753", "Hiroshi Nakamura", "hiroshi@gmail.com", "444-555-6666", "hiroshin"),
            Customer::new("6824095", "Fatima Ahmed", "fatimaa@outlook.com", "777-888-9999", "fatimaahmed"),
            Customer::new("7135680", "Alejandro Rodriguez", "arodriguez@protonmail.com", "222-333-4444", "alexr"),
            Customer::new("8259147", "Megan Anderson", "megana@gmail.com", "666-777-8888", "manderson"),
            Customer::new("9603481", "Kwame Osei", "kwameo@yahoo.com", "999-000-1111", "kwameo"),
            Customer::new("1057426", "Mei Lin", "meilin@gmail.com", "333-444-5555", "mlin"),
        ];

        let orders = vec![
            Order::new("24601", "1213210", "Wireless Headphones", 1, dec!(79.99), Shipped),
            Order::new("13579", "1213210", "Smartphone Case", 2, dec!(19.99), Processing),
            Order::new("97531", "2837622", "Bluetooth Speaker", 1, dec!(49.99), Shipped),
            Order::new("86420", "3924156", "Fitness Tracker", 1, dec!(129.99), Delivered),
            Order::new("54321", "4782901", "Laptop Sleeve", 3, dec!(24.99), Shipped),
            Order::new("19283", "5190753", "Wireless Mouse", 1, dec!(34.99), Processing),
            Order::new("74651", "6824095", "Gaming Keyboard", 1, dec!(89.99), Delivered),
            Order::new("30298", "7135680", "Portable Charger", 2, dec!(29.99), Shipped),
            Order::new("47652", "8259147", "Smartwatch", 1, dec!(199.99), Processing),
            Order::new("61984", "9603481", "Noise-Cancelling Headphones", 1, dec!(149.99), Shipped),
            Order::new("58243", "1057426", "Wireless Earbuds", 2, dec!(99.99), Delivered),
            Order::new("90357", "1213210", "Smartphone Case", 1, dec!(19.99), Shipped),
            Order::new("28164", "2837622", "Wireless Headphones", 2, dec!(79.99), Processing),
        ];

        Self::new(customers, orders)
    }

    pub async fn customers(&self) -> Vec<Customer> {
        self.records.read().await.customers.clone()
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.records.read().await.orders.clone()
    }

    /// Exact match on email, phone or username
    pub async fn find_user(&self, key: &str, value: &str) -> UserLookup {
        let lookup_key = match key.parse::<LookupKey>() {
            Ok(k) => k,
            Err(_) => return UserLookup::InvalidKey(key.to_string()),
        };

        let records = self.records.read().await;
        records
            .customers
            .iter()
            .find(|c| c.field(lookup_key) == value)
            .map_or_else(
                || UserLookup::NotFound {
                    key: key.to_string(),
                    value: value.to_string(),
                },
                |c| UserLookup::Found(c.clone()),
            )
    }

    pub async fn order(&self, order_id: &str) -> Option<Order> {
        let records = self.records.read().await;
        records.orders.iter().find(|o| o.id == order_id).cloned()
    }

    pub async fn customer_orders(&self, customer_id: &str) -> Vec<Order> {
        let records = self.records.read().await;
        records
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect()
    }

    /// Only orders still in `Processing` can be cancelled
    pub async fn cancel_order(&self, order_id: &str) -> CancelOutcome {
        let mut records = self.records.write().await;
        let Some(order) = records.orders.iter_mut().find(|o| o.id == order_id) else {
            return CancelOutcome::NotFound;
        };

        match order.status {
            OrderStatus::Processing => {
                order.status = OrderStatus::Cancelled;
                tracing::info!(order_id, "Order cancelled");
                CancelOutcome::Cancelled
            }
            OrderStatus::Cancelled => CancelOutcome::AlreadyCancelled,
            status => CancelOutcome::NotCancellable(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_counts() {
        let store = CustomerStore::sample();
        assert_eq!(store.customers().await.len(), 10);
        assert_eq!(store.orders().await.len(), 13);
    }

    #[tokio::test]
    async fn test_find_user() {
        let store = CustomerStore::sample();

        match store.find_user("email", "john@gmail.com").await {
            UserLookup::Found(c) => assert_eq!(c.id, "1213210"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            store.find_user("phone", "000-000-0000").await,
            UserLookup::NotFound { .. }
        ));
        assert_eq!(
            store.find_user("id", "1213210").await,
            UserLookup::InvalidKey("id".into())
        );
    }

    #[tokio::test]
    async fn test_customer_orders() {
        let store = CustomerStore::sample();
        let ids: Vec<String> = store
            .customer_orders("1213210")
            .await
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec!["24601", "13579", "90357"]);
        assert!(store.customer_orders("0000000").await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_transitions() {
        let store = CustomerStore::sample();

        assert_eq!(store.cancel_order("13579").await, CancelOutcome::Cancelled);
        assert_eq!(
            store.order("13579").await.unwrap().status,
            OrderStatus::Cancelled
        );
        assert_eq!(store.cancel_order("13579").await, CancelOutcome::AlreadyCancelled);
        assert_eq!(
            store.cancel_order("24601").await,
            CancelOutcome::NotCancellable(OrderStatus::Shipped)
        );
        assert_eq!(store.cancel_order("11111").await, CancelOutcome::NotFound);
    }
}
