//! Property-based test generators using proptest.
//!
//! Generated values stay inside what the wire format can carry: money
//! in whole cents, external ids within the length limit.

use proptest::prelude::*;
use serde_json::json;
use tillsync_codec::{Money, WireRecord};
use tillsync_model::{
    ExternalId, Order, OrderStatus, PaymentMethod, ServiceType, MAX_EXTERNAL_ID_LEN,
};

use crate::fixtures::record;

/// Strategy for amounts between 0 and 100 000.00.
pub fn money_strategy() -> impl Strategy<Value = Money> {
    (0i64..10_000_000).prop_map(Money::from_cents)
}

/// Strategy for external ids: either UUIDs or short peer-style slugs.
pub fn external_id_strategy() -> impl Strategy<Value = ExternalId> {
    let slug = format!("[a-z][a-z0-9-]{{0,{}}}", MAX_EXTERNAL_ID_LEN - 1);
    prop_oneof![
        any::<u128>().prop_map(|bits| ExternalId::from(uuid::Uuid::from_u128(bits))),
        prop::string::string_regex(&slug)
            .expect("Invalid regex")
            .prop_map(|s| ExternalId::parse(&s).expect("slug is a valid id")),
    ]
}

/// Strategy for order statuses.
pub fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::Pending),
        Just(OrderStatus::Paid),
        Just(OrderStatus::Cancelled),
    ]
}

/// Strategy for orders; only paid orders carry a payment method.
pub fn order_strategy() -> impl Strategy<Value = Order> {
    (
        "[A-Z]-[0-9]{1,5}",
        money_strategy(),
        order_status_strategy(),
        prop_oneof![
            Just(ServiceType::OnTable),
            Just(ServiceType::TakeAway),
            Just(ServiceType::Delivery),
        ],
        1i64..5,
    )
        .prop_map(|(order_number, total, status, service_type, branch_id)| Order {
            order_number,
            total_amount: total,
            payment_method: (status == OrderStatus::Paid).then_some(PaymentMethod::Cash),
            service_type,
            status,
            branch_id,
            ..Default::default()
        })
}

/// Strategy for category records as the Cloud sends them.
pub fn category_record_strategy() -> impl Strategy<Value = WireRecord> {
    (external_id_strategy(), "[A-Za-z ]{1,24}", any::<bool>(), 0i32..100).prop_map(
        |(external_id, name, is_active, order_index)| {
            record(json!({
                "external_id": external_id.as_str(),
                "name": name,
                "is_active": is_active,
                "order_index": order_index,
                "branch_id": 1,
            }))
        },
    )
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
