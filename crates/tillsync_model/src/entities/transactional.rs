//! Rows created at the Edge and pushed to the Cloud.

use crate::enums::{KitchenOrderStatus, OrderStatus, PaymentMethod, ServiceType};
use chrono::{DateTime, NaiveDate, Utc};
use tillsync_codec::Money;

syncable_entity! {
    /// A customer order. Aggregate root of its items and payments.
    pub struct Order as "Order" in Transactional {
        /// Human-facing order number.
        pub order_number: String,
        /// Total charged, after discount and tax.
        pub total_amount: Money,
        /// Discount applied.
        pub discount_amount: Money,
        /// Tax included in the total.
        pub tax_amount: Money,
        /// Payment method, once paid.
        pub payment_method: Option<PaymentMethod>,
        /// How the order is served.
        pub service_type: ServiceType,
        /// Order status.
        pub status: OrderStatus,
        /// Delivery company, for delivery orders.
        pub delivery_company_id: Option<i64>,
        /// Free-form notes.
        pub notes: Option<String>,
        /// Creation time.
        pub created_at: DateTime<Utc>,
        /// Time the order was marked paid.
        pub paid_at: Option<DateTime<Utc>>,
        /// Hidden from the waiter request list.
        pub cleared_from_waiter_requests: bool,
        /// Owning branch.
        pub branch_id: i64,
        /// Cashier who created the order.
        pub cashier_id: Option<i64>,
        /// Cashier the waiter assigned the order to.
        pub assigned_cashier_id: Option<i64>,
        /// Table, for table service.
        pub table_id: Option<i64>,
        /// Customer, if known.
        pub customer_id: Option<i64>,
    }
}

syncable_entity! {
    /// A line of an order.
    pub struct OrderItem as "OrderItem" in Transactional, owned by order_id {
        /// Units ordered.
        pub quantity: i32,
        /// Price per unit.
        pub unit_price: Money,
        /// Line total.
        pub total_price: Money,
        /// Price of selected modifiers, included in the line total.
        pub modifiers_total_price: Money,
        /// Kitchen notes.
        pub notes: Option<String>,
        /// Menu item ordered.
        pub menu_item_id: i64,
    }
}

syncable_entity! {
    /// A payment against an order.
    pub struct Payment as "Payment" in Transactional, owned by order_id {
        /// Amount paid.
        pub amount: Money,
        /// Method used.
        pub payment_method: PaymentMethod,
        /// Processor transaction reference.
        pub transaction_id: Option<String>,
        /// Processor status text.
        pub status: String,
        /// Time of payment.
        pub created_at: DateTime<Utc>,
    }
}

syncable_entity! {
    /// A ticket sent to a kitchen.
    pub struct KitchenOrder as "KitchenOrder" in Transactional {
        /// Order the ticket belongs to.
        pub order_id: Option<i64>,
        /// Kitchen preparing the ticket.
        pub kitchen_id: i64,
        pub ticket_number: String,
        pub status: KitchenOrderStatus,
        pub created_at: DateTime<Utc>,
        /// Time the ticket was marked ready.
        pub ready_at: Option<DateTime<Utc>>,
        pub branch_id: i64,
    }
}

syncable_entity! {
    /// A line on a kitchen ticket.
    pub struct KitchenOrderItem as "KitchenOrderItem" in Transactional {
        pub kitchen_order_id: Option<i64>,
        pub order_item_id: Option<i64>,
        /// Menu item name as printed on the ticket.
        pub menu_item_name: String,
        pub quantity: i32,
        pub notes: Option<String>,
        pub status: KitchenOrderStatus,
    }
}

syncable_entity! {
    /// A cashier's working session for one day.
    pub struct CashierSession as "CashierSession" in Transactional {
        pub session_id: String,
        pub login_date: NaiveDate,
        /// Orders the cashier had already taken when the session opened.
        pub initial_order_count: i32,
        pub current_order_count: i32,
        pub daily_report_printed: bool,
        pub report_printed_at: Option<DateTime<Utc>>,
        pub session_start: DateTime<Utc>,
        pub last_activity: DateTime<Utc>,
        pub is_active: bool,
        pub branch_id: i64,
        pub cashier_id: i64,
    }
}

syncable_entity! {
    /// A customer known to a branch.
    pub struct Customer as "Customer" in Transactional {
        pub name: String,
        pub phone: Option<String>,
        pub email: Option<String>,
        pub is_loyalty_member: bool,
        pub total_spent: Money,
        pub visits_count: i32,
        pub created_at: DateTime<Utc>,
        pub branch_id: i64,
    }
}

syncable_entity! {
    /// A card payment keyed in by hand when the terminal is unavailable.
    pub struct ManualCardPayment as "ManualCardPayment" in Transactional {
        pub order_id: Option<i64>,
        pub amount: Money,
        pub card_last_four: Option<String>,
        pub approval_code: Option<String>,
        pub cashier_id: Option<i64>,
        pub notes: Option<String>,
        pub created_at: DateTime<Utc>,
        pub branch_id: i64,
    }
}

syncable_entity! {
    /// An audit entry for an edit made to an order after it was placed.
    pub struct OrderEditHistory as "OrderEditHistory" in Transactional {
        pub order_id: Option<i64>,
        /// User who made the edit.
        pub edited_by: Option<i64>,
        pub change_summary: String,
        pub previous_total: Money,
        pub new_total: Money,
        pub edited_at: DateTime<Utc>,
    }
}

syncable_entity! {
    /// Which cashier a waiter hands orders to.
    pub struct WaiterCashierAssignment as "WaiterCashierAssignment" in Transactional {
        pub waiter_id: i64,
        pub cashier_id: i64,
        pub branch_id: i64,
        pub is_active: bool,
        pub assigned_at: DateTime<Utc>,
    }
}
