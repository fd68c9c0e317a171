//! Closed enumerations used by entity columns.

use serde_json::Value;
use std::fmt;
use tillsync_codec::{enum_from_wire, enum_to_wire, CodecResult, WireEnum, WireField};

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl WireEnum for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const VARIANTS: &'static [Self] = &[$($name::$variant),+];

            fn as_wire(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }
        }

        impl WireField for $name {
            fn to_wire(&self) -> Value {
                enum_to_wire(self)
            }

            fn from_wire(value: &Value) -> CodecResult<Self> {
                enum_from_wire(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_wire())
            }
        }
    };
}

wire_enum! {
    /// Lifecycle of an order.
    #[derive(Default)]
    pub enum OrderStatus {
        /// Created but not paid.
        #[default]
        Pending => "pending",
        /// Paid; counts toward revenue.
        Paid => "paid",
        /// Cancelled.
        Cancelled => "cancelled",
    }
}

wire_enum! {
    /// How a payment was taken.
    #[derive(Default)]
    pub enum PaymentMethod {
        /// Cash.
        #[default]
        Cash => "cash",
        /// Card terminal.
        Card => "card",
        /// QR code wallet.
        QrCode => "qr_code",
    }
}

wire_enum! {
    /// How an order is served.
    #[derive(Default)]
    pub enum ServiceType {
        /// Served at a table.
        #[default]
        OnTable => "on_table",
        /// Collected by the customer.
        TakeAway => "take_away",
        /// Delivered by a delivery company.
        Delivery => "delivery",
        /// Card-only counter service.
        Card => "card",
    }
}

wire_enum! {
    /// Progress of a ticket in the kitchen.
    #[derive(Default)]
    pub enum KitchenOrderStatus {
        /// Ticket received.
        #[default]
        Received => "received",
        /// Being prepared.
        Preparing => "preparing",
        /// Ready for pickup.
        Ready => "ready",
        /// Served to the customer.
        Served => "served",
    }
}

wire_enum! {
    /// Staff role.
    #[derive(Default)]
    pub enum UserRole {
        /// Manages every branch.
        SuperUser => "super_user",
        /// Manages one branch.
        BranchAdmin => "branch_admin",
        /// Branch manager.
        Manager => "manager",
        /// Cashier.
        #[default]
        Cashier => "cashier",
        /// Waiter.
        Waiter => "waiter",
        /// Kitchen staff.
        Kitchen => "kitchen",
    }
}
