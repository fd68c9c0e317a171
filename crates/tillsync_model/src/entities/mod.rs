//! Entity definitions.
//!
//! Each entity is declared once with `syncable_entity!`, which derives the
//! struct and its [`Syncable`](crate::Syncable) impl from the field list.
//! Every listed field is mapped on the wire under its Rust name. An owned
//! child names its parent link with `owned by`; that column is node-local
//! and is not mapped.

macro_rules! syncable_entity {
    (
        $(#[$meta:meta])*
        pub struct $name:ident as $type_name:literal in $class:ident $(, owned by $parent:ident)? {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
            $(
                #[doc = "Local id of the owning row."]
                pub $parent: Option<i64>,
            )?
        }

        impl $crate::Syncable for $name {
            const TYPE_NAME: &'static str = $type_name;
            const CLASS: $crate::EntityClass = $crate::EntityClass::$class;

            fn encode_fields(&self, record: &mut ::tillsync_codec::WireRecord) {
                $( ::tillsync_codec::put(record, stringify!($field), &self.$field); )*
            }

            fn apply_update(
                &mut self,
                record: &::tillsync_codec::WireRecord,
            ) -> ::tillsync_codec::CodecResult<()> {
                $( ::tillsync_codec::take(record, stringify!($field), &mut self.$field)?; )*
                Ok(())
            }

            $(
                fn parent_id(&self) -> Option<i64> {
                    self.$parent
                }

                fn set_parent_id(&mut self, id: Option<i64>) {
                    self.$parent = id;
                }
            )?
        }
    };
}

#[allow(missing_docs)]
mod reference;
#[allow(missing_docs)]
mod transactional;

pub use reference::{
    AdminPinCode, AppSettings, Branch, CashierPin, Category, CategoryKitchenAssignment,
    CategorySpecialItemAssignment, DeliveryCompany, InventoryItem, Kitchen, MenuItem, Table, User,
    UserBranchAssignment,
};
pub use transactional::{
    CashierSession, Customer, KitchenOrder, KitchenOrderItem, ManualCardPayment, Order,
    OrderEditHistory, OrderItem, Payment, WaiterCashierAssignment,
};
