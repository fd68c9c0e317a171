//! Master and configuration rows managed at the Cloud and pulled by the Edge.

use crate::enums::UserRole;
use chrono::{DateTime, Utc};
use tillsync_codec::{Money, Rate};

syncable_entity! {
    /// A restaurant branch.
    pub struct Branch as "Branch" in Reference {
        pub name: String,
        /// Short unique branch code.
        pub code: String,
        pub address: Option<String>,
        pub phone: Option<String>,
        pub email: Option<String>,
        pub manager_name: Option<String>,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        /// IANA time zone name.
        pub timezone: String,
        /// ISO 4217 currency code.
        pub currency: String,
        pub tax_rate: Rate,
        pub service_charge: Rate,
    }
}

syncable_entity! {
    /// A staff account.
    pub struct User as "User" in Reference {
        pub username: String,
        pub email: String,
        pub password_hash: String,
        pub first_name: String,
        pub last_name: String,
        pub role: UserRole,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        pub last_login: Option<DateTime<Utc>>,
        /// Home branch; `None` for super users.
        pub branch_id: Option<i64>,
        pub can_access_multiple_branches: bool,
    }
}

syncable_entity! {
    /// Grants a user access to an additional branch.
    pub struct UserBranchAssignment as "UserBranchAssignment" in Reference {
        pub user_id: i64,
        pub branch_id: i64,
        pub assigned_at: DateTime<Utc>,
        pub assigned_by: Option<i64>,
        pub is_active: bool,
    }
}

syncable_entity! {
    /// A menu category.
    pub struct Category as "Category" in Reference {
        pub name: String,
        pub description: Option<String>,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        /// Position in the menu.
        pub order_index: i32,
        pub branch_id: i64,
    }
}

syncable_entity! {
    /// A sellable menu item.
    pub struct MenuItem as "MenuItem" in Reference {
        pub name: String,
        pub name_ar: Option<String>,
        pub description: Option<String>,
        pub description_ar: Option<String>,
        pub price: Money,
        pub cost: Option<Money>,
        pub image_url: Option<String>,
        pub is_active: bool,
        pub is_vegetarian: bool,
        pub is_vegan: bool,
        pub created_at: DateTime<Utc>,
        /// Card background on the cashier screen, as a CSS color.
        pub card_color: String,
        pub size_flag: String,
        pub portion_type: String,
        pub visual_priority: String,
        pub branch_id: i64,
        pub category_id: i64,
        /// Category the item was in before being moved to a special category.
        pub original_category_id: Option<i64>,
    }
}

syncable_entity! {
    /// A dining table.
    pub struct Table as "Table" in Reference {
        pub table_number: String,
        pub capacity: i32,
        pub description: Option<String>,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        pub branch_id: i64,
    }
}

syncable_entity! {
    /// A third-party delivery company.
    pub struct DeliveryCompany as "DeliveryCompany" in Reference {
        pub name: String,
        /// Value stored on orders.
        pub value: String,
        /// Icon class name.
        pub icon: String,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        pub branch_id: i64,
    }
}

syncable_entity! {
    /// A kitchen station that receives tickets.
    pub struct Kitchen as "Kitchen" in Reference {
        pub name: String,
        pub printer_name: Option<String>,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        pub branch_id: i64,
    }
}

syncable_entity! {
    /// Routes a category's items to a kitchen.
    pub struct CategoryKitchenAssignment as "CategoryKitchenAssignment" in Reference {
        pub category_id: i64,
        pub kitchen_id: i64,
        pub branch_id: i64,
        pub is_active: bool,
    }
}

syncable_entity! {
    /// Places a menu item in a special category.
    pub struct CategorySpecialItemAssignment as "CategorySpecialItemAssignment" in Reference {
        pub category_id: i64,
        pub menu_item_id: i64,
        pub branch_id: i64,
        pub is_active: bool,
    }
}

syncable_entity! {
    /// A branch admin override PIN.
    pub struct AdminPinCode as "AdminPinCode" in Reference {
        pub pin_hash: String,
        pub description: Option<String>,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        pub branch_id: i64,
    }
}

syncable_entity! {
    /// A cashier's quick-login PIN.
    pub struct CashierPin as "CashierPin" in Reference {
        pub cashier_id: i64,
        pub pin_hash: String,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        pub branch_id: i64,
    }
}

syncable_entity! {
    /// A key/value application setting, optionally scoped to a branch.
    pub struct AppSettings as "AppSettings" in Reference {
        pub key: String,
        pub value: String,
        pub description: Option<String>,
        pub branch_id: Option<i64>,
    }
}

syncable_entity! {
    /// A stock item tracked by a branch.
    pub struct InventoryItem as "InventoryItem" in Reference {
        pub name: String,
        /// Unit of measure.
        pub unit: String,
        pub quantity: Money,
        /// Reorder threshold.
        pub min_quantity: Money,
        pub cost_per_unit: Option<Money>,
        pub supplier: Option<String>,
        pub created_at: DateTime<Utc>,
        pub branch_id: i64,
    }
}
