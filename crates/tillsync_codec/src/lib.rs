//! # TillSync Codec
//!
//! JSON wire codec primitives for TillSync.
//!
//! Records cross the Edge↔Cloud link as flat JSON objects. This crate fixes
//! how each column type is represented there:
//! - Timestamps are RFC 3339 UTC strings with microseconds and a trailing `Z`
//! - Calendar dates are `YYYY-MM-DD`
//! - Monetary amounts are doubles truncated to two fractional digits and
//!   rebuilt as fixed-point on decode
//! - Enumerations are their canonical lowercase strings, validated on decode
//!
//! ## Usage
//!
//! ```
//! use tillsync_codec::{put, take, Money, WireRecord};
//!
//! let mut record = WireRecord::new();
//! put(&mut record, "unit_price", &Money::from_cents(1250));
//!
//! let mut price = Money::ZERO;
//! take(&record, "unit_price", &mut price).unwrap();
//! assert_eq!(price.to_string(), "12.50");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decimal;
mod enums;
mod error;
mod field;
mod time;

pub use decimal::{Money, Rate, MONEY_SCALE, RATE_SCALE};
pub use enums::{enum_from_wire, enum_to_wire, WireEnum};
pub use error::{CodecError, CodecResult};
pub use field::{get, put, require, take, WireField, WireRecord};
pub use time::{format_date, format_datetime, from_micros, now, parse_date, parse_datetime};
