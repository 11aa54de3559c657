//! Wire types shared by the subscription service crates.
//!
//! `month` holds the `MM-YYYY` calendar-month type every date on the API uses;
//! `subscription` holds the request and response bodies with their field
//! validation rules.

pub mod month;
pub mod subscription;

pub use month::{validate_month, MonthParseError, MonthYear, MONTH_FORMAT};
pub use subscription::*;
