//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{Currency, Money, round_money, to_cents};
pub use pagination::{PageMeta, PageRequest, PageResponse};
