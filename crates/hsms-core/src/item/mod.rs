//! Payload items carried by data messages.

pub mod data_item;
pub mod source;

pub use data_item::{DataItem, ItemFormat, ItemValue};
pub use source::ItemSource;
