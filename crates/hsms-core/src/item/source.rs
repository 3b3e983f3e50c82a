//! Accept-list filter for builder item input.
//!
//! Builders take item lists from callers that do not always hold clean
//! data: optional lookups that came back empty, or heterogeneous lists of
//! boxed values assembled by a scripting or configuration layer.  Every
//! entry passes through [`ItemSource::into_item`]; entries that are not a
//! [`DataItem`] are dropped without an error and the survivors keep their
//! original relative order.

use std::any::Any;

use tracing::debug;

use super::DataItem;

/// An entry that may or may not hold a [`DataItem`].
pub trait ItemSource {
    /// Returns the item held by this entry, or `None` to drop it.
    fn into_item(self) -> Option<DataItem>;
}

impl ItemSource for DataItem {
    fn into_item(self) -> Option<DataItem> {
        Some(self)
    }
}

impl ItemSource for &DataItem {
    fn into_item(self) -> Option<DataItem> {
        Some(self.clone())
    }
}

impl ItemSource for Option<DataItem> {
    fn into_item(self) -> Option<DataItem> {
        self
    }
}

impl ItemSource for Box<dyn Any + Send> {
    fn into_item(self) -> Option<DataItem> {
        self.downcast::<DataItem>().ok().map(|item| *item)
    }
}

/// Collects the items from `entries`, dropping everything else.
pub(crate) fn accept_items<I>(entries: I) -> Vec<DataItem>
where
    I: IntoIterator,
    I::Item: ItemSource,
{
    let mut dropped = 0usize;
    let items: Vec<DataItem> = entries
        .into_iter()
        .filter_map(|entry| {
            let item = entry.into_item();
            if item.is_none() {
                dropped += 1;
            }
            item
        })
        .collect();

    if dropped > 0 {
        debug!(dropped, kept = items.len(), "dropped non-item entries");
    }
    items
}
