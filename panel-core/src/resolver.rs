//! Telemetry address to control descriptor lookup.
//!
//! Built once from the aircraft's descriptor table. Descriptor indices are
//! grouped by address in `order`; `slots` maps an address to its run.

use crate::tables::TableError;
use crate::types::ControlDescriptor;
use heapless::{FnvIndexMap, Vec};

/// Maximum number of control descriptors per aircraft.
pub const MAX_DESCRIPTORS: usize = 1024;

/// Maximum number of distinct telemetry addresses (power of two).
pub const MAX_ADDRESSES: usize = 512;

/// Address index over a static descriptor table.
#[derive(Debug)]
pub struct AddressIndex {
    descriptors: &'static [ControlDescriptor],
    /// address -> (start, len) into `order`
    slots: FnvIndexMap<u16, (u16, u16), MAX_ADDRESSES>,
    order: Vec<u16, MAX_DESCRIPTORS>,
}

impl AddressIndex {
    /// Build the index.
    ///
    /// Descriptors sharing an address resolve in table order.
    ///
    /// # Errors
    ///
    /// [`TableError::TooManyDescriptors`] or [`TableError::TooManyAddresses`]
    /// if the table exceeds the fixed capacities.
    pub fn build(descriptors: &'static [ControlDescriptor]) -> Result<Self, TableError> {
        if descriptors.len() > MAX_DESCRIPTORS {
            return Err(TableError::TooManyDescriptors);
        }

        let mut order: Vec<u16, MAX_DESCRIPTORS> = Vec::new();
        for i in 0..descriptors.len() {
            // Length checked above; index fits in u16
            order
                .push(i as u16)
                .map_err(|_| TableError::TooManyDescriptors)?;
        }
        order.sort_unstable_by_key(|&i| (descriptors[usize::from(i)].address, i));

        let mut slots = FnvIndexMap::new();
        let mut start = 0;
        while start < order.len() {
            let address = descriptors[usize::from(order[start])].address;
            let mut end = start + 1;
            while end < order.len() && descriptors[usize::from(order[end])].address == address {
                end += 1;
            }
            slots
                .insert(address, (start as u16, (end - start) as u16))
                .map_err(|_| TableError::TooManyAddresses)?;
            start = end;
        }

        log::debug!(
            "address index: {} descriptors over {} addresses",
            descriptors.len(),
            slots.len()
        );

        Ok(Self {
            descriptors,
            slots,
            order,
        })
    }

    /// Descriptors bound to `address`, with their table indices.
    ///
    /// Empty for unmapped addresses.
    pub fn resolve(
        &self,
        address: u16,
    ) -> impl Iterator<Item = (usize, &'static ControlDescriptor)> + '_ {
        let run = match self.slots.get(&address) {
            Some(&(start, len)) => {
                let start = usize::from(start);
                &self.order[start..start + usize::from(len)]
            }
            None => &[],
        };
        let descriptors = self.descriptors;
        run.iter().map(move |&i| {
            let i = usize::from(i);
            (i, &descriptors[i])
        })
    }

    #[inline]
    #[must_use]
    pub fn descriptor_count(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    #[must_use]
    pub fn address_count(&self) -> usize {
        self.slots.len()
    }
}
