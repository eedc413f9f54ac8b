//! Per-kernel multi-version tables.
//!
//! A [`KernelTable`] holds one function pointer per compiled tier, in
//! [`COMPILED_TIERS`] order, all sharing one signature `F`. Dispatch is an
//! indexed load with the selector's cached index followed by an indirect
//! call.
//!
//! Entries are `unsafe fn` pointers: each is compiled for one instruction set
//! and may only be called on a host that supports it. [`KernelTable::dispatch`]
//! and [`KernelTable::host_entries`] only hand out entries that satisfy this.
//! Tables are normally generated by [`multiversion!`](crate::multiversion).

use std::fmt;

use crate::selector::{selected_tier_index, support_info};
use crate::tier::{compiled_index, Tier, COMPILED_TIERS, COMPILED_TIER_COUNT};

/// One kernel's entries, one per compiled tier.
pub struct KernelTable<F: Copy + 'static> {
    name: &'static str,
    entries: [F; COMPILED_TIER_COUNT],
}

impl<F: Copy + 'static> KernelTable<F> {
    /// Entry of the tier picked by the selector.
    ///
    /// Calling the returned pointer is sound: the selected tier is always
    /// supported by the host.
    #[inline(always)]
    #[must_use]
    pub fn dispatch(&self) -> F {
        self.entries[selected_tier_index()]
    }

    /// Entry compiled for `tier`, if that tier is compiled in.
    ///
    /// The host may not support `tier`; check
    /// [`CapabilitySet::supports`](crate::CapabilitySet::supports) before
    /// calling the entry.
    #[must_use]
    pub fn entry(&self, tier: Tier) -> Option<F> {
        compiled_index(tier).map(|i| self.entries[i])
    }

    /// Entries of every compiled tier the host supports, ascending.
    pub fn host_entries(&self) -> impl Iterator<Item = (Tier, F)> + '_ {
        let caps = support_info();
        COMPILED_TIERS
            .iter()
            .zip(self.entries.iter())
            .filter(move |(tier, _)| caps.supports(**tier))
            .map(|(&tier, &entry)| (tier, entry))
    }

    /// Tiers the table holds entries for.
    #[must_use]
    pub fn tiers(&self) -> &'static [Tier] {
        COMPILED_TIERS
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the scalar entry is mandatory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Kernel name given to the builder.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<F: Copy + 'static> fmt::Debug for KernelTable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelTable")
            .field("name", &self.name)
            .field("tiers", &COMPILED_TIERS)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`KernelTable`] entry by entry.
///
/// Entries are placed by tier, never by position. Missing, duplicate or
/// non-compiled tiers are programming errors and panic with the kernel name.
pub struct KernelTableBuilder<F: Copy + 'static> {
    name: &'static str,
    slots: [Option<F>; COMPILED_TIER_COUNT],
}

impl<F: Copy + 'static> KernelTableBuilder<F> {
    /// Starts an empty table for the kernel `name`.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: [None; COMPILED_TIER_COUNT],
        }
    }

    /// Adds the entry for `tier`.
    ///
    /// # Panics
    ///
    /// If `tier` is not compiled in or already has an entry.
    #[must_use]
    pub fn insert(mut self, tier: Tier, entry: F) -> Self {
        let Some(index) = compiled_index(tier) else {
            panic!("kernel `{}`: tier {tier} is not compiled into this build", self.name);
        };
        if self.slots[index].is_some() {
            panic!("kernel `{}`: duplicate entry for tier {tier}", self.name);
        }
        self.slots[index] = Some(entry);
        self
    }

    /// Finishes the table.
    ///
    /// # Panics
    ///
    /// If any compiled tier has no entry.
    #[must_use]
    pub fn finish(self) -> KernelTable<F> {
        let name = self.name;
        let slots = self.slots;
        let entries = std::array::from_fn(|i| match slots[i] {
            Some(entry) => entry,
            None => panic!("kernel `{name}`: missing entry for tier {}", COMPILED_TIERS[i]),
        });
        KernelTable { name, entries }
    }
}

impl<F: Copy + 'static> fmt::Debug for KernelTableBuilder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled: Vec<Tier> = COMPILED_TIERS
            .iter()
            .zip(self.slots.iter())
            .filter(|(_, slot)| slot.is_some())
            .map(|(&tier, _)| tier)
            .collect();
        f.debug_struct("KernelTableBuilder")
            .field("name", &self.name)
            .field("filled", &filled)
            .finish()
    }
}
