// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Binding Mask Value Object
//!
//! A bitset over the ids of a binding-domain type (CPU sockets,
//! accelerators) describing where a working mode is placed. The common
//! case is a single set bit; a working mode spread over several domains
//! sets several.
//!
//! The mask is a plain `u64`, so domain ids are limited to `0..64`. That
//! bound is checked at construction, never assumed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArbiterError;

/// Maximum binding-domain id representable in a mask.
pub const MAX_BINDING_ID: u16 = 63;

/// Bitset over binding-domain ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BindingMask(u64);

impl BindingMask {
    /// The empty mask (no placement).
    pub fn empty() -> Self {
        BindingMask(0)
    }

    /// Mask with a single domain id set.
    pub fn single(id: u16) -> Result<Self, ArbiterError> {
        let mut mask = BindingMask::empty();
        mask.set(id)?;
        Ok(mask)
    }

    /// Set a domain id.
    pub fn set(&mut self, id: u16) -> Result<(), ArbiterError> {
        if id > MAX_BINDING_ID {
            return Err(ArbiterError::InvalidConfiguration(format!(
                "binding-domain id {} exceeds maximum {}",
                id, MAX_BINDING_ID
            )));
        }
        self.0 |= 1u64 << id;
        Ok(())
    }

    /// True when the domain id is set.
    pub fn test(&self, id: u16) -> bool {
        id <= MAX_BINDING_ID && (self.0 >> id) & 1 == 1
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of domains selected.
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Lowest set domain id. Used as the deterministic tie-breaker.
    pub fn lowest(&self) -> Option<u16> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as u16)
        }
    }

    /// True when the two masks share at least one domain.
    pub fn intersects(&self, other: &BindingMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Iterate the set domain ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        (0..=MAX_BINDING_ID).filter(|id| self.test(*id))
    }
}

impl fmt::Display for BindingMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for id in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}", id)?;
            first = false;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_test() {
        let mask = BindingMask::single(3).unwrap();
        assert!(mask.test(3));
        assert!(!mask.test(2));
        assert_eq!(mask.count(), 1);
        assert_eq!(mask.lowest(), Some(3));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(BindingMask::single(64).is_err());
        let mut mask = BindingMask::empty();
        assert!(mask.set(200).is_err());
    }

    #[test]
    fn test_intersects() {
        let mut a = BindingMask::empty();
        a.set(1).unwrap();
        a.set(5).unwrap();
        let b = BindingMask::single(5).unwrap();
        let c = BindingMask::single(2).unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_display() {
        let mut mask = BindingMask::empty();
        mask.set(1).unwrap();
        mask.set(3).unwrap();
        assert_eq!(mask.to_string(), "{1,3}");
        assert_eq!(BindingMask::empty().to_string(), "{}");
    }
}
