// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Platform Description
//!
//! Parses the declarative platform document and populates the resource
//! accountant namespace from it. The document declares memory banks
//! (with a quantity and a unit), CPU groups (with a memory-bank
//! affinity and their processing elements), and optional accelerators:
//!
//! ```toml
//! [[memory]]
//! id = 0
//! quantity = 4
//! unit = "GB"
//!
//! [[cpu]]
//! id = 0
//! memory = 0
//!
//! [[cpu.pe]]
//! id = 0
//! partition = "host"
//! share = 1
//!
//! [[accelerator]]
//! id = 0
//!
//! [[accelerator.pe]]
//! id = 0
//! partition = "shared"
//! share = 1
//! ```
//!
//! Installation registers one accounting leaf per processing element
//! (`sys0.cpu0.pe0`, total = share) and per memory bank (`sys0.mem0`,
//! total = quantity scaled by the unit). The partition kind and the
//! memory affinity are carried through for host-side integration; the
//! scheduling core does not interpret them.

use std::path::Path;

use serde::Deserialize;

use resource_arbiter_domain::value_objects::ResourcePath;
use resource_arbiter_domain::ArbiterError;

use crate::infrastructure::runtime::ResourceAccountant;

/// Memory quantity units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MemoryUnit {
    B,
    KB,
    MB,
    GB,
    TB,
}

impl MemoryUnit {
    pub fn scale(&self) -> u64 {
        match self {
            MemoryUnit::B => 1,
            MemoryUnit::KB => 1 << 10,
            MemoryUnit::MB => 1 << 20,
            MemoryUnit::GB => 1 << 30,
            MemoryUnit::TB => 1 << 40,
        }
    }
}

/// How a processing element is partitioned between host and managed
/// workloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    /// Reserved for the host.
    Host,
    /// Managed device, fully arbitrated.
    Mdev,
    /// Shared between host and managed workloads.
    Shared,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryBank {
    pub id: u16,
    pub quantity: u64,
    pub unit: MemoryUnit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingElement {
    pub id: u16,
    pub partition: PartitionKind,
    pub share: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CpuGroup {
    pub id: u16,
    /// Memory bank this group has affinity to.
    pub memory: Option<u16>,
    #[serde(default)]
    pub pe: Vec<ProcessingElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Accelerator {
    pub id: u16,
    #[serde(default)]
    pub pe: Vec<ProcessingElement>,
}

/// Parsed platform document.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformDescription {
    #[serde(default)]
    pub memory: Vec<MemoryBank>,
    #[serde(default)]
    pub cpu: Vec<CpuGroup>,
    #[serde(default)]
    pub accelerator: Vec<Accelerator>,
}

impl PlatformDescription {
    pub fn from_toml(text: &str) -> Result<Self, ArbiterError> {
        let description: PlatformDescription = toml::from_str(text)
            .map_err(|e| ArbiterError::InvalidConfiguration(format!("platform: {}", e)))?;
        description.validate()?;
        Ok(description)
    }

    pub fn load(path: &Path) -> Result<Self, ArbiterError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ArbiterError::InvalidConfiguration(format!("platform '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<(), ArbiterError> {
        if self.cpu.iter().all(|group| group.pe.is_empty())
            && self.accelerator.iter().all(|acc| acc.pe.is_empty())
            && self.memory.is_empty()
        {
            return Err(ArbiterError::InvalidConfiguration(
                "platform declares no resources".to_string(),
            ));
        }
        check_unique("memory bank", self.memory.iter().map(|bank| bank.id))?;
        check_unique("cpu group", self.cpu.iter().map(|group| group.id))?;
        check_unique("accelerator", self.accelerator.iter().map(|acc| acc.id))?;
        for bank in &self.memory {
            if bank.quantity == 0 {
                return Err(ArbiterError::InvalidConfiguration(format!(
                    "memory bank {} declares zero quantity",
                    bank.id
                )));
            }
        }
        for group in &self.cpu {
            check_unique(
                &format!("cpu{} pe", group.id),
                group.pe.iter().map(|pe| pe.id),
            )?;
            if let Some(pe) = group.pe.iter().find(|pe| pe.share == 0) {
                return Err(ArbiterError::InvalidConfiguration(format!(
                    "cpu{}.pe{} declares zero share",
                    group.id, pe.id
                )));
            }
            if let Some(memory) = group.memory {
                if !self.memory.iter().any(|bank| bank.id == memory) {
                    return Err(ArbiterError::InvalidConfiguration(format!(
                        "cpu{} has affinity to unknown memory bank {}",
                        group.id, memory
                    )));
                }
            }
        }
        for acc in &self.accelerator {
            check_unique(
                &format!("acc{} pe", acc.id),
                acc.pe.iter().map(|pe| pe.id),
            )?;
        }
        Ok(())
    }

    /// Register every declared resource with the accountant.
    pub fn install(&self, accountant: &ResourceAccountant) -> Result<(), ArbiterError> {
        for bank in &self.memory {
            let path: ResourcePath = format!("sys0.mem{}", bank.id)
                .parse()
                .map_err(|e: ArbiterError| ArbiterError::InvalidConfiguration(e.to_string()))?;
            accountant.register(&path, bank.quantity.saturating_mul(bank.unit.scale()))?;
        }
        for group in &self.cpu {
            for pe in &group.pe {
                let path: ResourcePath = format!("sys0.cpu{}.pe{}", group.id, pe.id)
                    .parse()
                    .map_err(|e: ArbiterError| ArbiterError::InvalidConfiguration(e.to_string()))?;
                accountant.register(&path, pe.share)?;
            }
        }
        for acc in &self.accelerator {
            for pe in &acc.pe {
                let path: ResourcePath = format!("sys0.acc{}.pe{}", acc.id, pe.id)
                    .parse()
                    .map_err(|e: ArbiterError| ArbiterError::InvalidConfiguration(e.to_string()))?;
                accountant.register(&path, pe.share)?;
            }
        }
        Ok(())
    }
}

fn check_unique(kind: &str, ids: impl Iterator<Item = u16>) -> Result<(), ArbiterError> {
    let mut seen = Vec::new();
    for id in ids {
        if seen.contains(&id) {
            return Err(ArbiterError::InvalidConfiguration(format!(
                "duplicate {} id {}",
                kind, id
            )));
        }
        seen.push(id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_arbiter_domain::value_objects::ResourceType;

    const PLATFORM: &str = r#"
[[memory]]
id = 0
quantity = 2
unit = "KB"

[[cpu]]
id = 0
memory = 0

[[cpu.pe]]
id = 0
partition = "host"
share = 1

[[cpu.pe]]
id = 1
partition = "mdev"
share = 1

[[cpu]]
id = 1
memory = 0

[[cpu.pe]]
id = 0
partition = "mdev"
share = 1
"#;

    #[test]
    fn test_parse_and_install() {
        let description = PlatformDescription::from_toml(PLATFORM).unwrap();
        let accountant = ResourceAccountant::new();
        description.install(&accountant).unwrap();

        assert_eq!(
            accountant.query_total(&"sys0.cpu0.pe".parse().unwrap()),
            2
        );
        assert_eq!(
            accountant.query_total(&"sys0.cpu1.pe".parse().unwrap()),
            1
        );
        assert_eq!(accountant.query_total(&"sys0.mem0".parse().unwrap()), 2048);
        assert_eq!(accountant.domain_ids(ResourceType::Cpu), vec![0, 1]);
    }

    #[test]
    fn test_duplicate_pe_rejected() {
        let text = r#"
[[cpu]]
id = 0

[[cpu.pe]]
id = 0
partition = "host"
share = 1

[[cpu.pe]]
id = 0
partition = "host"
share = 1
"#;
        assert!(PlatformDescription::from_toml(text).is_err());
    }

    #[test]
    fn test_unknown_memory_affinity_rejected() {
        let text = r#"
[[cpu]]
id = 0
memory = 7

[[cpu.pe]]
id = 0
partition = "host"
share = 1
"#;
        assert!(PlatformDescription::from_toml(text).is_err());
    }

    #[test]
    fn test_empty_platform_rejected() {
        assert!(PlatformDescription::from_toml("").is_err());
    }

    #[test]
    fn test_zero_share_rejected() {
        let text = r#"
[[cpu]]
id = 0

[[cpu.pe]]
id = 0
partition = "host"
share = 0
"#;
        assert!(PlatformDescription::from_toml(text).is_err());
    }
}
