// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Resource Path Value Object
//!
//! A typed, hierarchical path into the platform resource namespace, such
//! as `sys0.cpu1.pe2` (processing element 2 of CPU group 1) or
//! `sys0.mem0` (memory bank 0). Paths come in two canonical forms:
//!
//! - **Template**: one or more segments omit the id (`sys0.cpu.pe`),
//!   meaning "any id of this type". Working-mode requests are written as
//!   templates and resolved against the concrete platform at cycle start.
//! - **Resolved**: every segment carries an id. Accounting nodes are
//!   keyed by resolved paths.
//!
//! Equality is structural; ordering is lexicographic over segments, which
//! gives the deterministic iteration order the scheduler relies on for
//! reproducible plans.
//!
//! ## Examples
//!
//! ```
//! use resource_arbiter_domain::value_objects::{ResourcePath, ResourceType};
//!
//! let template: ResourcePath = "sys0.cpu.pe".parse().unwrap();
//! assert!(template.is_template());
//! assert_eq!(template.leaf_type(), Some(ResourceType::ProcElement));
//!
//! let bound = template.bind(ResourceType::Cpu, 1);
//! assert_eq!(bound.to_string(), "sys0.cpu1.pe");
//!
//! let resolved: ResourcePath = "sys0.cpu1.pe2".parse().unwrap();
//! assert!(bound.matches(&resolved));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ArbiterError;

/// The closed set of resource types the namespace may contain.
///
/// The set is closed by design: scheduling policy iterates over it and
/// per-type parameters (penalties, saturation levels) are keyed by it.
/// New platform resources are added here, never discovered dynamically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    /// Whole-system root (`sys`)
    #[serde(rename = "sys")]
    System,
    /// Resource group, an intermediate partition (`grp`)
    #[serde(rename = "grp")]
    Group,
    /// CPU socket / core group (`cpu`)
    #[serde(rename = "cpu")]
    Cpu,
    /// Processing element (`pe`)
    #[serde(rename = "pe")]
    ProcElement,
    /// Memory bank (`mem`)
    #[serde(rename = "mem")]
    Memory,
    /// GPU device (`gpu`)
    #[serde(rename = "gpu")]
    Gpu,
    /// Generic accelerator (`acc`)
    #[serde(rename = "acc")]
    Accelerator,
}

impl ResourceType {
    /// All types, in canonical order.
    pub const ALL: [ResourceType; 7] = [
        ResourceType::System,
        ResourceType::Group,
        ResourceType::Cpu,
        ResourceType::ProcElement,
        ResourceType::Memory,
        ResourceType::Gpu,
        ResourceType::Accelerator,
    ];

    /// Canonical short token used in the textual path form.
    pub fn token(&self) -> &'static str {
        match self {
            ResourceType::System => "sys",
            ResourceType::Group => "grp",
            ResourceType::Cpu => "cpu",
            ResourceType::ProcElement => "pe",
            ResourceType::Memory => "mem",
            ResourceType::Gpu => "gpu",
            ResourceType::Accelerator => "acc",
        }
    }

    /// Parse a canonical short token.
    pub fn from_token(token: &str) -> Option<ResourceType> {
        ResourceType::ALL.into_iter().find(|ty| ty.token() == token)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One `(type, id)` step of a resource path. A missing id is a template
/// wildcard matching any id of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathSegment {
    resource_type: ResourceType,
    id: Option<u16>,
}

impl PathSegment {
    pub fn new(resource_type: ResourceType, id: Option<u16>) -> Self {
        Self { resource_type, id }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn id(&self) -> Option<u16> {
        self.id
    }

    pub fn is_wildcard(&self) -> bool {
        self.id.is_none()
    }

    /// True when `self` (possibly a wildcard) admits `other`.
    fn admits(&self, other: &PathSegment) -> bool {
        self.resource_type == other.resource_type && (self.id.is_none() || self.id == other.id)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}{}", self.resource_type.token(), id),
            None => f.write_str(self.resource_type.token()),
        }
    }
}

/// Ordered sequence of typed segments naming a resource class (template)
/// or a concrete resource (resolved).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourcePath {
    segments: Vec<PathSegment>,
}

impl ResourcePath {
    /// Build a path from segments. At least one segment is required and a
    /// type may appear only once along the path.
    pub fn new(segments: Vec<PathSegment>) -> Result<Self, ArbiterError> {
        if segments.is_empty() {
            return Err(ArbiterError::InvalidPath("empty path".to_string()));
        }
        for (i, seg) in segments.iter().enumerate() {
            if segments[..i]
                .iter()
                .any(|prev| prev.resource_type() == seg.resource_type())
            {
                return Err(ArbiterError::InvalidPath(format!(
                    "type '{}' repeated along the path",
                    seg.resource_type()
                )));
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True when any segment is a wildcard.
    pub fn is_template(&self) -> bool {
        self.segments.iter().any(PathSegment::is_wildcard)
    }

    /// Type of the last (leaf) segment.
    pub fn leaf_type(&self) -> Option<ResourceType> {
        self.segments.last().map(PathSegment::resource_type)
    }

    /// Id of the segment of the given type, if present and bound.
    pub fn id_of(&self, resource_type: ResourceType) -> Option<u16> {
        self.segments
            .iter()
            .find(|seg| seg.resource_type() == resource_type)
            .and_then(PathSegment::id)
    }

    /// True when the path contains a segment of the given type.
    pub fn contains_type(&self, resource_type: ResourceType) -> bool {
        self.segments
            .iter()
            .any(|seg| seg.resource_type() == resource_type)
    }

    /// True when the path carries the bound segment `(resource_type, id)`.
    pub fn has_segment(&self, resource_type: ResourceType, id: u16) -> bool {
        self.segments
            .iter()
            .any(|seg| seg.resource_type() == resource_type && seg.id() == Some(id))
    }

    /// Substitute the wildcard of the given type with a concrete id.
    /// Segments of other types and already-bound segments are untouched.
    pub fn bind(&self, resource_type: ResourceType, id: u16) -> ResourcePath {
        let segments = self
            .segments
            .iter()
            .map(|seg| {
                if seg.resource_type() == resource_type && seg.is_wildcard() {
                    PathSegment::new(resource_type, Some(id))
                } else {
                    *seg
                }
            })
            .collect();
        ResourcePath { segments }
    }

    /// Template match: same depth, same types, every bound id equal.
    pub fn matches(&self, resolved: &ResourcePath) -> bool {
        self.segments.len() == resolved.segments.len()
            && self
                .segments
                .iter()
                .zip(resolved.segments.iter())
                .all(|(tpl, res)| tpl.admits(res))
    }

    /// Equivalence modulo wildcards: same types in the same order, ids
    /// equal wherever both sides carry one. Two equivalent templates name
    /// the same resource class.
    pub fn equivalent(&self, other: &ResourcePath) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| {
                    a.resource_type() == b.resource_type()
                        && match (a.id(), b.id()) {
                            (Some(x), Some(y)) => x == y,
                            _ => true,
                        }
                })
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", seg)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for ResourcePath {
    type Err = ArbiterError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        for token in text.split('.') {
            let split = token.find(|c: char| c.is_ascii_digit());
            let (name, digits) = match split {
                Some(at) => token.split_at(at),
                None => (token, ""),
            };
            let resource_type = ResourceType::from_token(name).ok_or_else(|| {
                ArbiterError::InvalidPath(format!("unknown resource type '{}' in '{}'", name, text))
            })?;
            let id = if digits.is_empty() {
                None
            } else {
                Some(digits.parse::<u16>().map_err(|_| {
                    ArbiterError::InvalidPath(format!("bad id '{}' in '{}'", digits, text))
                })?)
            };
            segments.push(PathSegment::new(resource_type, id));
        }
        ResourcePath::new(segments)
    }
}

impl Serialize for ResourcePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ResourcePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
