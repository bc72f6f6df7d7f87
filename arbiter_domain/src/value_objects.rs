// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Value Objects
//!
//! Immutable domain values. All of them validate on construction, compare
//! by content, and are cheap to clone; none of them has identity.

pub mod binding_mask;
pub mod exit_code;
pub mod goal_gap;
pub mod priority;
pub mod resource_path;

pub use binding_mask::BindingMask;
pub use exit_code::ExitCode;
pub use goal_gap::GoalGap;
pub use priority::Priority;
pub use resource_path::{PathSegment, ResourcePath, ResourceType};
