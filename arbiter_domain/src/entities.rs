// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Entities
//!
//! Domain objects with identity. An [`Application`] owns its
//! [`WorkingMode`] catalogue exclusively; everything else refers to both
//! through their ids.

pub mod application;
pub mod working_mode;

pub use application::{Application, ApplicationId, ApplicationState, Assignment};
pub use working_mode::{
    ConstraintKind, ResourceRequest, WorkingMode, WorkingModeConstraint, WorkingModeId,
};
