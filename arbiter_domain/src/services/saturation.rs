// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Saturation Region Filter
//!
//! The shared piecewise index used by the congestion and fairness
//! contributions. The request amount is evaluated against two
//! thresholds splitting the axis into three regions:
//!
//! ```text
//!  index
//!   1.0 ───────┐
//!              │ linear
//!   1-p        └──────────┐
//!              .          │ exponential
//!   p/0        .          └────────────
//!        constant  c_thresh     l_thresh      x
//! ```
//!
//! - **constant** (`x <= c_thresh`): the request operates comfortably,
//!   index 1
//! - **linear** (`c_thresh < x <= l_thresh`): the index degrades
//!   proportionally, down to `1 - penalty` at the threshold
//! - **exponential** (`x > l_thresh`): the request approaches the hard
//!   limit, the index collapses on an exponential curve
//!
//! Callers fill the [`LinearParams`] and [`ExponentialParams`] blocks
//! for their own threshold semantics; the filter only evaluates. The
//! result is always clamped to `[0, 1]`.

/// Parameters of the linear region: `1 - scale * (x - xoffset)`.
#[derive(Debug, Clone, Copy)]
pub struct LinearParams {
    pub xoffset: f32,
    pub scale: f32,
}

/// Parameters of the exponential region:
/// `yscale * (base^((x - xoffset) / xscale) - 1) + yoffset`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialParams {
    pub base: f32,
    pub xoffset: f32,
    pub xscale: f32,
    pub yscale: f32,
    pub yoffset: f32,
}

/// Evaluate the three-region index for the amount `x`.
pub fn region_index(
    x: f32,
    constant_threshold: f32,
    linear_threshold: f32,
    linear: &LinearParams,
    exponential: &ExponentialParams,
) -> f32 {
    if x <= constant_threshold {
        return 1.0;
    }
    if x <= linear_threshold {
        return (1.0 - linear.scale * (x - linear.xoffset)).clamp(0.0, 1.0);
    }
    if exponential.xscale == 0.0 {
        return 0.0;
    }
    let exponent = (x - exponential.xoffset) / exponential.xscale;
    (exponential.yscale * (exponential.base.powf(exponent) - 1.0) + exponential.yoffset)
        .clamp(0.0, 1.0)
}
