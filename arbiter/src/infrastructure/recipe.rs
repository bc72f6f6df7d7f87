// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Recipe Parsing
//!
//! Reads an application recipe, the declarative catalogue of working
//! modes the application is willing to run in:
//!
//! ```toml
//! [[working_mode]]
//! id = 0
//! value = 0.3
//!
//! [[working_mode.request]]
//! path = "sys0.cpu.pe"
//! amount = 2
//!
//! [[working_mode]]
//! id = 1
//! value = 0.9
//!
//! [[working_mode.request]]
//! path = "sys0.cpu.pe"
//! amount = 4
//!
//! [[working_mode.constraint]]
//! path = "sys0.cpu.pe"
//! kind = "upper"
//! value = 4
//! ```
//!
//! The parser rejects duplicate working-mode ids; the domain entities
//! reject out-of-range values, non-positive amounts, and requests that
//! name the same resource class twice.

use std::path::Path;

use serde::Deserialize;

use resource_arbiter_domain::entities::{
    ConstraintKind, ResourceRequest, WorkingMode, WorkingModeConstraint, WorkingModeId,
};
use resource_arbiter_domain::value_objects::ResourcePath;
use resource_arbiter_domain::ArbiterError;

#[derive(Debug, Deserialize)]
struct RequestDoc {
    path: ResourcePath,
    amount: u64,
    #[serde(default)]
    divide: bool,
}

#[derive(Debug, Deserialize)]
struct ConstraintDoc {
    path: ResourcePath,
    kind: ConstraintKind,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct WorkingModeDoc {
    id: u16,
    value: f32,
    #[serde(default)]
    request: Vec<RequestDoc>,
    #[serde(default)]
    constraint: Vec<ConstraintDoc>,
}

#[derive(Debug, Deserialize)]
struct RecipeDoc {
    #[serde(default)]
    working_mode: Vec<WorkingModeDoc>,
}

/// Parse a recipe document into the working-mode catalogue.
pub fn parse_recipe(text: &str) -> Result<Vec<WorkingMode>, ArbiterError> {
    let doc: RecipeDoc =
        toml::from_str(text).map_err(|e| ArbiterError::InvalidRecipe(e.to_string()))?;

    let mut catalogue = Vec::with_capacity(doc.working_mode.len());
    for wm in doc.working_mode {
        let id = WorkingModeId(wm.id);
        if catalogue
            .iter()
            .any(|existing: &WorkingMode| existing.id() == id)
        {
            return Err(ArbiterError::InvalidRecipe(format!(
                "duplicate working-mode id {}",
                wm.id
            )));
        }
        let requests = wm
            .request
            .into_iter()
            .map(|req| ResourceRequest::with_divisor(req.path, req.amount, req.divide))
            .collect::<Result<Vec<_>, _>>()?;
        let constraints = wm
            .constraint
            .into_iter()
            .map(|c| WorkingModeConstraint::new(c.path, c.kind, c.value))
            .collect();
        catalogue.push(WorkingMode::with_constraints(
            id,
            wm.value,
            requests,
            constraints,
        )?);
    }
    Ok(catalogue)
}

/// Load and parse a recipe file.
pub fn load_recipe(path: &Path) -> Result<Vec<WorkingMode>, ArbiterError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ArbiterError::InvalidRecipe(format!("recipe '{}': {}", path.display(), e))
    })?;
    parse_recipe(&text)
}
