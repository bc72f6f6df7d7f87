// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Resource Accountant
//!
//! The long-lived accounting service behind every scheduling decision.
//! It owns the platform namespace (leaf resource nodes keyed by resolved
//! path), tracks committed usage per application, and scopes tentative
//! reservations to transaction tokens so a scheduling cycle can build a
//! full allocation plan and install it atomically.
//!
//! ## Transaction model
//!
//! - `open_transaction` mints a token; at most one writing token is live
//!   at a time. Any number of committed-state readers run concurrently.
//! - `reserve` records tentative usage under the token. Tentative
//!   amounts are visible only through views carrying the same token;
//!   plain views keep seeing the committed state.
//! - `begin_replanning` lists the applications whose allocation the
//!   cycle rebuilds. Under the token their committed holdings count as
//!   free, so the plan is drawn on a clean slate and a higher-priority
//!   arrival can displace a lower-priority holder within one cycle.
//! - `commit` atomically replaces the committed shares of every placed,
//!   evicted, or re-planned application with the tentative ones.
//!   `release` discards the token and everything reserved under it.
//!
//! ## Invariants
//!
//! On every node, `used == sum(shares)` and `used <= total`. The
//! `audit` walk re-checks both after each commit; a violation poisons
//! the accountant and every later operation fails with `Corrupted`,
//! which stops the daemon from scheduling on corrupt books.
//!
//! Locking: one `RwLock` over the whole book. Queries take the read
//! lock, mutations the write lock; the resolve memo has its own mutex
//! and is invalidated when a transaction opens.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::{Mutex, RwLock};

use resource_arbiter_domain::entities::ApplicationId;
use resource_arbiter_domain::services::ResourceView;
use resource_arbiter_domain::value_objects::{ResourcePath, ResourceType};
use resource_arbiter_domain::ArbiterError;

/// Handle scoping a set of tentative reservations to one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionToken {
    id: u64,
}

impl TransactionToken {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Default, Clone)]
struct NodeState {
    total: u64,
    used: u64,
    shares: BTreeMap<ApplicationId, u64>,
}

#[derive(Debug, Default)]
struct WriterState {
    id: u64,
    /// node -> application -> tentative amount
    tentative: BTreeMap<ResourcePath, BTreeMap<ApplicationId, u64>>,
    /// applications with at least one tentative reservation
    placed: BTreeSet<ApplicationId>,
    /// applications whose committed shares this cycle re-plans; their
    /// holdings count as free under the token and are cleared at commit
    replanning: BTreeSet<ApplicationId>,
}

impl WriterState {
    fn tentative_on(&self, path: &ResourcePath) -> u64 {
        self.tentative
            .get(path)
            .map(|by_app| by_app.values().sum())
            .unwrap_or(0)
    }
}

/// Free capacity of one node as a given view sees it: committed free,
/// minus the token's tentative usage, plus the committed shares of the
/// re-planned applications and of the querying application itself.
fn node_headroom(
    node: &NodeState,
    path: &ResourcePath,
    writer: Option<&WriterState>,
    application: Option<ApplicationId>,
) -> u64 {
    let tentative = writer.map(|w| w.tentative_on(path)).unwrap_or(0);
    let mut add_back = 0u64;
    for (app, share) in &node.shares {
        let replanned = writer.map(|w| w.replanning.contains(app)).unwrap_or(false);
        if replanned || Some(*app) == application {
            add_back += share;
        }
    }
    (node.total + add_back)
        .saturating_sub(node.used)
        .saturating_sub(tentative)
}

#[derive(Debug, Default)]
struct Book {
    nodes: BTreeMap<ResourcePath, NodeState>,
    writer: Option<WriterState>,
    next_token: u64,
    poisoned: bool,
}

/// Hierarchical resource accounting with token-scoped reservations.
pub struct ResourceAccountant {
    book: RwLock<Book>,
    resolve_memo: Mutex<HashMap<ResourcePath, Vec<ResourcePath>>>,
}

impl Default for ResourceAccountant {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceAccountant {
    pub fn new() -> Self {
        Self {
            book: RwLock::new(Book::default()),
            resolve_memo: Mutex::new(HashMap::new()),
        }
    }

    /// Add a leaf node to the namespace. The path must be fully
    /// resolved and not registered yet.
    pub fn register(&self, path: &ResourcePath, total: u64) -> Result<(), ArbiterError> {
        if path.is_template() {
            return Err(ArbiterError::InvalidPath(format!(
                "cannot register template '{}'",
                path
            )));
        }
        let mut book = self.book.write();
        fail_if_poisoned(&book)?;
        if book.nodes.contains_key(path) {
            return Err(ArbiterError::InvalidConfiguration(format!(
                "resource '{}' already registered",
                path
            )));
        }
        book.nodes.insert(
            path.clone(),
            NodeState {
                total,
                ..NodeState::default()
            },
        );
        self.resolve_memo.lock().clear();
        Ok(())
    }

    /// Sum of `total` over the nodes a template resolves to.
    pub fn query_total(&self, template: &ResourcePath) -> u64 {
        let paths = self.resolve(template);
        self.total_of(&paths)
    }

    /// Availability over the nodes a template resolves to, with the
    /// same token and see-through semantics as [`Self::available_of`].
    pub fn query_available(
        &self,
        template: &ResourcePath,
        token: Option<&TransactionToken>,
        application: Option<ApplicationId>,
    ) -> u64 {
        let paths = self.resolve(template);
        self.available_of(&paths, token, application)
    }

    /// Sum of `total` over a resolved node set. Unknown paths count 0.
    pub fn total_of(&self, paths: &[ResourcePath]) -> u64 {
        let book = self.book.read();
        paths
            .iter()
            .filter_map(|path| book.nodes.get(path))
            .map(|node| node.total)
            .sum()
    }

    /// Availability over a resolved node set: committed free capacity
    /// (`total - used`), plus the committed share of `application` (an
    /// application being re-evaluated sees through its own allocation).
    /// When `token` names the live writer, its tentative usage is
    /// subtracted and the holdings of every re-planned application
    /// count as free.
    pub fn available_of(
        &self,
        paths: &[ResourcePath],
        token: Option<&TransactionToken>,
        application: Option<ApplicationId>,
    ) -> u64 {
        let book = self.book.read();
        let writer = match (&book.writer, token) {
            (Some(writer), Some(token)) if writer.id == token.id => Some(writer),
            _ => None,
        };
        paths
            .iter()
            .filter_map(|path| book.nodes.get(path).map(|node| (path, node)))
            .map(|(path, node)| node_headroom(node, path, writer, application))
            .sum()
    }

    /// Distinct leaf resource types present in the namespace.
    pub fn count_resource_types(&self) -> u16 {
        self.leaf_types().len() as u16
    }

    pub fn leaf_types(&self) -> Vec<ResourceType> {
        let book = self.book.read();
        let mut types: Vec<ResourceType> = book
            .nodes
            .keys()
            .filter_map(|path| path.leaf_type())
            .collect();
        types.sort();
        types.dedup();
        types
    }

    /// Ids of the binding domains of a type, ascending. A domain id is
    /// any id the type carries on some registered path.
    pub fn domain_ids(&self, domain: ResourceType) -> Vec<u16> {
        let book = self.book.read();
        let mut ids: Vec<u16> = book
            .nodes
            .keys()
            .filter_map(|path| path.id_of(domain))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn leaves_of_type(&self, leaf: ResourceType) -> Vec<ResourcePath> {
        let book = self.book.read();
        book.nodes
            .keys()
            .filter(|path| path.leaf_type() == Some(leaf))
            .cloned()
            .collect()
    }

    pub fn leaves_in_domain(
        &self,
        domain: ResourceType,
        id: u16,
        leaf: ResourceType,
    ) -> Vec<ResourcePath> {
        let book = self.book.read();
        book.nodes
            .keys()
            .filter(|path| path.leaf_type() == Some(leaf) && path.has_segment(domain, id))
            .cloned()
            .collect()
    }

    /// Expand a template to the matching resolved paths, ascending.
    /// Memoized until the namespace changes or a transaction opens.
    pub fn resolve(&self, template: &ResourcePath) -> Vec<ResourcePath> {
        if let Some(hit) = self.resolve_memo.lock().get(template) {
            return hit.clone();
        }
        let book = self.book.read();
        let resolved: Vec<ResourcePath> = if template.is_template() {
            book.nodes
                .keys()
                .filter(|path| template.matches(path))
                .cloned()
                .collect()
        } else if book.nodes.contains_key(template) {
            vec![template.clone()]
        } else {
            Vec::new()
        };
        drop(book);
        self.resolve_memo
            .lock()
            .insert(template.clone(), resolved.clone());
        resolved
    }

    /// Open the writing transaction of a cycle. Fails with `TokenInUse`
    /// while another one is live.
    pub fn open_transaction(&self) -> Result<TransactionToken, ArbiterError> {
        let mut book = self.book.write();
        fail_if_poisoned(&book)?;
        if let Some(writer) = &book.writer {
            return Err(ArbiterError::TokenInUse(format!(
                "token {} still live",
                writer.id
            )));
        }
        book.next_token += 1;
        let id = book.next_token;
        book.writer = Some(WriterState {
            id,
            ..WriterState::default()
        });
        drop(book);
        // Template expansions are pinned for the cycle lifetime.
        self.resolve_memo.lock().clear();
        Ok(TransactionToken { id })
    }

    /// Declare the applications this cycle re-plans. Their committed
    /// holdings count as free under the token (the cycle builds the
    /// next allocation from a clean slate) and are cleared at commit,
    /// so every re-planned application must end the cycle either placed
    /// or evicted.
    pub fn begin_replanning(
        &self,
        token: &TransactionToken,
        applications: &[ApplicationId],
    ) -> Result<(), ArbiterError> {
        let mut book = self.book.write();
        let writer = active_writer_mut(&mut book, token)?;
        writer.replanning = applications.iter().copied().collect();
        Ok(())
    }

    /// Tentatively reserve `amount` for `application` over a resolved
    /// node set. Without `divide` the amount is drawn from the set as a
    /// pool, filling nodes in path order; with it the amount is split
    /// evenly, one slice per node.
    pub fn reserve(
        &self,
        token: &TransactionToken,
        application: ApplicationId,
        paths: &[ResourcePath],
        amount: u64,
        divide: bool,
    ) -> Result<(), ArbiterError> {
        let mut book = self.book.write();
        fail_if_poisoned(&book)?;

        for path in paths {
            if !book.nodes.contains_key(path) {
                return Err(ArbiterError::UnknownPath(path.to_string()));
            }
        }

        let free: Vec<u64> = {
            let writer = active_writer(&book, token)?;
            paths
                .iter()
                .map(|path| node_headroom(&book.nodes[path], path, Some(writer), Some(application)))
                .collect()
        };

        let mut slices: Vec<u64> = vec![0; paths.len()];
        if divide {
            let count = paths.len() as u64;
            let base = amount / count;
            let remainder = (amount % count) as usize;
            for (i, slice) in slices.iter_mut().enumerate() {
                let want = base + u64::from(i < remainder);
                if want > free[i] {
                    return Err(ArbiterError::OverCapacity(format!(
                        "{}: '{}' holds {} free, slice needs {}",
                        application, paths[i], free[i], want
                    )));
                }
                *slice = want;
            }
        } else {
            if free.iter().sum::<u64>() < amount {
                return Err(ArbiterError::OverCapacity(format!(
                    "{}: {} free across {} nodes, {} requested",
                    application,
                    free.iter().sum::<u64>(),
                    paths.len(),
                    amount
                )));
            }
            let mut remaining = amount;
            for (i, slice) in slices.iter_mut().enumerate() {
                let take = remaining.min(free[i]);
                *slice = take;
                remaining -= take;
                if remaining == 0 {
                    break;
                }
            }
        }

        let writer = active_writer_mut(&mut book, token)?;
        for (path, slice) in paths.iter().zip(slices) {
            if slice == 0 {
                continue;
            }
            *writer
                .tentative
                .entry(path.clone())
                .or_default()
                .entry(application)
                .or_insert(0) += slice;
        }
        writer.placed.insert(application);
        Ok(())
    }

    /// Drop every tentative reservation one application holds under the
    /// token. Used to roll back a partially reserved candidate.
    pub fn withdraw(
        &self,
        token: &TransactionToken,
        application: ApplicationId,
    ) -> Result<(), ArbiterError> {
        let mut book = self.book.write();
        let writer = active_writer_mut(&mut book, token)?;
        for by_app in writer.tentative.values_mut() {
            by_app.remove(&application);
        }
        writer.tentative.retain(|_, by_app| !by_app.is_empty());
        writer.placed.remove(&application);
        Ok(())
    }

    /// Abort the transaction; every tentative reservation vanishes.
    pub fn release(&self, token: &TransactionToken) -> Result<(), ArbiterError> {
        let mut book = self.book.write();
        active_writer(&book, token)?;
        book.writer = None;
        Ok(())
    }

    /// Atomically install the plan built under the token. Placed
    /// applications swap their committed shares for the tentative ones;
    /// `evicted` and re-planned applications lose theirs without
    /// replacement.
    pub fn commit(
        &self,
        token: &TransactionToken,
        evicted: &[ApplicationId],
    ) -> Result<(), ArbiterError> {
        let mut book = self.book.write();
        fail_if_poisoned(&book)?;
        active_writer(&book, token)?;
        let writer = book
            .writer
            .take()
            .ok_or_else(|| ArbiterError::internal("writer vanished under its own lock"))?;

        let mut to_clear: BTreeSet<ApplicationId> = writer.placed.clone();
        to_clear.extend(evicted.iter().copied());
        to_clear.extend(writer.replanning.iter().copied());

        for node in book.nodes.values_mut() {
            for app in &to_clear {
                if let Some(share) = node.shares.remove(app) {
                    node.used = node.used.saturating_sub(share);
                }
            }
        }
        for (path, by_app) in writer.tentative {
            let Some(node) = book.nodes.get_mut(&path) else {
                continue;
            };
            for (app, amount) in by_app {
                *node.shares.entry(app).or_insert(0) += amount;
                node.used += amount;
            }
        }

        audit_book(&mut book)
    }

    /// Return the committed shares of one application to the pool
    /// (unregistration path; no token involved).
    pub fn release_application(&self, application: ApplicationId) -> Result<(), ArbiterError> {
        let mut book = self.book.write();
        fail_if_poisoned(&book)?;
        for node in book.nodes.values_mut() {
            if let Some(share) = node.shares.remove(&application) {
                node.used = node.used.saturating_sub(share);
            }
        }
        Ok(())
    }

    /// Re-check the accounting invariants on every node.
    pub fn audit(&self) -> Result<(), ArbiterError> {
        let mut book = self.book.write();
        audit_book(&mut book)
    }

    pub fn is_poisoned(&self) -> bool {
        self.book.read().poisoned
    }

    /// Committed-state view (no token).
    pub fn view(&self) -> AccountantView<'_> {
        AccountantView {
            accountant: self,
            token: None,
        }
    }

    /// View scoped to a live transaction token.
    pub fn token_view<'a>(&'a self, token: &TransactionToken) -> AccountantView<'a> {
        AccountantView {
            accountant: self,
            token: Some(token.clone()),
        }
    }
}

fn fail_if_poisoned(book: &Book) -> Result<(), ArbiterError> {
    if book.poisoned {
        return Err(ArbiterError::Corrupted(
            "accounting invariants violated earlier; refusing further operations".to_string(),
        ));
    }
    Ok(())
}

fn active_writer<'a>(book: &'a Book, token: &TransactionToken) -> Result<&'a WriterState, ArbiterError> {
    match &book.writer {
        Some(writer) if writer.id == token.id => Ok(writer),
        Some(writer) => Err(ArbiterError::TokenInUse(format!(
            "token {} is not the live writer {}",
            token.id, writer.id
        ))),
        None => Err(ArbiterError::TokenInUse(format!(
            "token {} is not live",
            token.id
        ))),
    }
}

fn active_writer_mut<'a>(
    book: &'a mut Book,
    token: &TransactionToken,
) -> Result<&'a mut WriterState, ArbiterError> {
    match &mut book.writer {
        Some(writer) => {
            if writer.id == token.id {
                Ok(writer)
            } else {
                let live_id = writer.id;
                Err(ArbiterError::TokenInUse(format!(
                    "token {} is not the live writer {}",
                    token.id, live_id
                )))
            }
        }
        None => Err(ArbiterError::TokenInUse(format!(
            "token {} is not live",
            token.id
        ))),
    }
}

fn audit_book(book: &mut Book) -> Result<(), ArbiterError> {
    for (path, node) in &book.nodes {
        let share_sum: u64 = node.shares.values().sum();
        if share_sum != node.used || node.used > node.total {
            book.poisoned = true;
            return Err(ArbiterError::Corrupted(format!(
                "'{}': used {} / total {} / share sum {}",
                path, node.used, node.total, share_sum
            )));
        }
    }
    Ok(())
}

/// [`ResourceView`] implementation over the accountant, optionally
/// scoped to a transaction token.
pub struct AccountantView<'a> {
    accountant: &'a ResourceAccountant,
    token: Option<TransactionToken>,
}

impl ResourceView for AccountantView<'_> {
    fn total_of(&self, paths: &[ResourcePath]) -> u64 {
        self.accountant.total_of(paths)
    }

    fn available_of(&self, paths: &[ResourcePath], application: Option<ApplicationId>) -> u64 {
        self.accountant
            .available_of(paths, self.token.as_ref(), application)
    }

    fn resource_type_count(&self) -> u16 {
        self.accountant.count_resource_types()
    }

    fn leaf_types(&self) -> Vec<ResourceType> {
        self.accountant.leaf_types()
    }

    fn domain_ids(&self, domain: ResourceType) -> Vec<u16> {
        self.accountant.domain_ids(domain)
    }

    fn leaves_of_type(&self, leaf: ResourceType) -> Vec<ResourcePath> {
        self.accountant.leaves_of_type(leaf)
    }

    fn leaves_in_domain(
        &self,
        domain: ResourceType,
        id: u16,
        leaf: ResourceType,
    ) -> Vec<ResourcePath> {
        self.accountant.leaves_in_domain(domain, id, leaf)
    }

    fn resolve(&self, template: &ResourcePath) -> Vec<ResourcePath> {
        self.accountant.resolve(template)
    }
}
