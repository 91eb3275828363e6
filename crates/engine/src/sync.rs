//! Synchronized derived data sets.
//!
//! A synchronized derived data set subscribes to its source's mutations.
//! Each source mutation is translated immediately, against the source's
//! post-state, into a batch of mutations for the derived side. The batch is
//! queued and a task is spawned on the `Scheduler`. Every queued task counts
//! as in flight; only the task that brings the count back to zero applies
//! the queue, in arrival order. A burst of source mutations therefore lands
//! on the derived side as one contiguous run of changes, after the burst.
//!
//! Translation needs to know which cases the derived side will contain once
//! the queue is applied. `SyncState` keeps that as an overlay of pending adds
//! and removes over the derived data set's current case index.
//!
//! Disposal (explicit `DataSet::destroy` or dropping the derived data set)
//! unsubscribes from the source, discards queued batches, and makes any task
//! still in the scheduler a no-op.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use rustc_hash::FxHashSet;
use smol::LocalExecutor;

use caseset_core::{AttributeId, CaseId};

use crate::attribute::Attribute;
use crate::case::{CanonicalCase, InsertAt};
use crate::dataset::{DataSet, SharedDataSet};
use crate::derive::DerivationSpec;
use crate::events::{Mutation, RetiredListeners};

/// Attempts to apply queued batches while the derived data set is borrowed
/// elsewhere, before leaving them for the next source mutation.
const MAX_FLUSH_RETRIES: u32 = 8;

// =============================================================================
// Scheduler
// =============================================================================

/// Single-threaded task queue that applies synchronization batches.
///
/// Nothing is applied until the scheduler runs: call `run_until_idle`,
/// `block_on`, or `wait_for_sync` from the owning thread.
#[derive(Clone)]
pub struct Scheduler {
    executor: Rc<LocalExecutor<'static>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            executor: Rc::new(LocalExecutor::new()),
        }
    }

    /// Run queued tasks until none is ready. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.executor.try_tick() {
            ran += 1;
        }
        ran
    }

    /// Drive `future` to completion, running queued tasks meanwhile.
    pub fn block_on<T>(&self, future: impl Future<Output = T>) -> T {
        smol::block_on(self.executor.run(future))
    }

    /// Block until `data_set` has no synchronization in flight.
    pub fn wait_for_sync(&self, data_set: &SharedDataSet) {
        // Take the future before blocking; applying a batch needs the
        // data set mutably borrowed.
        let settled = data_set.borrow().on_synchronized();
        self.block_on(settled);
    }

    pub fn is_idle(&self) -> bool {
        self.executor.is_empty()
    }

    fn downgrade(&self) -> Weak<LocalExecutor<'static>> {
        Rc::downgrade(&self.executor)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("idle", &self.is_idle())
            .finish()
    }
}

// =============================================================================
// Shared synchronization state
// =============================================================================

/// State shared by the source-side listener, queued tasks, and the link.
#[derive(Default)]
pub(crate) struct SyncState {
    in_flight: Cell<usize>,
    pending: RefCell<Vec<Vec<Mutation>>>,
    pending_adds: RefCell<FxHashSet<CaseId>>,
    pending_removes: RefCell<FxHashSet<CaseId>>,
    /// Set when a queued snapshot will replace the derived contents
    pending_reload: RefCell<Option<FxHashSet<CaseId>>>,
    disposed: Cell<bool>,
    flush_retries: Cell<u32>,
    log_translations: bool,
}

impl SyncState {
    fn new(log_translations: bool) -> Self {
        Self {
            log_translations,
            ..Self::default()
        }
    }

    /// Will `id` be a member of the derived data set once the queue applies?
    fn will_contain(&self, target: &DataSet, id: &CaseId) -> bool {
        if self.pending_adds.borrow().contains(id) {
            return true;
        }
        if self.pending_removes.borrow().contains(id) {
            return false;
        }
        match &*self.pending_reload.borrow() {
            Some(reloaded) => reloaded.contains(id),
            None => target.contains_case(id),
        }
    }

    /// Fold a translated batch into the membership overlay.
    fn record(&self, batch: &[Mutation]) {
        let mut adds = self.pending_adds.borrow_mut();
        let mut removes = self.pending_removes.borrow_mut();
        for mutation in batch {
            match mutation {
                Mutation::AddCanonicalCases { cases, .. } => {
                    for case in cases {
                        removes.remove(&case.id);
                        adds.insert(case.id.clone());
                    }
                }
                Mutation::RemoveCases { case_ids } => {
                    for id in case_ids {
                        adds.remove(id);
                        removes.insert(id.clone());
                    }
                }
                Mutation::SnapshotApplied { snapshot } => {
                    adds.clear();
                    removes.clear();
                    *self.pending_reload.borrow_mut() =
                        Some(snapshot.cases.iter().cloned().collect());
                }
                _ => {}
            }
        }
    }

    fn clear_overlay(&self) {
        self.pending_adds.borrow_mut().clear();
        self.pending_removes.borrow_mut().clear();
        self.pending_reload.borrow_mut().take();
    }

    fn is_synchronizing(&self) -> bool {
        !self.disposed.get() && self.in_flight.get() > 0
    }
}

// =============================================================================
// SyncLink: owned by the derived data set
// =============================================================================

/// The derived side's handle on its source subscription.
pub struct SyncLink {
    state: Rc<SyncState>,
    source: Weak<RefCell<DataSet>>,
    retired: RetiredListeners,
    listener_key: String,
}

impl SyncLink {
    pub fn is_synchronizing(&self) -> bool {
        self.state.is_synchronizing()
    }

    pub fn is_disposed(&self) -> bool {
        self.state.disposed.get()
    }

    /// Stop synchronizing. Idempotent.
    pub(crate) fn dispose(&self) {
        if self.state.disposed.replace(true) {
            return;
        }
        self.state.pending.borrow_mut().clear();
        self.state.in_flight.set(0);
        self.state.clear_overlay();
        let Some(source) = self.source.upgrade() else {
            return;
        };
        match source.try_borrow_mut() {
            Ok(mut source) => {
                source.remove_action_listener(&self.listener_key);
            }
            // Inert until the source's registry is restored, then dropped.
            Err(_) => {
                log::debug!(
                    "Source busy while disposing '{}'; listener retired",
                    self.listener_key
                );
                self.retired.borrow_mut().insert(self.listener_key.clone());
            }
        };
    }
}

impl Drop for SyncLink {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for SyncLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncLink")
            .field("listener_key", &self.listener_key)
            .field("in_flight", &self.state.in_flight.get())
            .field("disposed", &self.state.disposed.get())
            .finish()
    }
}

/// Resolves once no synchronization batch is in flight.
pub struct Synchronized {
    state: Option<Rc<SyncState>>,
}

impl Future for Synchronized {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match &self.state {
            Some(state) if state.is_synchronizing() => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            _ => Poll::Ready(()),
        }
    }
}

impl DataSet {
    /// True while source mutations are queued but not yet applied here.
    pub fn is_synchronizing(&self) -> bool {
        self.sync.as_ref().is_some_and(SyncLink::is_synchronizing)
    }

    /// Resolves immediately unless synchronization is in flight.
    pub fn on_synchronized(&self) -> Synchronized {
        Synchronized {
            state: self.sync.as_ref().map(|link| link.state.clone()),
        }
    }
}

// =============================================================================
// Translation
// =============================================================================

struct Translator {
    spec: DerivationSpec,
}

impl Translator {
    /// Whether the projection was given explicitly (new source attributes
    /// are then not carried over).
    fn closed_attributes(&self) -> bool {
        self.spec.attribute_ids.is_some()
    }

    fn translate(
        &self,
        source: &DataSet,
        target: &DataSet,
        state: &SyncState,
        mutation: &Mutation,
    ) -> Vec<Mutation> {
        match mutation {
            _ if mutation.is_bookkeeping() => Vec::new(),

            Mutation::AddAttribute {
                attribute,
                before_id,
            } => {
                if self.closed_attributes() {
                    return Vec::new();
                }
                self.add_attribute(source, target, state, attribute.id(), before_id.clone(), attribute.derive(None))
            }

            Mutation::AddCases { cases, at } => {
                let ids: Vec<CaseId> = cases.iter().map(|c| c.id.clone()).collect();
                self.add_cases(source, target, state, &ids, at)
            }
            Mutation::AddCanonicalCases { cases, at } => {
                let ids: Vec<CaseId> = cases.iter().map(|c| c.id.clone()).collect();
                self.add_cases(source, target, state, &ids, at)
            }

            Mutation::SetCaseValues { cases } => {
                let ids: Vec<CaseId> = cases.iter().map(|c| c.id.clone()).collect();
                let (kept, mut membership) = self.reclassify(source, target, state, &ids);
                let kept_cases: Vec<_> = cases
                    .iter()
                    .filter(|c| kept.contains(&c.id))
                    .cloned()
                    .collect();
                if !kept_cases.is_empty() {
                    membership.insert(0, Mutation::SetCaseValues { cases: kept_cases });
                }
                membership
            }
            Mutation::SetCanonicalCaseValues { cases } => {
                let ids: Vec<CaseId> = cases.iter().map(|c| c.id.clone()).collect();
                let (kept, mut membership) = self.reclassify(source, target, state, &ids);
                let kept_cases: Vec<_> = cases
                    .iter()
                    .filter(|c| kept.contains(&c.id))
                    .cloned()
                    .collect();
                if !kept_cases.is_empty() {
                    membership.insert(0, Mutation::SetCanonicalCaseValues { cases: kept_cases });
                }
                membership
            }

            // The derived side takes the source's new order directly; it may
            // not hold the sort attribute.
            Mutation::SortByAttribute { .. } | Mutation::ReorderCases { .. } => {
                let case_ids: Vec<CaseId> = source
                    .case_ids()
                    .iter()
                    .filter(|id| state.will_contain(target, id))
                    .cloned()
                    .collect();
                if case_ids.is_empty() {
                    return Vec::new();
                }
                vec![Mutation::ReorderCases { case_ids }]
            }

            Mutation::SnapshotApplied { .. } => {
                let spec = DerivationSpec {
                    synchronize: false,
                    ..self.spec.clone()
                };
                let mut snapshot = source.derive(None, &spec).snapshot();
                snapshot.id = None;
                snapshot.source_id = None;
                snapshot.name = None;
                vec![Mutation::SnapshotApplied { snapshot }]
            }

            other => vec![other.clone()],
        }
    }

    fn add_attribute(
        &self,
        source: &DataSet,
        target: &DataSet,
        state: &SyncState,
        attribute_id: &AttributeId,
        before_id: Option<AttributeId>,
        derived: Attribute,
    ) -> Vec<Mutation> {
        let mut batch = vec![Mutation::AddAttribute {
            attribute: derived,
            before_id,
        }];
        let values: Vec<CanonicalCase> = source
            .case_ids()
            .iter()
            .filter(|id| state.will_contain(target, id))
            .filter_map(|id| {
                let value = source.get_value(id, attribute_id)?;
                (!value.is_empty())
                    .then(|| CanonicalCase::new(id.clone()).with(attribute_id.clone(), value.clone()))
            })
            .collect();
        if !values.is_empty() {
            batch.push(Mutation::SetCanonicalCaseValues { cases: values });
        }
        batch
    }

    fn add_cases(
        &self,
        source: &DataSet,
        target: &DataSet,
        state: &SyncState,
        ids: &[CaseId],
        at: &InsertAt,
    ) -> Vec<Mutation> {
        let batch_ids: FxHashSet<&CaseId> = ids.iter().collect();
        let mut cases = Vec::new();
        let mut anchors = Vec::new();
        for (i, id) in ids.iter().enumerate() {
            let Some(admitted) = source.get_case(id).and_then(|case| self.spec.admit(case)) else {
                continue;
            };
            anchors.push(remap_before(source, target, state, at.for_case(i), &batch_ids));
            cases.push(source.to_canonical(&admitted));
        }
        if cases.is_empty() {
            return Vec::new();
        }
        vec![Mutation::AddCanonicalCases {
            cases,
            at: InsertAt::PerCase(anchors),
        }]
    }

    /// Re-run the filter for updated cases. Returns the ids whose update
    /// should be forwarded, plus adds for newly passing cases and a removal
    /// for newly failing ones.
    fn reclassify(
        &self,
        source: &DataSet,
        target: &DataSet,
        state: &SyncState,
        ids: &[CaseId],
    ) -> (FxHashSet<CaseId>, Vec<Mutation>) {
        let mut kept = FxHashSet::default();
        let mut added = Vec::new();
        let mut anchors = Vec::new();
        let mut removed = Vec::new();
        let no_batch = FxHashSet::default();

        for id in ids {
            let Some(case) = source.get_case(id) else {
                continue;
            };
            let present = state.will_contain(target, id);
            match (self.spec.admit(case), present) {
                (Some(_), true) => {
                    kept.insert(id.clone());
                }
                (Some(admitted), false) => {
                    anchors.push(remap_before(source, target, state, source.next_case_id(id), &no_batch));
                    added.push(source.to_canonical(&admitted));
                }
                (None, true) => removed.push(id.clone()),
                (None, false) => {}
            }
        }

        let mut batch = Vec::new();
        if !added.is_empty() {
            batch.push(Mutation::AddCanonicalCases {
                cases: added,
                at: InsertAt::PerCase(anchors),
            });
        }
        if !removed.is_empty() {
            batch.push(Mutation::RemoveCases { case_ids: removed });
        }
        (kept, batch)
    }
}

/// Map a source insertion point onto the derived side: walk forward from
/// `start` in source order to the first case the derived side will contain.
/// Cases from the same incoming batch are skipped. `None` appends.
fn remap_before(
    source: &DataSet,
    target: &DataSet,
    state: &SyncState,
    start: Option<&CaseId>,
    batch: &FxHashSet<&CaseId>,
) -> Option<CaseId> {
    let mut current = start;
    while let Some(id) = current {
        if !batch.contains(id) && state.will_contain(target, id) {
            return Some(id.clone());
        }
        current = source.next_case_id(id);
    }
    None
}

// =============================================================================
// Wiring
// =============================================================================

/// Derive a data set from `source`. With `spec.synchronize`, later source
/// mutations are replayed onto it through `scheduler`.
pub fn derive(
    source: &SharedDataSet,
    name: Option<&str>,
    spec: DerivationSpec,
    scheduler: &Scheduler,
) -> SharedDataSet {
    let derived = source.borrow().derive(name, &spec).into_shared();
    if spec.synchronize {
        attach(source, &derived, spec, scheduler);
    }
    derived
}

fn attach(source: &SharedDataSet, derived: &SharedDataSet, spec: DerivationSpec, scheduler: &Scheduler) {
    let (listener_key, log_translations) = {
        let derived = derived.borrow();
        (format!("sync:{}", derived.id()), derived.config().log_sync_translations)
    };
    let state = Rc::new(SyncState::new(log_translations));
    let translator = Translator { spec };

    let listener_state = state.clone();
    let target = Rc::downgrade(derived);
    let executor = scheduler.downgrade();
    let listener = move |source: &DataSet, mutation: &Mutation| {
        let state = &listener_state;
        if state.disposed.get() {
            return;
        }
        let Some(target_rc) = target.upgrade() else {
            return;
        };
        let batch = match target_rc.try_borrow() {
            Ok(target_ds) => translator.translate(source, &target_ds, state, mutation),
            Err(_) => {
                log::warn!("Derived data set busy; dropping '{}' from {}", mutation.name(), source.id());
                return;
            }
        };
        if batch.is_empty() {
            return;
        }
        if state.log_translations {
            let names: Vec<&str> = batch.iter().map(Mutation::name).collect();
            log::debug!("sync {} '{}' -> {:?}", source.id(), mutation.name(), names);
        }
        state.record(&batch);
        state.pending.borrow_mut().push(batch);
        schedule(state, &target, &executor);
    };

    let retired = {
        let mut source = source.borrow_mut();
        source.add_action_listener(&listener_key, listener);
        source.retired_listeners()
    };
    derived.borrow_mut().attach_sync(SyncLink {
        state,
        source: Rc::downgrade(source),
        retired,
        listener_key,
    });
}

/// Queue one in-flight task. The task that drains the count applies the queue.
fn schedule(state: &Rc<SyncState>, target: &Weak<RefCell<DataSet>>, executor: &Weak<LocalExecutor<'static>>) {
    let Some(ex) = executor.upgrade() else {
        log::warn!("Scheduler dropped; synchronization batch discarded");
        state.pending.borrow_mut().clear();
        state.clear_overlay();
        return;
    };
    state.in_flight.set(state.in_flight.get() + 1);
    let (state, target, executor) = (state.clone(), target.clone(), executor.clone());
    ex.spawn(async move {
        let remaining = state.in_flight.get().saturating_sub(1);
        state.in_flight.set(remaining);
        if remaining == 0 && !state.disposed.get() {
            flush(&state, &target, &executor);
        }
    })
    .detach();
}

fn flush(state: &Rc<SyncState>, target: &Weak<RefCell<DataSet>>, executor: &Weak<LocalExecutor<'static>>) {
    let Some(target_rc) = target.upgrade() else {
        return;
    };
    let Ok(mut derived) = target_rc.try_borrow_mut() else {
        let attempt = state.flush_retries.get() + 1;
        if attempt > MAX_FLUSH_RETRIES {
            log::warn!(
                "Derived data set still borrowed; leaving {} batch(es) for the next source mutation",
                state.pending.borrow().len()
            );
            state.flush_retries.set(0);
            return;
        }
        state.flush_retries.set(attempt);
        log::debug!("Derived data set busy; retrying synchronization");
        schedule(state, target, executor);
        return;
    };
    state.flush_retries.set(0);
    let batches = std::mem::take(&mut *state.pending.borrow_mut());
    state.clear_overlay();
    for mutation in batches.iter().flatten() {
        derived.apply_mutation(mutation);
    }
}
