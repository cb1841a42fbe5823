//! Top-down expansion from the target toward base items.
//!
//! Pending items live on an explicit work-list instead of the call stack, so
//! arbitrarily deep chains cannot overflow it. In concurrent mode an item is
//! handed to a spawned task while an [`ExpansionSlots`] permit is free and is
//! expanded inline otherwise.

use std::collections::VecDeque;
use std::sync::Arc;

use crafting_graph::{ItemId, RecipeId};
use tokio::task::JoinSet;

use crate::config::{Execution, SearchConfig, TopDownStrategy, Traversal};
use crate::error::Result;
use crate::limits::ExpansionSlots;
use crate::progress::ProgressSink;
use crate::signal::{DoneSignal, Termination};
use crate::state::{Choice, SearchState, Side};

pub struct TopDownEngine {
    state: Arc<SearchState>,
    root: ItemId,
    side: Side,
    strategy: TopDownStrategy,
    traversal: Traversal,
    execution: Execution,
    slots: ExpansionSlots,
    progress: ProgressSink,
    done: Option<Arc<DoneSignal>>,
}

impl TopDownEngine {
    pub fn new(state: Arc<SearchState>, root: ItemId, config: &SearchConfig) -> Self {
        Self {
            state,
            root,
            side: Side::Top,
            strategy: config.strategy,
            traversal: config.traversal,
            execution: config.execution,
            slots: ExpansionSlots::new(config.in_flight()),
            progress: ProgressSink::disabled(),
            done: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_done(mut self, done: Arc<DoneSignal>) -> Self {
        self.done = Some(done);
        self
    }

    pub fn slots(&self) -> &ExpansionSlots {
        &self.slots
    }

    /// Expand from the root until the work-list drains or the run is cancelled
    pub async fn run(self: Arc<Self>) -> Result<Termination> {
        let root_name = self.state.catalog().name(self.root).to_string();
        log::info!(
            "Top-down search for {root_name} ({:?}, {:?}, {:?}, {} slots)",
            self.strategy,
            self.traversal,
            self.execution,
            self.slots.capacity()
        );

        let termination = match self.execution {
            Execution::Sequential => {
                let engine = Arc::clone(&self);
                tokio::task::spawn_blocking(move || engine.run_sequential()).await?
            }
            Execution::Concurrent => self.run_concurrent().await,
        };

        log::info!("Top-down search for {root_name} finished: {termination:?}");
        Ok(termination)
    }

    /// Whole expansion on the calling thread
    pub fn run_sequential(&self) -> Termination {
        let mut pending = VecDeque::from([self.root]);
        while let Some(item) = self.next(&mut pending) {
            if self.is_cancelled() {
                return Termination::Cancelled;
            }
            let children = self.expand(item);
            self.enqueue(&mut pending, children);
        }
        self.finished()
    }

    async fn run_concurrent(self: &Arc<Self>) -> Termination {
        let mut pending = VecDeque::from([self.root]);
        let mut tasks: JoinSet<Vec<ItemId>> = JoinSet::new();

        loop {
            if self.is_cancelled() {
                // In-flight expansions finish their current item, then stop.
                while tasks.join_next().await.is_some() {}
                return Termination::Cancelled;
            }

            if let Some(item) = self.next(&mut pending) {
                match self.slots.try_acquire() {
                    Some(permit) => {
                        let engine = Arc::clone(self);
                        tasks.spawn(async move {
                            let _permit = permit;
                            engine.expand(item)
                        });
                    }
                    None => {
                        let children = self.expand(item);
                        self.enqueue(&mut pending, children);
                        tokio::task::yield_now().await;
                    }
                }
                continue;
            }

            match tasks.join_next().await {
                Some(Ok(children)) => self.enqueue(&mut pending, children),
                Some(Err(err)) => log::warn!("Top-down expansion task failed: {err}"),
                None => break,
            }
        }

        self.finished()
    }

    fn finished(&self) -> Termination {
        if self.is_cancelled() {
            Termination::Cancelled
        } else {
            Termination::Completed
        }
    }

    fn is_cancelled(&self) -> bool {
        self.done.as_ref().is_some_and(|done| done.is_done())
    }

    fn next(&self, pending: &mut VecDeque<ItemId>) -> Option<ItemId> {
        match self.traversal {
            Traversal::DepthFirst => pending.pop_back(),
            Traversal::BreadthFirst => pending.pop_front(),
        }
    }

    fn enqueue(&self, pending: &mut VecDeque<ItemId>, children: Vec<ItemId>) {
        match self.traversal {
            // Reversed so the first ingredient is popped first.
            Traversal::DepthFirst => pending.extend(children.into_iter().rev()),
            Traversal::BreadthFirst => pending.extend(children),
        }
    }

    /// Expand one item and return the non-base ingredients still to visit
    fn expand(&self, item: ItemId) -> Vec<ItemId> {
        let catalog = self.state.catalog();
        let entry = catalog.item(item);
        let _notice = self.progress.notice(&entry.name, entry.tier);

        if !self.state.claim(item, self.side) {
            return Vec::new();
        }
        if entry.is_base() {
            return Vec::new();
        }

        let candidates = self.candidates(item);
        let mut accepted = match self.strategy {
            TopDownStrategy::MultiRecipe => self.admit_multiple(item, &candidates),
            TopDownStrategy::SingleRecipe => self.admit_single(item, &candidates),
        };

        if accepted.is_empty() && self.strategy == TopDownStrategy::MultiRecipe {
            log::debug!(
                "No recipe admitted for {}, falling back to a single recipe",
                entry.name
            );
            accepted = self.admit_single(item, &candidates);
        }
        if accepted.is_empty() {
            log::debug!("{} (tier {}) has no admissible recipe", entry.name, entry.tier);
        }

        self.children_of(&accepted)
    }

    /// Catalog recipes of `item` that may appear in a tree, in catalog order
    fn candidates(&self, item: ItemId) -> Vec<RecipeId> {
        let catalog = self.state.catalog();
        catalog
            .item(item)
            .recipes
            .iter()
            .copied()
            .filter(|&recipe| {
                if catalog.recipe(recipe).result != item {
                    return false;
                }
                match catalog.defect(recipe) {
                    Some(defect) => {
                        log::debug!("Skipping recipe for {}: {defect}", catalog.name(item));
                        self.state.record_malformed_skip();
                        false
                    }
                    None => true,
                }
            })
            .collect()
    }

    fn admit_multiple(&self, item: ItemId, candidates: &[RecipeId]) -> Vec<RecipeId> {
        let is_root = item == self.root;
        let mut accepted = Vec::new();

        for &recipe in candidates {
            if self.is_cancelled() {
                break;
            }
            match self.state.try_choose(item, recipe, is_root) {
                Choice::Accepted => {
                    self.log_admission(item, recipe);
                    accepted.push(recipe);
                }
                Choice::Duplicate => continue,
                Choice::Rejected(reason) => {
                    log::debug!(
                        "Quota closes {} after {} recipe(s): {reason:?}",
                        self.state.catalog().name(item),
                        accepted.len()
                    );
                    break;
                }
            }
        }

        accepted
    }

    /// First admissible recipe, ignoring the quota
    ///
    /// Not interrupted by cancellation: an item this engine claimed always
    /// leaves with an explanation when the catalog has one.
    fn admit_single(&self, item: ItemId, candidates: &[RecipeId]) -> Vec<RecipeId> {
        for &recipe in candidates {
            if self.state.force_choose(item, recipe) {
                self.log_admission(item, recipe);
                return vec![recipe];
            }
        }
        Vec::new()
    }

    fn children_of(&self, accepted: &[RecipeId]) -> Vec<ItemId> {
        let catalog = self.state.catalog();
        let mut children = Vec::new();

        for &recipe in accepted {
            for ingredient in catalog.recipe(recipe).ingredients {
                if catalog.item(ingredient).is_base() {
                    self.state.claim(ingredient, self.side);
                } else if !children.contains(&ingredient) {
                    children.push(ingredient);
                }
            }
        }

        children
    }

    fn log_admission(&self, item: ItemId, recipe: RecipeId) {
        if log::log_enabled!(log::Level::Debug) {
            let catalog = self.state.catalog();
            let [first, second] = catalog.recipe(recipe).ingredients;
            log::debug!(
                "Admitted recipe for {}: {} + {}",
                catalog.name(item),
                catalog.name(first),
                catalog.name(second)
            );
        }
    }
}
