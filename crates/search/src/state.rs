use crate::quota::{QuotaLedger, QuotaRejection};
use crafting_graph::{Catalog, ItemId, RecipeId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Which engine first discovered an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Undetermined,

    /// Discovered expanding down from the target
    Top,

    /// Discovered building up from the base items
    Bottom,
}

impl Side {
    pub(crate) const fn code(self) -> u8 {
        match self {
            Self::Undetermined => 0,
            Self::Top => 1,
            Self::Bottom => 2,
        }
    }

    pub(crate) const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Undetermined),
            1 => Some(Self::Top),
            2 => Some(Self::Bottom),
            _ => None,
        }
    }

    /// Attribute value used in exported trees
    pub const fn label(self) -> Option<&'static str> {
        match self {
            Self::Undetermined => None,
            Self::Top => Some("Top"),
            Self::Bottom => Some("Bottom"),
        }
    }
}

/// Admission cell: `UNSEEN`, or `ADMITTED | side.code()`
const UNSEEN: u8 = 0;
const ADMITTED: u8 = 0b100;

/// Outcome of offering one recipe to an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Accepted,

    /// Same ingredient pair already chosen for this item (not charged)
    Duplicate,

    Rejected(QuotaRejection),
}

/// Per-request mutable mirror of the catalog
///
/// Admission is a compare-and-set per item so exactly one discoverer wins.
/// Chosen recipe lists live behind the structural lock; quota counters behind
/// a second lock that is only ever taken while holding the first.
#[derive(Debug)]
pub struct SearchState {
    catalog: Arc<Catalog>,
    admission: Vec<AtomicU8>,
    chosen: Mutex<Vec<Vec<RecipeId>>>,
    quota: Mutex<QuotaLedger>,
    malformed_skips: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SearchState {
    pub fn new(catalog: Arc<Catalog>, recipe_limit: u32) -> Self {
        let count = catalog.item_count();
        Self {
            admission: (0..count).map(|_| AtomicU8::new(UNSEEN)).collect(),
            chosen: Mutex::new(vec![Vec::new(); count]),
            quota: Mutex::new(QuotaLedger::new(recipe_limit)),
            malformed_skips: AtomicUsize::new(0),
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Admit `item` on behalf of `side`; `false` if someone else already did
    pub fn claim(&self, item: ItemId, side: Side) -> bool {
        self.admission[item.index()]
            .compare_exchange(
                UNSEEN,
                ADMITTED | side.code(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn is_admitted(&self, item: ItemId) -> bool {
        self.admission[item.index()].load(Ordering::Acquire) & ADMITTED != 0
    }

    pub fn side_of(&self, item: ItemId) -> Option<Side> {
        let cell = self.admission[item.index()].load(Ordering::Acquire);
        if cell & ADMITTED == 0 {
            return None;
        }
        Side::from_code(cell & !ADMITTED)
    }

    /// Offer `recipe` to `item` under the quota rules
    pub fn try_choose(&self, item: ItemId, recipe: RecipeId, is_root: bool) -> Choice {
        let mut chosen = lock(&self.chosen);
        let list = &mut chosen[item.index()];
        if self.holds_pair(list, recipe) {
            return Choice::Duplicate;
        }

        let mut quota = lock(&self.quota);
        match quota.try_accept(item, is_root, list.len()) {
            Ok(()) => {
                list.push(recipe);
                Choice::Accepted
            }
            Err(rejection) => Choice::Rejected(rejection),
        }
    }

    /// Give `item` a recipe regardless of quota; `false` on duplicate
    pub fn force_choose(&self, item: ItemId, recipe: RecipeId) -> bool {
        let mut chosen = lock(&self.chosen);
        let list = &mut chosen[item.index()];
        if self.holds_pair(list, recipe) {
            return false;
        }
        list.push(recipe);
        lock(&self.quota).record_forced(item);
        true
    }

    /// Admit the result of `recipe` if it became reachable from below
    ///
    /// Requires both ingredients admitted, the result unseen, and the result
    /// tier strictly above both ingredients and strictly below the target's
    /// (unless the result is the target itself). The check and the admission
    /// happen under the structural lock so they are atomic with respect to
    /// other forward admissions.
    pub fn admit_forward(&self, recipe: RecipeId, target: ItemId, side: Side) -> Option<ItemId> {
        let catalog = &self.catalog;
        let recipe = catalog.recipe(recipe);
        let result = recipe.result;
        let result_tier = catalog.tier(result);

        let mut chosen = lock(&self.chosen);
        if self.is_admitted(result) {
            return None;
        }
        if !recipe
            .ingredients
            .iter()
            .all(|&ingredient| self.is_admitted(ingredient))
        {
            return None;
        }
        if result != target && result_tier >= catalog.tier(target) {
            return None;
        }
        if recipe
            .ingredients
            .iter()
            .any(|&ingredient| catalog.tier(ingredient) >= result_tier)
        {
            return None;
        }
        if !self.claim(result, side) {
            return None;
        }

        chosen[result.index()] = vec![recipe.id];
        lock(&self.quota).record_forced(result);
        Some(result)
    }

    fn holds_pair(&self, list: &[RecipeId], recipe: RecipeId) -> bool {
        let pair = self.catalog.recipe(recipe).unordered_pair();
        list.iter()
            .any(|&existing| self.catalog.recipe(existing).unordered_pair() == pair)
    }

    pub fn chosen(&self, item: ItemId) -> Vec<RecipeId> {
        lock(&self.chosen)[item.index()].clone()
    }

    pub fn record_malformed_skip(&self) {
        self.malformed_skips.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent copy of admissions and chosen recipes
    pub fn snapshot(&self) -> Discovered {
        let chosen = lock(&self.chosen);
        let sides = (0..self.admission.len())
            .map(|index| self.side_of(ItemId(index as u32)))
            .collect();
        Discovered {
            sides,
            chosen: chosen.clone(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        let chosen = lock(&self.chosen);
        let quota = lock(&self.quota);

        let mut stats = SearchStats {
            recipes_chosen: chosen.iter().map(Vec::len).sum(),
            quota_rejections: quota.rejections(),
            recipe_left: quota.recipe_left(),
            quota_exhausted: quota.was_exhausted(),
            malformed_skips: self.malformed_skips.load(Ordering::Relaxed),
            ..SearchStats::default()
        };
        for index in 0..self.admission.len() {
            match self.side_of(ItemId(index as u32)) {
                Some(Side::Top) => stats.top_items += 1,
                Some(Side::Bottom) => stats.bottom_items += 1,
                Some(Side::Undetermined) => {}
                None => continue,
            }
            stats.items_admitted += 1;
        }
        stats
    }
}

/// Frozen view of a search run, consumed by the exporter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    sides: Vec<Option<Side>>,
    chosen: Vec<Vec<RecipeId>>,
}

impl Discovered {
    pub fn is_admitted(&self, item: ItemId) -> bool {
        self.side(item).is_some()
    }

    pub fn side(&self, item: ItemId) -> Option<Side> {
        self.sides.get(item.index()).copied().flatten()
    }

    pub fn chosen(&self, item: ItemId) -> &[RecipeId] {
        self.chosen
            .get(item.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub items_admitted: usize,
    pub top_items: usize,
    pub bottom_items: usize,
    pub recipes_chosen: usize,
    pub quota_rejections: u64,
    pub recipe_left: u64,
    pub quota_exhausted: bool,
    pub malformed_skips: usize,
}
