use crafting_graph::ItemId;
use serde::Serialize;
use std::collections::HashMap;

/// Why an additional recipe was refused for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaRejection {
    /// No global recipe budget left
    Exhausted,

    /// Accepting would push the projected tree count over the limit
    ProductExceeded,
}

/// Recipe budget of one search run
///
/// Two counters are kept: `recipe_left`, the global budget charged for every
/// recipe after an item's first, and `accepted`, the per-item number of
/// accepted recipes. The product of `accepted` over all items approximates how
/// many distinct crafting trees the export will describe; a non-root item may
/// not take an extra recipe that would push that product past `limit`.
#[derive(Debug, Clone)]
pub struct QuotaLedger {
    limit: u64,
    recipe_left: u64,
    accepted: HashMap<ItemId, u64>,
    exhausted_rejections: u64,
    product_rejections: u64,
}

impl QuotaLedger {
    pub fn new(limit: u32) -> Self {
        let limit = u64::from(limit.max(1));
        Self {
            limit,
            recipe_left: limit - 1,
            accepted: HashMap::new(),
            exhausted_rejections: 0,
            product_rejections: 0,
        }
    }

    /// Decide whether `item` may take one more recipe
    ///
    /// `already_chosen` is the number of recipes the item holds right now; the
    /// first one is always free.
    pub fn try_accept(
        &mut self,
        item: ItemId,
        is_root: bool,
        already_chosen: usize,
    ) -> Result<(), QuotaRejection> {
        if already_chosen == 0 {
            self.record_forced(item);
            return Ok(());
        }

        if self.recipe_left == 0 {
            self.exhausted_rejections += 1;
            return Err(QuotaRejection::Exhausted);
        }

        let count = self.accepted.entry(item).or_insert(0);
        *count += 1;
        if !is_root && self.projected_product() > self.limit {
            self.rollback(item);
            self.product_rejections += 1;
            return Err(QuotaRejection::ProductExceeded);
        }

        self.recipe_left -= 1;
        Ok(())
    }

    /// Count `item` as explained by one recipe without charging the budget
    pub fn record_forced(&mut self, item: ItemId) {
        let count = self.accepted.entry(item).or_insert(0);
        if *count == 0 {
            *count = 1;
        }
    }

    fn rollback(&mut self, item: ItemId) {
        if let Some(count) = self.accepted.get_mut(&item) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.accepted.remove(&item);
            }
        }
    }

    fn projected_product(&self) -> u64 {
        let mut product: u64 = 1;
        for &count in self.accepted.values() {
            if count == 0 {
                continue;
            }
            product = product.saturating_mul(count);
            if product > self.limit {
                break;
            }
        }
        product
    }

    pub fn recipe_left(&self) -> u64 {
        self.recipe_left
    }

    pub fn accepted(&self, item: ItemId) -> u64 {
        self.accepted.get(&item).copied().unwrap_or(0)
    }

    pub fn rejections(&self) -> u64 {
        self.exhausted_rejections + self.product_rejections
    }

    pub fn was_exhausted(&self) -> bool {
        self.recipe_left == 0 && self.rejections() > 0
    }
}
