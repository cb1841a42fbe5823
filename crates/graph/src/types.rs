use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Element record as stored in the external catalog file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawElement {
    /// Element name (e.g., "Lava")
    pub name: String,

    /// Production depth; starting elements are tier 0
    pub tier: u32,

    /// Ingredient pairs that produce this element
    #[serde(default)]
    pub recipes: Vec<[String; 2]>,
}

impl RawElement {
    pub fn base(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tier: 0,
            recipes: Vec::new(),
        }
    }

    pub fn new(name: impl Into<String>, tier: u32, recipes: &[(&str, &str)]) -> Self {
        Self {
            name: name.into(),
            tier,
            recipes: recipes
                .iter()
                .map(|(a, b)| [a.to_string(), b.to_string()])
                .collect(),
        }
    }
}

/// Dense handle of an item inside one [`Catalog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl ItemId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dense handle of a recipe inside one [`Catalog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

impl RecipeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Item (element) in the production graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub tier: u32,

    /// Recipes producing this item, in declared catalog order
    pub recipes: Vec<RecipeId>,
}

impl Item {
    #[inline]
    pub fn is_base(&self) -> bool {
        self.tier == 0
    }
}

/// Two-ingredient recipe producing `result`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Recipe {
    pub id: RecipeId,
    pub result: ItemId,
    pub ingredients: [ItemId; 2],
}

impl Recipe {
    /// Ingredient pair ignoring order, used for duplicate detection
    pub fn unordered_pair(&self) -> (ItemId, ItemId) {
        let [a, b] = self.ingredients;
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// Why a resolved recipe cannot be part of a valid crafting tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecipeDefect {
    /// The result appears as one of its own ingredients
    SelfReferential,

    /// An ingredient is not strictly lower tier than the result
    TierNotDecreasing {
        ingredient: String,
        ingredient_tier: u32,
        result_tier: u32,
    },
}

impl fmt::Display for RecipeDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfReferential => write!(f, "result is its own ingredient"),
            Self::TierNotDecreasing {
                ingredient,
                ingredient_tier,
                result_tier,
            } => write!(
                f,
                "ingredient {ingredient} has tier {ingredient_tier}, result tier is {result_tier}"
            ),
        }
    }
}

/// What the catalog builder does with malformed recipes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Keep the recipe but flag it; searches skip it
    #[default]
    Warn,

    /// Drop the recipe from the catalog
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingIngredient {
    pub result: String,
    pub ingredients: [String; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRecipe {
    pub result: String,
    pub ingredients: [String; 2],
    pub defect: RecipeDefect,
}

/// Findings of the load-time validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub duplicate_items: Vec<String>,
    pub missing_ingredients: Vec<MissingIngredient>,
    pub malformed: Vec<MalformedRecipe>,

    /// Groups of items that (transitively) produce each other
    pub cycles: Vec<Vec<String>>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_items.is_empty()
            && self.missing_ingredients.is_empty()
            && self.malformed.is_empty()
            && self.cycles.is_empty()
    }
}

/// Immutable production graph shared by every search request
#[derive(Debug, Clone)]
pub struct Catalog {
    pub(crate) items: Vec<Item>,
    pub(crate) recipes: Vec<Recipe>,

    /// Item name -> ItemId for lookup by name
    pub(crate) name_index: HashMap<String, ItemId>,

    /// Item -> recipes using it as an ingredient
    pub(crate) consumers: Vec<Vec<RecipeId>>,

    /// Result tier -> recipes producing an item of that tier
    pub(crate) by_result_tier: BTreeMap<u32, Vec<RecipeId>>,

    /// Recipe -> defect found during validation (only populated under `Warn`)
    pub(crate) defects: Vec<Option<RecipeDefect>>,

    pub(crate) report: ValidationReport,
}

impl Catalog {
    /// Find item by name
    pub fn lookup(&self, name: &str) -> Option<ItemId> {
        self.name_index.get(name).copied()
    }

    /// Get item data
    ///
    /// Panics if `id` does not come from this catalog.
    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id.index()]
    }

    /// Get recipe data
    ///
    /// Panics if `id` does not come from this catalog.
    pub fn recipe(&self, id: RecipeId) -> &Recipe {
        &self.recipes[id.index()]
    }

    pub fn name(&self, id: ItemId) -> &str {
        &self.item(id).name
    }

    pub fn tier(&self, id: ItemId) -> u32 {
        self.item(id).tier
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn validation(&self) -> &ValidationReport {
        &self.report
    }

    /// Defect recorded for `recipe`, if any
    pub fn defect(&self, recipe: RecipeId) -> Option<&RecipeDefect> {
        self.defects.get(recipe.index()).and_then(Option::as_ref)
    }

    pub fn is_well_formed(&self, recipe: RecipeId) -> bool {
        self.defect(recipe).is_none()
    }
}
