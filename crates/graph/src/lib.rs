//! # Crafting Graph
//!
//! Read-only catalog of a combinatorial production graph: every item is a
//! base item (tier 0) or is produced by one or more two-ingredient recipes.
//!
//! ## Architecture
//!
//! ```text
//! RawElement[] (JSON)
//!     │
//!     ├──> Catalog Builder
//!     │      ├─ Intern items (name -> ItemId)
//!     │      ├─ Resolve recipes (drop unknown ingredients)
//!     │      ├─ Validate once (self-reference, tier must decrease)
//!     │      └─ Detect production cycles (petgraph SCC)
//!     │
//!     └──> Catalog
//!            ├─ Items with recipes in declared order
//!            ├─ Recipes by result tier (bottom-up sweeps)
//!            └─ Consumers per item (forward walks)
//! ```

mod builder;
mod error;
mod graph;
mod types;

pub use builder::{parse_elements, CatalogBuilder};
pub use error::{GraphError, Result};
pub use types::{
    Catalog, Item, ItemId, MalformedRecipe, MissingIngredient, RawElement, Recipe, RecipeDefect,
    RecipeId, ValidationPolicy, ValidationReport,
};
