use crate::error::{GraphError, Result};
use crate::graph::find_cycles;
use crate::types::*;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Build a [`Catalog`] from raw element records
///
/// Every recipe is resolved and validated exactly once here, so the search
/// engines only consult the recorded verdict instead of re-checking tiers.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    policy: ValidationPolicy,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(&self, elements: &[RawElement]) -> Result<Catalog> {
        if elements.is_empty() {
            return Err(GraphError::EmptyCatalog);
        }

        let mut report = ValidationReport::default();

        // Phase 1: intern items (first occurrence of a name wins)
        let mut items: Vec<Item> = Vec::with_capacity(elements.len());
        let mut name_index: HashMap<String, ItemId> = HashMap::with_capacity(elements.len());
        let mut sources: Vec<&RawElement> = Vec::with_capacity(elements.len());

        for element in elements {
            if name_index.contains_key(&element.name) {
                log::warn!("Duplicate catalog entry for {}, keeping the first", element.name);
                report.duplicate_items.push(element.name.clone());
                continue;
            }
            let id = ItemId(items.len() as u32);
            name_index.insert(element.name.clone(), id);
            items.push(Item {
                id,
                name: element.name.clone(),
                tier: element.tier,
                recipes: Vec::new(),
            });
            sources.push(element);
        }

        // Phase 2: resolve and validate recipes
        let mut recipes: Vec<Recipe> = Vec::new();
        let mut defects: Vec<Option<RecipeDefect>> = Vec::new();

        for (index, element) in sources.iter().enumerate() {
            let result = ItemId(index as u32);
            for pair in &element.recipes {
                let (Some(first), Some(second)) =
                    (name_index.get(&pair[0]), name_index.get(&pair[1]))
                else {
                    log::debug!(
                        "Skipping recipe for {}: unknown ingredient in {} + {}",
                        element.name,
                        pair[0],
                        pair[1]
                    );
                    report.missing_ingredients.push(MissingIngredient {
                        result: element.name.clone(),
                        ingredients: pair.clone(),
                    });
                    continue;
                };

                let ingredients = [*first, *second];
                let defect = check_recipe(&items, result, ingredients);
                if let Some(defect) = &defect {
                    log::warn!(
                        "Malformed recipe {} = {} + {}: {defect}",
                        element.name,
                        pair[0],
                        pair[1]
                    );
                    report.malformed.push(MalformedRecipe {
                        result: element.name.clone(),
                        ingredients: pair.clone(),
                        defect: defect.clone(),
                    });
                    if self.policy == ValidationPolicy::Reject {
                        continue;
                    }
                }

                let id = RecipeId(recipes.len() as u32);
                recipes.push(Recipe {
                    id,
                    result,
                    ingredients,
                });
                defects.push(defect);
            }
        }

        // Phase 3: indices
        let mut consumers: Vec<Vec<RecipeId>> = vec![Vec::new(); items.len()];
        let mut by_result_tier: BTreeMap<u32, Vec<RecipeId>> = BTreeMap::new();

        for recipe in &recipes {
            items[recipe.result.index()].recipes.push(recipe.id);
            by_result_tier
                .entry(items[recipe.result.index()].tier)
                .or_default()
                .push(recipe.id);

            let [first, second] = recipe.ingredients;
            consumers[first.index()].push(recipe.id);
            if second != first {
                consumers[second.index()].push(recipe.id);
            }
        }

        // Phase 4: tier cycles (reported, never fatal)
        for cycle in find_cycles(&items, &recipes) {
            let names: Vec<String> = cycle
                .into_iter()
                .map(|id| items[id.index()].name.clone())
                .collect();
            log::warn!("Catalog contains a production cycle: {}", names.join(" -> "));
            report.cycles.push(names);
        }

        log::info!(
            "Built catalog: {} items, {} recipes ({} malformed, {} unresolved)",
            items.len(),
            recipes.len(),
            report.malformed.len(),
            report.missing_ingredients.len()
        );

        Ok(Catalog {
            items,
            recipes,
            name_index,
            consumers,
            by_result_tier,
            defects,
            report,
        })
    }
}

fn check_recipe(items: &[Item], result: ItemId, ingredients: [ItemId; 2]) -> Option<RecipeDefect> {
    if ingredients.contains(&result) {
        return Some(RecipeDefect::SelfReferential);
    }

    let result_tier = items[result.index()].tier;
    ingredients.into_iter().find_map(|ingredient| {
        let item = &items[ingredient.index()];
        (item.tier >= result_tier).then(|| RecipeDefect::TierNotDecreasing {
            ingredient: item.name.clone(),
            ingredient_tier: item.tier,
            result_tier,
        })
    })
}

/// Parse the external catalog file format (a JSON array of elements)
pub fn parse_elements(bytes: &[u8]) -> Result<Vec<RawElement>> {
    Ok(serde_json::from_slice(bytes)?)
}

impl Catalog {
    /// Parse and build with the default validation policy
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        CatalogBuilder::new().build(&parse_elements(bytes)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with(path, ValidationPolicy::default())
    }

    pub fn from_path_with(path: impl AsRef<Path>, policy: ValidationPolicy) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| GraphError::Io {
            path: path.display().to_string(),
            source,
        })?;
        CatalogBuilder::new().policy(policy).build(&parse_elements(&bytes)?)
    }

    pub fn from_elements(elements: &[RawElement]) -> Result<Self> {
        CatalogBuilder::new().build(elements)
    }
}
