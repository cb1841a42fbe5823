use crate::types::{Catalog, Item, ItemId, Recipe, RecipeId};
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};

impl Catalog {
    /// Starting elements (tier 0), in catalog order
    pub fn base_items(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|item| item.is_base())
            .map(|item| item.id)
            .collect()
    }

    /// Recipes producing an item of exactly `tier`, in catalog order
    pub fn recipes_producing_tier(&self, tier: u32) -> &[RecipeId] {
        self.by_result_tier
            .get(&tier)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Non-empty result tiers from 1 through `max`, ascending, with their recipes
    pub fn result_tiers_through(
        &self,
        max: u32,
    ) -> impl Iterator<Item = (u32, &[RecipeId])> + '_ {
        self.by_result_tier
            .range(1..=max)
            .map(|(&tier, recipes)| (tier, recipes.as_slice()))
    }

    /// Recipes that use `item` as one of their ingredients
    pub fn consumers_of(&self, item: ItemId) -> &[RecipeId] {
        self.consumers
            .get(item.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Recipes producing `item`, resolved
    pub fn recipes_for(&self, item: ItemId) -> impl Iterator<Item = &Recipe> + '_ {
        self.item(item)
            .recipes
            .iter()
            .map(move |&rid| self.recipe(rid))
    }

    pub fn max_tier(&self) -> u32 {
        self.items.iter().map(|item| item.tier).max().unwrap_or(0)
    }

    pub fn find(&self, name: &str) -> Option<&Item> {
        self.lookup(name).map(|id| self.item(id))
    }
}

/// Groups of items that transitively produce each other
///
/// Edges run ingredient -> result. A well-formed catalog is a DAG because
/// tiers strictly increase along every edge; any strongly connected
/// component with more than one member (or a self-loop) is a tier cycle.
pub(crate) fn find_cycles(items: &[Item], recipes: &[Recipe]) -> Vec<Vec<ItemId>> {
    let mut graph: DiGraph<ItemId, RecipeId> = DiGraph::with_capacity(items.len(), recipes.len() * 2);
    let nodes: Vec<NodeIndex> = items.iter().map(|item| graph.add_node(item.id)).collect();

    for recipe in recipes {
        let to = nodes[recipe.result.index()];
        for ingredient in recipe.ingredients {
            graph.add_edge(nodes[ingredient.index()], to, recipe.id);
        }
    }

    let mut cycles: Vec<Vec<ItemId>> = kosaraju_scc(&graph)
        .into_iter()
        .filter(|component| match component.as_slice() {
            [single] => graph.contains_edge(*single, *single),
            _ => true,
        })
        .map(|component| {
            let mut ids: Vec<ItemId> = component.into_iter().map(|idx| graph[idx]).collect();
            ids.sort();
            ids
        })
        .collect();
    cycles.sort();
    cycles
}
