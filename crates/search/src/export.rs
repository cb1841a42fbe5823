//! Conversion of a finished search into the renderer's tree shape.
//!
//! The discovered structure is a DAG, so every item is built once and shared
//! by reference wherever it is reused. The walk keeps its own stack; an item
//! that is still being built when it is reached again (a tier cycle in a
//! broken catalog) is linked as a bare leaf.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crafting_graph::{Catalog, ItemId, RecipeId};
use serde::{Deserialize, Serialize};

use crate::state::Discovered;

pub const ELEMENT: &str = "element";
pub const RECIPE: &str = "recipe";

const TYPE_KEY: &str = "Type";
const SIDE_KEY: &str = "Side";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportElement {
    pub name: String,

    /// `Type` is always `element`; `Side` is present once a side found the item
    pub attributes: BTreeMap<String, String>,

    #[serde(default)]
    pub children: Vec<ExportRecipe>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecipe {
    pub attributes: String,

    /// Always the two ingredients, in catalog order
    pub children: Vec<Arc<ExportElement>>,
}

impl ExportElement {
    fn leaf(catalog: &Catalog, discovered: &Discovered, item: ItemId) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(TYPE_KEY.to_string(), ELEMENT.to_string());
        if let Some(label) = discovered.side(item).and_then(|side| side.label()) {
            attributes.insert(SIDE_KEY.to_string(), label.to_string());
        }
        Self {
            name: catalog.name(item).to_string(),
            attributes,
            children: Vec::new(),
        }
    }

    pub fn side(&self) -> Option<&str> {
        self.attributes.get(SIDE_KEY).map(String::as_str)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Ingredient pairs of this element's recipes
    pub fn recipes(&self) -> impl Iterator<Item = (&ExportElement, &ExportElement)> + '_ {
        self.children
            .iter()
            .filter_map(|recipe| match recipe.children.as_slice() {
                [first, second] => Some((first.as_ref(), second.as_ref())),
                _ => None,
            })
    }

    /// Recipe nodes in the tree, counting a shared subtree once per occurrence
    pub fn recipe_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(element) = stack.pop() {
            count += element.children.len();
            for recipe in &element.children {
                stack.extend(recipe.children.iter().map(Arc::as_ref));
            }
        }
        count
    }

    /// Element levels on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((element, level)) = stack.pop() {
            deepest = deepest.max(level);
            for recipe in &element.children {
                stack.extend(recipe.children.iter().map(|child| (child.as_ref(), level + 1)));
            }
        }
        deepest
    }
}

enum Visit {
    Enter(ItemId),
    Exit(ItemId),
}

/// Build the export tree rooted at `root`
///
/// Returns `None` when the root was never admitted. Base items are always
/// leaves, and an ingredient no side admitted exports as a bare leaf.
pub fn export(catalog: &Catalog, discovered: &Discovered, root: ItemId) -> Option<ExportElement> {
    if !discovered.is_admitted(root) {
        return None;
    }

    let mut built: HashMap<ItemId, Arc<ExportElement>> = HashMap::new();
    let mut stack = vec![Visit::Enter(root)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(item) => {
                if built.contains_key(&item) {
                    continue;
                }
                // Placeholder until the item is finished; cuts cycles.
                built.insert(item, Arc::new(ExportElement::leaf(catalog, discovered, item)));

                let recipes = expandable(catalog, discovered, item);
                if recipes.is_empty() {
                    continue;
                }
                stack.push(Visit::Exit(item));
                for &recipe in recipes.iter().rev() {
                    for ingredient in catalog.recipe(recipe).ingredients.into_iter().rev() {
                        if !built.contains_key(&ingredient) {
                            stack.push(Visit::Enter(ingredient));
                        }
                    }
                }
            }
            Visit::Exit(item) => {
                let mut element = ExportElement::leaf(catalog, discovered, item);
                element.children = expandable(catalog, discovered, item)
                    .iter()
                    .map(|&recipe| ExportRecipe {
                        attributes: RECIPE.to_string(),
                        children: catalog
                            .recipe(recipe)
                            .ingredients
                            .iter()
                            .map(|ingredient| {
                                built.get(ingredient).cloned().unwrap_or_else(|| {
                                    Arc::new(ExportElement::leaf(catalog, discovered, *ingredient))
                                })
                            })
                            .collect(),
                    })
                    .collect();
                built.insert(item, Arc::new(element));
            }
        }
    }

    built.remove(&root).map(Arc::unwrap_or_clone)
}

fn expandable<'a>(catalog: &Catalog, discovered: &'a Discovered, item: ItemId) -> &'a [RecipeId] {
    if catalog.item(item).is_base() || !discovered.is_admitted(item) {
        return &[];
    }
    discovered.chosen(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::fixtures;
    use crate::state::{SearchState, Side};
    use crate::top_down::TopDownEngine;
    use crafting_graph::RawElement;
    use pretty_assertions::assert_eq;

    fn element(name: &str, side: Option<&str>, children: Vec<ExportRecipe>) -> ExportElement {
        let mut attributes = BTreeMap::new();
        attributes.insert("Type".to_string(), "element".to_string());
        if let Some(side) = side {
            attributes.insert("Side".to_string(), side.to_string());
        }
        ExportElement {
            name: name.to_string(),
            attributes,
            children,
        }
    }

    fn recipe(first: ExportElement, second: ExportElement) -> ExportRecipe {
        ExportRecipe {
            attributes: "recipe".to_string(),
            children: vec![Arc::new(first), Arc::new(second)],
        }
    }

    fn solve(catalog: &Arc<Catalog>, target: &str, limit: u32) -> (Discovered, ItemId) {
        let state = Arc::new(SearchState::new(catalog.clone(), limit));
        let root = catalog.lookup(target).unwrap();
        TopDownEngine::new(state.clone(), root, &SearchConfig::with_recipe_limit(limit))
            .run_sequential();
        (state.snapshot(), root)
    }

    #[test]
    fn lava_exports_one_recipe_of_two_leaves() {
        let catalog = fixtures::lava();
        let (discovered, root) = solve(&catalog, "Lava", 5);

        let tree = export(&catalog, &discovered, root).unwrap();

        assert_eq!(
            tree,
            element(
                "Lava",
                Some("Top"),
                vec![recipe(
                    element("Earth", Some("Top"), vec![]),
                    element("Fire", Some("Top"), vec![]),
                )],
            )
        );
    }

    #[test]
    fn malformed_target_exports_as_leaf() {
        let catalog = fixtures::malformed_only();
        let (discovered, root) = solve(&catalog, "Clay", 5);

        let tree = export(&catalog, &discovered, root).unwrap();

        assert_eq!(tree, element("Clay", Some("Top"), vec![]));
    }

    #[test]
    fn unadmitted_root_exports_nothing() {
        let catalog = fixtures::lava();
        let state = SearchState::new(catalog.clone(), 1);

        assert_eq!(
            export(&catalog, &state.snapshot(), catalog.lookup("Lava").unwrap()),
            None
        );
    }

    #[test]
    fn export_is_idempotent() {
        let catalog = fixtures::alchemy();
        let (discovered, root) = solve(&catalog, "Sword", 4);

        assert_eq!(
            export(&catalog, &discovered, root),
            export(&catalog, &discovered, root)
        );
    }

    #[test]
    fn shared_ingredients_are_built_once() {
        let catalog = fixtures::alchemy();
        let (discovered, root) = solve(&catalog, "Metal", 3);

        let tree = export(&catalog, &discovered, root).unwrap();

        assert_eq!(tree.children.len(), 2);
        let first_stone = &tree.children[0].children[0];
        let second_stone = &tree.children[1].children[0];
        assert_eq!(first_stone.name, "Stone");
        assert!(Arc::ptr_eq(first_stone, second_stone));
        // Metal x2, Stone, Lava, Heat, Energy; Stone's subtree counted twice.
        assert_eq!(tree.recipe_count(), 2 + 2 * 2 + 2);
        assert_eq!(tree.depth(), 4);
    }

    #[test]
    fn cycles_are_cut_at_the_repeated_item() {
        let catalog = Arc::new(
            Catalog::from_elements(&[
                RawElement::base("Seed"),
                RawElement::new("Chicken", 1, &[("Egg", "Seed")]),
                RawElement::new("Egg", 1, &[("Chicken", "Seed")]),
            ])
            .unwrap(),
        );
        let state = SearchState::new(catalog.clone(), 1);
        let chicken = catalog.lookup("Chicken").unwrap();
        let egg = catalog.lookup("Egg").unwrap();
        state.claim(chicken, Side::Top);
        state.claim(egg, Side::Bottom);
        state.force_choose(chicken, catalog.item(chicken).recipes[0]);
        state.force_choose(egg, catalog.item(egg).recipes[0]);

        let tree = export(&catalog, &state.snapshot(), chicken).unwrap();

        assert_eq!(tree.recipe_count(), 2);
        assert_eq!(tree.depth(), 3);
        let (egg_node, seed) = tree.recipes().next().unwrap();
        assert_eq!(egg_node.side(), Some("Bottom"));
        assert_eq!(seed.side(), None);
        let (inner_chicken, _) = egg_node.recipes().next().unwrap();
        assert_eq!(inner_chicken.name, "Chicken");
        assert!(inner_chicken.is_leaf());
    }

    #[test]
    fn base_items_never_expand() {
        let catalog = Arc::new(
            Catalog::from_elements(&[
                RawElement::base("Fire"),
                RawElement::new("Earth", 0, &[("Fire", "Fire")]),
                RawElement::new("Lava", 1, &[("Earth", "Fire")]),
            ])
            .unwrap(),
        );
        let state = SearchState::new(catalog.clone(), 1);
        let earth = catalog.lookup("Earth").unwrap();
        let lava = catalog.lookup("Lava").unwrap();
        state.claim(lava, Side::Top);
        state.claim(earth, Side::Top);
        state.force_choose(lava, catalog.item(lava).recipes[0]);
        state.force_choose(earth, catalog.item(earth).recipes[0]);

        let tree = export(&catalog, &state.snapshot(), lava).unwrap();

        let (earth_node, _) = tree.recipes().next().unwrap();
        assert_eq!(earth_node.name, "Earth");
        assert!(earth_node.is_leaf());
    }

    #[test]
    fn serializes_in_renderer_shape() {
        let catalog = fixtures::lava();
        let (discovered, root) = solve(&catalog, "Lava", 1);

        let json = serde_json::to_value(export(&catalog, &discovered, root).unwrap()).unwrap();

        assert_eq!(json["name"], "Lava");
        assert_eq!(json["attributes"]["Type"], "element");
        assert_eq!(json["attributes"]["Side"], "Top");
        assert_eq!(json["children"][0]["attributes"], "recipe");
        assert_eq!(json["children"][0]["children"][1]["name"], "Fire");
    }
}
