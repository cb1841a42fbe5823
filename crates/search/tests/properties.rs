use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crafting_graph::{Catalog, RawElement};
use crafting_search::{ExportElement, SearchConfig, SearchMode, Solver};
use proptest::prelude::*;

/// Per tier, per item, ingredient picks into the pool of lower-tier items
type Layers = Vec<Vec<Vec<(u16, u16)>>>;

fn layered_catalog(bases: usize, layers: &Layers) -> Vec<RawElement> {
    let mut pool: Vec<String> = (0..bases).map(|i| format!("Base{i}")).collect();
    let mut elements: Vec<RawElement> = pool.iter().map(|name| RawElement::base(name.clone())).collect();

    for (offset, items) in layers.iter().enumerate() {
        let tier = offset as u32 + 1;
        let mut produced = Vec::new();
        for (index, picks) in items.iter().enumerate() {
            let name = format!("T{tier}Item{index}");
            let recipes: Vec<(&str, &str)> = picks
                .iter()
                .map(|&(a, b)| {
                    (
                        pool[a as usize % pool.len()].as_str(),
                        pool[b as usize % pool.len()].as_str(),
                    )
                })
                .collect();
            elements.push(RawElement::new(name.clone(), tier, &recipes));
            produced.push(name);
        }
        pool.extend(produced);
    }
    elements
}

fn catalogs() -> impl Strategy<Value = (Vec<RawElement>, String)> {
    let picks = prop::collection::vec((any::<u16>(), any::<u16>()), 1..4);
    let layers = prop::collection::vec(prop::collection::vec(picks, 1..4), 1..5);
    (2usize..5, layers).prop_map(|(bases, layers)| {
        let target = format!("T{}Item0", layers.len());
        (layered_catalog(bases, &layers), target)
    })
}

fn solve(elements: &[RawElement], target: &str, config: &SearchConfig) -> ExportElement {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("runtime");
    let solver = Solver::new(Arc::new(Catalog::from_elements(elements).expect("catalog")));
    runtime
        .block_on(solver.solve(target, config))
        .expect("solve")
        .tree
        .expect("tree")
}

fn config(recipe_limit: u32, bidirectional: bool) -> SearchConfig {
    SearchConfig {
        recipe_limit,
        mode: if bidirectional {
            SearchMode::Bidirectional
        } else {
            SearchMode::TopDown
        },
        drain_idle: Duration::from_millis(1),
        ..SearchConfig::default()
    }
}

/// No element is its own transitive ingredient
fn assert_acyclic(element: &ExportElement, path: &mut HashSet<String>) {
    assert!(
        path.insert(element.name.clone()),
        "{} is its own ingredient",
        element.name
    );
    for (first, second) in element.recipes() {
        assert_acyclic(first, path);
        assert_acyclic(second, path);
    }
    path.remove(&element.name);
}

fn assert_single_recipes(element: &ExportElement) {
    assert!(element.children.len() <= 1, "{} has {} recipes", element.name, element.children.len());
    for (first, second) in element.recipes() {
        assert_single_recipes(first);
        assert_single_recipes(second);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn exported_trees_are_acyclic(
        (elements, target) in catalogs(),
        recipe_limit in 1u32..6,
        bidirectional in any::<bool>(),
    ) {
        let tree = solve(&elements, &target, &config(recipe_limit, bidirectional));
        assert_acyclic(&tree, &mut HashSet::new());
    }

    #[test]
    fn quota_of_one_gives_one_recipe_per_item(
        (elements, target) in catalogs(),
        bidirectional in any::<bool>(),
    ) {
        let tree = solve(&elements, &target, &config(1, bidirectional));

        prop_assert_eq!(tree.children.len(), 1);
        assert_single_recipes(&tree);
    }

    #[test]
    fn every_recipe_has_two_ingredients(
        (elements, target) in catalogs(),
        recipe_limit in 1u32..6,
    ) {
        let tree = solve(&elements, &target, &config(recipe_limit, false));
        let mut stack = vec![&tree];
        while let Some(element) = stack.pop() {
            for recipe in &element.children {
                prop_assert_eq!(recipe.children.len(), 2);
                prop_assert_eq!(recipe.attributes.as_str(), "recipe");
                stack.extend(recipe.children.iter().map(Arc::as_ref));
            }
        }
    }
}
