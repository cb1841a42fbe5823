use crafting_graph::{Catalog, GraphError, RecipeDefect, ValidationPolicy};
use std::fs;
use tempfile::tempdir;

const CATALOG: &str = r#"[
  {"name": "Earth", "tier": 0},
  {"name": "Fire", "tier": 0, "recipes": []},
  {"name": "Lava", "tier": 1, "recipes": [["Earth", "Fire"], ["Fire", "Magma"]]},
  {"name": "Magma", "tier": 1, "recipes": [["Lava", "Fire"]]},
  {"name": "Obsidian", "tier": 2, "recipes": [["Lava", "Earth"]]}
]"#;

#[test]
fn loads_catalog_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("recipes.json");
    fs::write(&path, CATALOG).unwrap();

    let catalog = Catalog::from_path(&path).expect("catalog");

    assert_eq!(catalog.item_count(), 5);
    assert_eq!(catalog.base_items().len(), 2);
    assert_eq!(catalog.max_tier(), 2);

    let lava = catalog.lookup("Lava").unwrap();
    let recipes: Vec<_> = catalog.recipes_for(lava).collect();
    assert_eq!(recipes.len(), 2);
    assert!(catalog.is_well_formed(recipes[0].id));
    assert!(!catalog.is_well_formed(recipes[1].id));

    let report = catalog.validation();
    assert_eq!(report.malformed.len(), 2);
    assert!(matches!(
        report.malformed[0].defect,
        RecipeDefect::TierNotDecreasing { .. }
    ));
    assert_eq!(
        report.cycles,
        vec![vec!["Lava".to_string(), "Magma".to_string()]]
    );
}

#[test]
fn reject_policy_drops_defective_recipes_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("recipes.json");
    fs::write(&path, CATALOG).unwrap();

    let catalog = Catalog::from_path_with(&path, ValidationPolicy::Reject).expect("catalog");

    let lava = catalog.lookup("Lava").unwrap();
    assert_eq!(catalog.recipes_for(lava).count(), 1);
    assert!(catalog.validation().cycles.is_empty());
}

#[test]
fn missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let err = Catalog::from_path(&path).unwrap_err();

    assert!(matches!(err, GraphError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        Catalog::from_path(&path),
        Err(GraphError::Parse(_))
    ));
}
