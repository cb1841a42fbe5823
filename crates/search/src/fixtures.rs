use crafting_graph::{Catalog, RawElement};
use std::sync::Arc;

pub(crate) fn lava() -> Arc<Catalog> {
    build(vec![
        RawElement::base("Earth"),
        RawElement::base("Fire"),
        RawElement::new("Lava", 1, &[("Earth", "Fire")]),
    ])
}

/// Small but non-trivial production graph with shared sub-recipes
pub(crate) fn alchemy() -> Arc<Catalog> {
    build(alchemy_elements())
}

pub(crate) fn alchemy_elements() -> Vec<RawElement> {
    vec![
        RawElement::base("Air"),
        RawElement::base("Earth"),
        RawElement::base("Fire"),
        RawElement::base("Water"),
        RawElement::new("Lava", 1, &[("Earth", "Fire")]),
        RawElement::new("Steam", 1, &[("Water", "Fire")]),
        RawElement::new("Mud", 1, &[("Water", "Earth")]),
        RawElement::new("Pressure", 1, &[("Air", "Air")]),
        RawElement::new("Energy", 1, &[("Fire", "Fire")]),
        RawElement::new(
            "Stone",
            2,
            &[("Lava", "Air"), ("Earth", "Pressure"), ("Mud", "Fire")],
        ),
        RawElement::new("Heat", 2, &[("Air", "Energy")]),
        RawElement::new("Cloud", 2, &[("Steam", "Air")]),
        RawElement::new("Metal", 3, &[("Stone", "Fire"), ("Stone", "Heat")]),
        RawElement::new("Rain", 3, &[("Cloud", "Water")]),
        RawElement::new("Blade", 4, &[("Metal", "Stone")]),
        RawElement::new("Sword", 5, &[("Blade", "Metal")]),
    ]
}

/// Target whose only recipe uses an ingredient of the same tier
pub(crate) fn malformed_only() -> Arc<Catalog> {
    build(vec![
        RawElement::base("Earth"),
        RawElement::base("Fire"),
        RawElement::new("Mud", 2, &[("Earth", "Fire")]),
        RawElement::new("Clay", 2, &[("Mud", "Earth")]),
    ])
}

/// `Origin` followed by `Step1..=StepN`, each made from the previous step
pub(crate) fn chain(len: usize) -> Arc<Catalog> {
    let mut elements = vec![RawElement::base("Origin")];
    for step in 1..=len {
        let previous = if step == 1 {
            "Origin".to_string()
        } else {
            format!("Step{}", step - 1)
        };
        elements.push(RawElement::new(
            format!("Step{step}"),
            step as u32,
            &[(previous.as_str(), "Origin")],
        ));
    }
    build(elements)
}

fn build(elements: Vec<RawElement>) -> Arc<Catalog> {
    Arc::new(Catalog::from_elements(&elements).expect("fixture catalog"))
}
