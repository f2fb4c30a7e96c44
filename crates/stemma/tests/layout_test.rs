use serde::Deserialize;
use stemma::{
    Error, Layout, LayoutConfig, LayoutError, Person, Relationship, SpousePair, ValidationError,
    Warning, generate_layout,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    people: Vec<Person>,
    relationships: Vec<Relationship>,
}

fn three_generations() -> Fixture {
    serde_json::from_str(include_str!(
        "../../../fixtures/family/three_generations.json"
    ))
    .unwrap()
}

fn layout(people: &[Person], rels: &[Relationship]) -> Layout {
    generate_layout(people, rels, &LayoutConfig::default()).unwrap()
}

fn center(layout: &Layout, id: &str) -> f64 {
    layout
        .node(id)
        .unwrap()
        .center_x(LayoutConfig::default().person_width)
}

fn assert_rows_do_not_overlap(layout: &Layout, config: &LayoutConfig) {
    let mut rows: std::collections::BTreeMap<usize, Vec<f64>> = Default::default();
    for n in &layout.nodes {
        rows.entry(n.depth).or_default().push(n.x);
    }
    for (depth, mut xs) in rows {
        xs.sort_by(f64::total_cmp);
        for pair in xs.windows(2) {
            assert!(
                pair[1] - pair[0] >= config.person_width + config.min_gap - 1e-6,
                "row {depth}: boxes at {} and {} overlap",
                pair[0],
                pair[1]
            );
        }
    }
}

fn assert_partners_share_rows(layout: &Layout) {
    for m in &layout.marriages {
        let Some(spouse2) = &m.spouse2 else { continue };
        let a = layout.node(&m.spouse1.id).unwrap();
        let b = layout.node(&spouse2.id).unwrap();
        assert_eq!(a.y, b.y, "{} and {} are on different rows", a.person.id, b.person.id);
        assert_eq!(m.y, a.y);
        assert!(a.x < b.x, "spouse1 should be the left-most parent");
    }
}

#[test]
fn three_generation_fixture_rows() {
    let f = three_generations();
    let out = layout(&f.people, &f.relationships);

    let depth = |id: &str| out.node(id).unwrap().depth;
    assert_eq!(depth("robert"), 0);
    assert_eq!(depth("mary"), 0);
    for id in ["john", "sarah", "michael", "simon", "zuzana"] {
        assert_eq!(depth(id), 1, "{id}");
    }
    assert_eq!(depth("james"), 2);
    assert_eq!(depth("emma"), 2);
    assert!(out.warnings.is_empty());
}

#[test]
fn three_generation_fixture_unions() {
    let f = three_generations();
    let out = layout(&f.people, &f.relationships);

    assert_eq!(out.marriages.len(), 3);
    assert!(out.marriages.iter().all(|m| m.explicit));
    for (a, b) in [("robert", "mary"), ("sarah", "michael"), ("simon", "zuzana")] {
        assert!(out.marriage(a, b).is_some(), "{a} & {b}");
    }

    let tolerance = LayoutConfig::default().centering_tolerance();
    let emma_union = out.marriage("zuzana", "simon").unwrap();
    assert!((center(&out, "emma") - emma_union.x).abs() <= tolerance);
    let james_union = out.marriage("michael", "sarah").unwrap();
    assert!((center(&out, "james") - james_union.x).abs() <= tolerance);
    for m in &out.marriages {
        assert!(
            (spouses_mid(&out, m) - m.x).abs() <= tolerance,
            "{} is not over its children",
            m.spouse1.id
        );
    }

    let grandparents = out.marriage("robert", "mary").unwrap();
    let names: Vec<&str> = grandparents.children.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(names, ["john", "sarah", "simon"]);
}

#[test]
fn three_generation_fixture_geometry() {
    let f = three_generations();
    let config = LayoutConfig::default();
    let out = layout(&f.people, &f.relationships);

    let order: Vec<&str> = out.nodes.iter().map(|n| n.person.id.as_str()).collect();
    assert_eq!(
        order,
        ["robert", "mary", "john", "sarah", "michael", "simon", "zuzana", "james", "emma"]
    );
    assert_eq!(out.node("robert").unwrap().x, config.padding + 170.0);
    assert_eq!(out.node("john").unwrap().x, config.padding);
    assert_eq!(out.node("emma").unwrap().y, config.padding + 2.0 * config.row_pitch());
    assert_eq!(out.width, 1000.0);
    assert_eq!(out.height, 440.0);

    // The grandparents sit exactly over the centroid of their three children.
    let grandparents = out.marriage("robert", "mary").unwrap();
    let centroid = (center(&out, "john") + center(&out, "sarah") + center(&out, "simon")) / 3.0;
    assert_eq!(grandparents.x, centroid);
    assert_eq!(grandparents.width, 2.0 * config.person_width + config.spouse_gap);

    assert_rows_do_not_overlap(&out, &config);
    assert_partners_share_rows(&out);
}

#[test]
fn layout_is_deterministic_and_ignores_input_order() {
    let f = three_generations();
    let first = layout(&f.people, &f.relationships);
    assert_eq!(first, layout(&f.people, &f.relationships));

    let mut people = f.people.clone();
    people.reverse();
    let mut rels: Vec<Relationship> = f
        .relationships
        .iter()
        .map(|r| {
            if r.is_spouse() {
                Relationship::spouse(r.to_person_id.clone(), r.from_person_id.clone())
            } else {
                r.clone()
            }
        })
        .collect();
    rels.rotate_left(5);
    assert_eq!(first, layout(&people, &rels));
}

#[test]
fn fatal_errors_produce_no_layout() {
    let people = vec![Person::new("a", "A"), Person::new("b", "B")];

    let cyclic = vec![Relationship::parent("a", "b"), Relationship::parent("b", "a")];
    let err = generate_layout(&people, &cyclic, &LayoutConfig::default()).unwrap_err();
    assert!(matches!(
        err.validation_errors(),
        [ValidationError::CycleDetected { .. }]
    ));

    let duplicated = vec![Relationship::spouse("a", "b"), Relationship::spouse("a", "b")];
    assert!(matches!(
        generate_layout(&people, &duplicated, &LayoutConfig::default()),
        Err(Error::Validation(_))
    ));

    let self_ref = vec![Relationship::parent("a", "a")];
    assert!(matches!(
        generate_layout(&people, &self_ref, &LayoutConfig::default()),
        Err(Error::Validation(_))
    ));

    let config = LayoutConfig {
        min_gap: 0.0,
        ..Default::default()
    };
    assert!(matches!(
        generate_layout(&people, &[], &config),
        Err(Error::Layout(LayoutError::InvalidConfig { field: "minGap", .. }))
    ));
}

#[test]
fn orphan_spouse_edge_is_dropped_with_a_warning() {
    let f = three_generations();
    let mut rels = f.relationships.clone();
    rels.push(Relationship::spouse("john", "someone_else"));

    let out = layout(&f.people, &rels);
    assert_eq!(out.nodes.len(), 9);
    assert!(out.node("john").unwrap().spouses.is_empty());
    assert_eq!(
        out.warnings,
        vec![Warning::DroppedRelationship {
            relationship: Relationship::spouse("john", "someone_else"),
            missing_person_id: "someone_else".to_string(),
        }]
    );
}

#[test]
fn single_child_unions_are_centered() {
    let people = vec![
        Person::new("mom", "Mom").with_birth_year(1950),
        Person::new("dad", "Dad").with_birth_year(1948),
        Person::new("kid", "Kid").with_birth_year(1980),
        Person::new("single", "Single").with_birth_year(1952),
        Person::new("only", "Only").with_birth_year(1985),
    ];
    let rels = vec![
        Relationship::parent("mom", "kid"),
        Relationship::parent("dad", "kid"),
        Relationship::parent("single", "only"),
    ];
    let out = layout(&people, &rels);
    let tolerance = LayoutConfig::default().centering_tolerance();

    let couple = out.marriage("mom", "dad").unwrap();
    assert!(!couple.explicit);
    assert!((center(&out, "kid") - couple.x).abs() <= tolerance);

    let single = out.single_parent_union("single").unwrap();
    assert!(!single.explicit);
    assert!((center(&out, "only") - single.x).abs() <= tolerance);
    assert!((center(&out, "single") - single.x).abs() <= tolerance);

    // The parents themselves sit over the child, not just the union anchor.
    assert!((spouses_mid(&out, couple) - couple.x).abs() <= tolerance);
}

fn spouses_mid(layout: &Layout, union: &SpousePair) -> f64 {
    let pw = LayoutConfig::default().person_width;
    let first = layout.node(&union.spouse1.id).unwrap().x;
    let last = union
        .spouse2
        .as_ref()
        .map_or(first, |p| layout.node(&p.id).unwrap().x);
    (first + last + pw) / 2.0
}

fn in_law_family() -> (Vec<Person>, Vec<Relationship>) {
    let people = vec![
        Person::new("robert", "Robert").with_birth_year(1940),
        Person::new("mary", "Mary").with_birth_year(1942),
        Person::new("xavier", "Xavier").with_birth_year(1941),
        Person::new("yvonne", "Yvonne").with_birth_year(1943),
        Person::new("sarah", "Sarah").with_birth_year(1967),
        Person::new("michael", "Michael").with_birth_year(1966),
    ];
    let rels = vec![
        Relationship::spouse("robert", "mary"),
        Relationship::spouse("xavier", "yvonne"),
        Relationship::spouse("sarah", "michael"),
        Relationship::parent("robert", "sarah"),
        Relationship::parent("mary", "sarah"),
        Relationship::parent("xavier", "michael"),
        Relationship::parent("yvonne", "michael"),
    ];
    (people, rels)
}

#[test]
fn in_laws_stand_next_to_their_married_child() {
    let (people, rels) = in_law_family();
    let config = LayoutConfig::default();
    let out = layout(&people, &rels);

    assert_rows_do_not_overlap(&out, &config);
    assert_partners_share_rows(&out);

    let claimed = out.marriage("robert", "mary").unwrap();
    assert_eq!(claimed.x, center(&out, "sarah"));
    assert_eq!(spouses_mid(&out, claimed), claimed.x);

    // Centered over michael, xavier would start at 220 and collide with mary (220..380);
    // the nearest free spot is one childGap right of her.
    let in_laws = out.marriage("xavier", "yvonne").unwrap();
    assert_eq!(in_laws.x, center(&out, "michael"));
    assert_eq!(out.node("mary").unwrap().x, 220.0);
    assert_eq!(out.node("xavier").unwrap().x, 220.0 + 160.0 + config.child_gap);
    assert_eq!(spouses_mid(&out, in_laws) - in_laws.x, 240.0);
    assert_eq!(out.width, 840.0);
}

#[test]
fn in_law_offset_is_independent_of_record_order() {
    let (people, rels) = in_law_family();
    let expected = layout(&people, &rels);

    let mut people = people;
    people.reverse();
    let mut rels = rels;
    rels.reverse();
    assert_eq!(expected, layout(&people, &rels));
}

#[test]
fn generational_skip_keeps_co_parents_on_their_own_rows() {
    let people = vec![
        Person::new("g", "G").with_birth_year(1900),
        Person::new("q", "Q").with_birth_year(1920),
        Person::new("c", "C").with_birth_year(1940),
    ];
    let rels = vec![
        Relationship::parent("g", "q"),
        Relationship::parent("g", "c"),
        Relationship::parent("q", "c"),
    ];
    let config = LayoutConfig::default();
    let out = layout(&people, &rels);

    let depth = |id: &str| out.node(id).unwrap().depth;
    assert_eq!((depth("g"), depth("q"), depth("c")), (0, 1, 2));
    assert_eq!(out.height, 2.0 * config.padding + 2.0 * config.row_pitch() + config.person_height);

    let union = out.marriage("g", "q").unwrap();
    assert!(!union.explicit);
    assert_eq!(union.y, config.padding);
    assert_eq!(union.x, center(&out, "c"));
    assert_eq!(union.width, config.person_width);

    // q and c hang under g's two unions, childGap apart.
    assert_eq!(out.node("q").unwrap().x, config.padding);
    assert_eq!(out.node("c").unwrap().x, config.padding + 160.0 + config.child_gap);
    assert_eq!(out.node("g").unwrap().x, 160.0);
    assert_rows_do_not_overlap(&out, &config);
}

#[test]
fn empty_input_gives_an_empty_padded_layout() {
    let out = layout(&[], &[]);
    assert!(out.nodes.is_empty());
    assert!(out.marriages.is_empty());
    assert_eq!(out.width, 80.0);
    assert_eq!(out.height, 80.0);
}

#[test]
fn layout_serializes_with_camel_case_fields() {
    let f = three_generations();
    let value = serde_json::to_value(layout(&f.people, &f.relationships)).unwrap();
    let first = &value["marriages"][0];
    assert!(first["branchColor"].as_str().unwrap().starts_with('#'));
    assert!(first["spouse1"]["birthYear"].is_number());
    assert!(value["nodes"][0]["children"].is_array());
}

/// xorshift; enough to shape a reproducible family.
struct Rng(u64);

impl Rng {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0 % bound
    }
}

fn synthetic_family(seed: u64, generations: usize) -> (Vec<Person>, Vec<Relationship>) {
    let mut rng = Rng(seed);
    let mut people: Vec<Person> = Vec::new();
    let mut rels: Vec<Relationship> = Vec::new();
    let add = |people: &mut Vec<Person>, year: i32| {
        let id = format!("p{}", people.len());
        people.push(Person::new(id.clone(), id.clone()).with_birth_year(year));
        id
    };

    let mut couples: Vec<(String, String, i32)> = Vec::new();
    for _ in 0..3 {
        let a = add(&mut people, 1900);
        let b = add(&mut people, 1902);
        rels.push(Relationship::spouse(a.clone(), b.clone()));
        couples.push((a, b, 1900));
    }

    for _ in 0..generations {
        let mut next: Vec<(String, String, i32)> = Vec::new();
        for (a, b, year) in &couples {
            for _ in 0..1 + rng.next(3) {
                let child_year = year + 25 + rng.next(8) as i32;
                let kid = add(&mut people, child_year);
                rels.push(Relationship::parent(a.clone(), kid.clone()));
                rels.push(Relationship::parent(b.clone(), kid.clone()));

                match rng.next(4) {
                    0 => {}
                    1 => {
                        // Co-parent without a spouse record.
                        let partner = add(&mut people, child_year + 1);
                        next.push((kid, partner, child_year));
                    }
                    _ => {
                        let partner = add(&mut people, child_year - 2);
                        rels.push(Relationship::spouse(partner.clone(), kid.clone()));
                        next.push((kid.clone(), partner, child_year));
                        if rng.next(5) == 0 {
                            let second = add(&mut people, child_year + 3);
                            rels.push(Relationship::spouse(kid.clone(), second.clone()));
                            next.push((kid, second, child_year));
                        }
                    }
                }
            }
        }
        couples = next;
    }
    (people, rels)
}

#[test]
fn synthetic_families_keep_every_row_apart() {
    let config = LayoutConfig::default();
    for seed in [7_u64, 42, 2024, 90_001] {
        let (people, rels) = synthetic_family(seed, 4);
        let out = generate_layout(&people, &rels, &config).unwrap();

        assert_eq!(out.nodes.len(), people.len());
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
        assert_rows_do_not_overlap(&out, &config);
        assert_partners_share_rows(&out);
        for n in &out.nodes {
            assert_eq!(n.y, config.padding + n.depth as f64 * config.row_pitch());
            assert!(n.x >= config.padding);
            assert!(n.x + config.person_width <= out.width - config.padding + 1e-6);
        }
    }
}

#[test]
fn synthetic_families_flag_explicit_unions_exactly() {
    let (people, rels) = synthetic_family(1234, 3);
    let out = layout(&people, &rels);
    for m in &out.marriages {
        let Some(spouse2) = &m.spouse2 else {
            assert!(!m.explicit);
            continue;
        };
        let recorded = rels.iter().any(|r| {
            r.is_spouse()
                && ((r.from_person_id == m.spouse1.id && r.to_person_id == spouse2.id)
                    || (r.to_person_id == m.spouse1.id && r.from_person_id == spouse2.id))
        });
        assert_eq!(m.explicit, recorded, "{} & {}", m.spouse1.id, spouse2.id);
    }
}

#[test]
fn synthetic_families_ignore_input_order() {
    let (people, rels) = synthetic_family(77, 3);
    let expected = layout(&people, &rels);

    let mut shuffled_people = people.clone();
    shuffled_people.reverse();
    let mut shuffled_rels = rels.clone();
    shuffled_rels.reverse();
    assert_eq!(expected, layout(&shuffled_people, &shuffled_rels));
}

#[test]
fn synthetic_in_law_trees_never_collide() {
    let config = LayoutConfig::default();
    for seed in [11_u64, 505, 31_337] {
        let (mut people, mut rels) = synthetic_family(seed, 3);

        let married: Vec<&str> = rels
            .iter()
            .filter(|r| r.is_spouse())
            .flat_map(|r| [r.from_person_id.as_str(), r.to_person_id.as_str()])
            .collect();
        let leaves: Vec<(String, i32)> = people
            .iter()
            .filter(|p| {
                rels.iter().any(|r| r.is_parent() && r.to_person_id == p.id)
                    && !rels.iter().any(|r| r.is_parent() && r.from_person_id == p.id)
                    && !married.contains(&p.id.as_str())
            })
            .filter_map(|p| Some((p.id.clone(), p.birth_year?)))
            .take(5)
            .collect();
        assert!(!leaves.is_empty());

        for (i, (leaf, year)) in leaves.into_iter().enumerate() {
            let [father, mother, spouse] = [0, 1, 2].map(|k| format!("inlaw{i}_{k}"));
            people.push(Person::new(father.clone(), father.clone()).with_birth_year(year - 30));
            people.push(Person::new(mother.clone(), mother.clone()).with_birth_year(year - 28));
            people.push(Person::new(spouse.clone(), spouse.clone()).with_birth_year(year + 1));
            rels.push(Relationship::spouse(father.clone(), mother.clone()));
            rels.push(Relationship::parent(father, spouse.clone()));
            rels.push(Relationship::parent(mother, spouse.clone()));
            rels.push(Relationship::spouse(leaf, spouse));
        }

        let out = generate_layout(&people, &rels, &config).unwrap();
        assert_eq!(out.nodes.len(), people.len());
        assert_rows_do_not_overlap(&out, &config);
        assert_partners_share_rows(&out);
        for n in &out.nodes {
            assert!(n.x >= config.padding - 1e-6);
            assert!(n.x + config.person_width <= out.width - config.padding + 1e-6);
        }
    }
}
