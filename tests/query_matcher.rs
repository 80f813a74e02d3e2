use arcdex::catalog::{
    HideoutModule, Item, MatchKind, MatchMode, PhaseText, Project, QueryMatcher, Quest, RequirementItem,
};
use arcdex::search;

fn ids<'a>(items: &[&'a Item]) -> Vec<&'a str> {
    items.iter().map(|item| item.id.as_str()).collect()
}

fn ore_items() -> Vec<Item> {
    vec![
        Item::new("1", "Iron Ore"),
        Item::new("2", "Steel Bar"),
        Item::new("3", "Iron Bar"),
    ]
}

#[test]
fn empty_query_returns_items_unchanged() {
    let items = ore_items();
    assert_eq!(ids(&search(&items, "", None, None, None)), vec!["1", "2", "3"]);
    assert_eq!(ids(&search(&items, "   ", None, None, None)), vec!["1", "2", "3"]);
}

#[test]
fn direct_matches_keep_input_order() {
    let items = ore_items();
    assert_eq!(ids(&search(&items, "iron", None, None, None)), vec!["1", "3"]);
    assert_eq!(ids(&search(&items, "IRON", None, None, None)), vec!["1", "3"]);
}

#[test]
fn no_match_is_empty() {
    let items = ore_items();
    assert!(search(&items, "copper", None, None, None).is_empty());
}

#[test]
fn indirect_matches_follow_direct_ones_without_duplicates() {
    let items = vec![
        Item::new("gear", "Rusted Gear"),
        Item::new("bench_part", "Bench Clamp"),
        Item::new("fuse", "Fuse"),
    ];
    let modules = vec![HideoutModule::new("bench", "Workbench").with_level(
        1,
        vec![RequirementItem::new("fuse", 2), RequirementItem::new("bench_part", 1)],
    )];

    let found = search(&items, "bench", Some(&modules[..]), None, None);
    assert_eq!(ids(&found), vec!["bench_part", "fuse"]);
}

#[test]
fn project_and_quest_names_pull_in_their_requirements() {
    let items = vec![Item::new("battery", "Battery"), Item::new("wires", "Wires"), Item::new("fabric", "Fabric")];
    let projects = vec![Project::new("p", "Expedition Caravan").with_phase(
        1,
        PhaseText::from("Core"),
        vec![RequirementItem::new("wires", 10)],
    )];
    let quests = vec![
        Quest::new("q", "Power Outage", "Shani")
            .with_required("battery", 2)
            .with_reward("fabric", 1),
    ];

    let by_project = search(&items, "caravan", None, Some(&projects[..]), None);
    assert_eq!(ids(&by_project), vec!["wires"]);

    let by_quest = search(&items, "outage", None, None, Some(&quests[..]));
    assert_eq!(ids(&by_quest), vec!["battery"], "rewards are not matched");
}

#[test]
fn indirect_results_keep_input_item_order() {
    let items = vec![Item::new("a", "Alpha"), Item::new("b", "Beta"), Item::new("c", "Gamma")];
    let modules = vec![HideoutModule::new("m", "Refiner")
        .with_level(1, vec![RequirementItem::new("c", 1)])
        .with_level(2, vec![RequirementItem::new("a", 1)])];
    let found = search(&items, "refiner", Some(&modules[..]), None, None);
    assert_eq!(ids(&found), vec!["a", "c"]);
}

#[test]
fn hits_report_kind_and_matching_entities() {
    let items = vec![Item::new("bench_kit", "Bench Kit"), Item::new("fuse", "Fuse")];
    let modules = vec![HideoutModule::new("bench", "Workbench").with_level(1, vec![RequirementItem::new("fuse", 2)])];
    let hits = QueryMatcher::default().hits(&items, "bench", Some(&modules[..]), None, None);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].kind, MatchKind::Direct);
    assert_eq!(hits[1].kind, MatchKind::Indirect);
    assert_eq!(hits[1].via, vec!["Workbench"]);
}

#[test]
fn description_mode_widens_direct_matches() {
    let items = vec![
        Item::new("gear", "Rusted Gear").with_description("Recycles into metal parts"),
        Item::new("fabric", "Fabric"),
    ];
    assert!(search(&items, "metal", None, None, None).is_empty());

    let matcher = QueryMatcher::new(MatchMode::NameAndDescription, "en");
    let found = matcher.matches(&items, "metal", None, None, None);
    assert_eq!(ids(&found), vec!["gear"]);
}

#[test]
fn configured_language_falls_back_to_english() {
    let mut items = vec![Item::new("gear", "Rusted Gear"), Item::new("fabric", "Fabric")];
    items[0].name = items[0].name.clone().with("de", "Rostiges Zahnrad");
    let matcher = QueryMatcher::new(MatchMode::Name, "de");
    assert_eq!(ids(&matcher.matches(&items, "zahnrad", None, None, None)), vec!["gear"]);
    assert_eq!(ids(&matcher.matches(&items, "fabric", None, None, None)), vec!["fabric"]);
}
