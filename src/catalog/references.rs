//! Reverse "where is this item used" index.
//!
//! Built once per load from the three requirement datasets. Traversal order
//! is fixed: module levels, then project phases, then quest requirements, so
//! `sources` for an item always lists modules first.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::types::{HideoutModule, HideoutModuleLevel, Project, ProjectPhase, Quest};

/// Which kind of dataset a source label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Module,
    Project,
    Quest,
}

/// Occurrence counts per [`SourceKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceKinds {
    pub modules: usize,
    pub projects: usize,
    pub quests: usize,
}

/// Everything known about where one item is required.
///
/// `count == sources.len()` and `total_quantity` equals the sum of the
/// per-source quantities. Labels are not unique across occurrences; a repeated
/// label merges its quantity into the existing entry while `sources` keeps
/// both occurrences.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDetails {
    pub count: usize,
    pub sources: Vec<String>,
    pub total_quantity: u64,
    #[serde(serialize_with = "serialize_pairs")]
    quantity_by_source: Vec<(String, u64)>,
    #[serde(skip)]
    kinds: SourceKinds,
}

impl ReferenceDetails {
    fn record(&mut self, kind: SourceKind, label: String, quantity: u32) {
        let quantity = u64::from(quantity);
        self.count += 1;
        self.total_quantity += quantity;
        match self
            .quantity_by_source
            .iter_mut()
            .find(|(existing, _)| *existing == label)
        {
            Some((_, total)) => *total += quantity,
            None => self.quantity_by_source.push((label.clone(), quantity)),
        }
        self.sources.push(label);
        match kind {
            SourceKind::Module => self.kinds.modules += 1,
            SourceKind::Project => self.kinds.projects += 1,
            SourceKind::Quest => self.kinds.quests += 1,
        }
    }

    /// Quantity required under `label`, if the item is required there.
    pub fn quantity_for(&self, label: &str) -> Option<u64> {
        self.quantity_by_source
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, quantity)| *quantity)
    }

    /// Per-source quantities in first-seen order.
    pub fn by_source(&self) -> &[(String, u64)] {
        &self.quantity_by_source
    }

    pub fn source_kinds(&self) -> SourceKinds {
        self.kinds
    }
}

fn serialize_pairs<S: Serializer>(pairs: &[(String, u64)], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (label, quantity) in pairs {
        map.serialize_entry(label, quantity)?;
    }
    map.end()
}

/// Item id -> [`ReferenceDetails`]. Items never required are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReferenceIndex(BTreeMap<String, ReferenceDetails>);

impl ReferenceIndex {
    pub fn get(&self, item_id: &str) -> Option<&ReferenceDetails> {
        self.0.get(item_id)
    }

    /// Number of occurrences for `item_id`; zero when it is never required.
    pub fn count_for(&self, item_id: &str) -> usize {
        self.0.get(item_id).map(|details| details.count).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReferenceDetails)> {
        self.0.iter().map(|(id, details)| (id.as_str(), details))
    }

    fn record(&mut self, item_id: &str, kind: SourceKind, label: String, quantity: u32) {
        self.0
            .entry(item_id.to_string())
            .or_default()
            .record(kind, label, quantity);
    }
}

pub fn module_label(module: &HideoutModule, level: &HideoutModuleLevel) -> String {
    format!("{} (Level {})", module.name.en(), level.level)
}

pub fn project_label(project: &Project, phase: &ProjectPhase) -> String {
    format!("{} ({})", project.name.en(), phase.name.display())
}

pub fn quest_label(quest: &Quest) -> String {
    format!("{} (Quest)", quest.name.en())
}

/// Build the reverse index. Pure and deterministic.
pub fn build_reference_index(
    modules: &[HideoutModule],
    projects: &[Project],
    quests: &[Quest],
) -> ReferenceIndex {
    let mut index = ReferenceIndex::default();

    for module in modules {
        for level in &module.levels {
            for requirement in &level.requirement_item_ids {
                index.record(
                    &requirement.item_id,
                    SourceKind::Module,
                    module_label(module, level),
                    requirement.quantity,
                );
            }
        }
    }

    for project in projects {
        for phase in &project.phases {
            for requirement in &phase.requirement_item_ids {
                index.record(
                    &requirement.item_id,
                    SourceKind::Project,
                    project_label(project, phase),
                    requirement.quantity,
                );
            }
        }
    }

    for quest in quests.iter().filter(|q| !q.required_items().is_empty()) {
        for requirement in quest.required_items() {
            index.record(
                &requirement.item_id,
                SourceKind::Quest,
                quest_label(quest),
                requirement.quantity,
            );
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::RequirementItem;

    #[test]
    fn repeated_label_merges_quantity_but_keeps_both_sources() {
        let module = HideoutModule::new("stash", "Stash")
            .with_level(1, vec![RequirementItem::new("gear", 2)])
            .with_level(1, vec![RequirementItem::new("gear", 3)]);
        let index = build_reference_index(&[module], &[], &[]);
        let gear = index.get("gear").unwrap();
        assert_eq!(gear.count, 2);
        assert_eq!(gear.sources, vec!["Stash (Level 1)", "Stash (Level 1)"]);
        assert_eq!(gear.by_source().len(), 1);
        assert_eq!(gear.quantity_for("Stash (Level 1)"), Some(5));
        assert_eq!(gear.total_quantity, 5);
    }

    #[test]
    fn serializes_quantity_by_source_as_map() {
        let quest = Quest::new("q", "Clearer Skies", "Shani").with_required("antenna", 1);
        let index = build_reference_index(&[], &[], &[quest]);
        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json["antenna"]["quantityBySource"]["Clearer Skies (Quest)"], 1);
        assert_eq!(json["antenna"]["totalQuantity"], 1);
    }

    #[test]
    fn source_kinds_follow_traversal() {
        let module = HideoutModule::new("m", "Workbench").with_level(1, vec![RequirementItem::new("wire", 1)]);
        let project = Project::new("p", "Expedition").with_phase(1, "Hull".into(), vec![RequirementItem::new("wire", 4)]);
        let quest = Quest::new("q", "Signals", "Celeste").with_required("wire", 2);
        let index = build_reference_index(&[module], &[project], &[quest]);
        let kinds = index.get("wire").unwrap().source_kinds();
        assert_eq!(kinds, SourceKinds { modules: 1, projects: 1, quests: 1 });
    }
}
