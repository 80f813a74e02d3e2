//! Query matching over the loaded item list.
//!
//! Results come in two groups. Direct matches are items whose own text
//! contains the query. Indirect matches are the remaining items required by a
//! module, project or quest whose name contains the query. Each group keeps
//! the input order and an item appears at most once, in the first group it
//! qualifies for.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::types::{HideoutModule, Item, LocalizedText, Project, Quest, DEFAULT_LANGUAGE};

/// Which item text a direct match looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Name,
    NameAndDescription,
}

impl std::str::FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(MatchMode::Name),
            "name_and_description" | "full" => Ok(MatchMode::NameAndDescription),
            other => Err(format!("unknown match mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Empty query: every item, in input order.
    Unfiltered,
    Direct,
    Indirect,
}

/// One result plus why it matched.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub item: &'a Item,
    pub kind: MatchKind,
    /// Names of matching modules/projects/quests that require this item.
    /// Only filled for indirect matches.
    pub via: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct QueryMatcher {
    mode: MatchMode,
    language: String,
}

impl Default for QueryMatcher {
    fn default() -> Self {
        Self::new(MatchMode::Name, DEFAULT_LANGUAGE)
    }
}

impl QueryMatcher {
    pub fn new(mode: MatchMode, language: &str) -> Self {
        Self {
            mode,
            language: language.to_string(),
        }
    }

    /// Ordered items for `query`. See the module docs for the grouping rules.
    pub fn matches<'a>(
        &self,
        items: &'a [Item],
        query: &str,
        modules: Option<&[HideoutModule]>,
        projects: Option<&[Project]>,
        quests: Option<&[Quest]>,
    ) -> Vec<&'a Item> {
        self.hits(items, query, modules, projects, quests)
            .into_iter()
            .map(|hit| hit.item)
            .collect()
    }

    /// Like [`QueryMatcher::matches`] but keeps the match reason.
    pub fn hits<'a>(
        &self,
        items: &'a [Item],
        query: &str,
        modules: Option<&[HideoutModule]>,
        projects: Option<&[Project]>,
        quests: Option<&[Quest]>,
    ) -> Vec<SearchHit<'a>> {
        let query = query.trim();
        if query.is_empty() {
            return items
                .iter()
                .map(|item| SearchHit {
                    item,
                    kind: MatchKind::Unfiltered,
                    via: Vec::new(),
                })
                .collect();
        }
        let needle = query.to_lowercase();
        let related = self.related_matches(&needle, modules, projects, quests);

        let mut direct = Vec::new();
        let mut indirect = Vec::new();
        for item in items {
            if self.item_matches(item, &needle) {
                direct.push(SearchHit {
                    item,
                    kind: MatchKind::Direct,
                    via: Vec::new(),
                });
            } else if let Some(via) = related.get(item.id.as_str()) {
                indirect.push(SearchHit {
                    item,
                    kind: MatchKind::Indirect,
                    via: via.clone(),
                });
            }
        }
        direct.extend(indirect);
        direct
    }

    fn item_matches(&self, item: &Item, needle: &str) -> bool {
        if self.text_contains(&item.name, needle) {
            return true;
        }
        self.mode == MatchMode::NameAndDescription && self.text_contains(&item.description, needle)
    }

    fn text_contains(&self, text: &LocalizedText, needle: &str) -> bool {
        text.get_or_en(&self.language).to_lowercase().contains(needle)
    }

    /// Item id -> names of the matching entities that require it.
    fn related_matches<'d>(
        &self,
        needle: &str,
        modules: Option<&'d [HideoutModule]>,
        projects: Option<&'d [Project]>,
        quests: Option<&'d [Quest]>,
    ) -> HashMap<&'d str, Vec<String>> {
        let mut related: HashMap<&'d str, Vec<String>> = HashMap::new();
        let mut note = |item_id: &'d str, name: &str| {
            let names = related.entry(item_id).or_default();
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_string());
            }
        };

        for module in modules.unwrap_or(&[]) {
            if self.text_contains(&module.name, needle) {
                let name = module.name.get_or_en(&self.language);
                for requirement in module.requirements() {
                    note(&requirement.item_id, name);
                }
            }
        }
        for project in projects.unwrap_or(&[]) {
            if self.text_contains(&project.name, needle) {
                let name = project.name.get_or_en(&self.language);
                for requirement in project.requirements() {
                    note(&requirement.item_id, name);
                }
            }
        }
        for quest in quests.unwrap_or(&[]) {
            if self.text_contains(&quest.name, needle) {
                let name = quest.name.get_or_en(&self.language);
                for requirement in quest.required_items() {
                    note(&requirement.item_id, name);
                }
            }
        }

        related
    }
}

/// Search with the default matcher (name only, English).
pub fn search<'a>(
    items: &'a [Item],
    query: &str,
    modules: Option<&[HideoutModule]>,
    projects: Option<&[Project]>,
    quests: Option<&[Quest]>,
) -> Vec<&'a Item> {
    QueryMatcher::default().matches(items, query, modules, projects, quests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::RequirementItem;

    #[test]
    fn match_mode_parses_cli_spellings() {
        assert_eq!("name".parse::<MatchMode>().unwrap(), MatchMode::Name);
        assert_eq!(
            "name-and-description".parse::<MatchMode>().unwrap(),
            MatchMode::NameAndDescription
        );
        assert!("fuzzy".parse::<MatchMode>().is_err());
    }

    #[test]
    fn description_only_counts_in_full_mode() {
        let items = vec![Item::new("a", "Battery").with_description("Powers an old radio")];
        let name_only = QueryMatcher::new(MatchMode::Name, "en");
        assert!(name_only.matches(&items, "radio", None, None, None).is_empty());

        let full = QueryMatcher::new(MatchMode::NameAndDescription, "en");
        assert_eq!(full.matches(&items, "radio", None, None, None).len(), 1);
    }

    #[test]
    fn indirect_hit_reports_matching_entities() {
        let items = vec![Item::new("wire", "Wires")];
        let modules = vec![HideoutModule::new("m", "Radio Tower").with_level(1, vec![RequirementItem::new("wire", 2)])];
        let quests = vec![Quest::new("q", "Radio Silence", "Tian Wen").with_required("wire", 1)];
        let hits = QueryMatcher::default().hits(&items, "radio", Some(&modules[..]), None, Some(&quests[..]));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, MatchKind::Indirect);
        assert_eq!(hits[0].via, vec!["Radio Tower", "Radio Silence"]);
    }

    #[test]
    fn query_is_trimmed_and_case_insensitive() {
        let items = vec![Item::new("1", "Iron Ore")];
        assert_eq!(search(&items, "  IRON ", None, None, None).len(), 1);
    }

    #[test]
    fn display_language_with_english_fallback() {
        let mut ore = Item::new("1", "Iron Ore");
        ore.name = ore.name.with("de", "Eisenerz");
        let bar = Item::new("2", "Iron Bar");
        let items = vec![ore, bar];
        let german = QueryMatcher::new(MatchMode::Name, "de");
        let ids: Vec<_> = german
            .matches(&items, "iron", None, None, None)
            .iter()
            .map(|item| item.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2"]);
    }
}
