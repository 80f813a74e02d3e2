//! Dataset record types.
//!
//! Field names follow the upstream JSON (`camelCase`), mapped onto snake_case
//! Rust fields. Records are immutable once fetched; the builder helpers exist
//! for fixtures and tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Language used for source labels and as the fallback for every lookup.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Text keyed by language code. `en` is required by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new(en: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert(DEFAULT_LANGUAGE.to_string(), en.to_string());
        Self(map)
    }

    pub fn with(mut self, language: &str, text: &str) -> Self {
        self.0.insert(language.to_string(), text.to_string());
        self
    }

    /// English text, or an empty string for records that skipped validation.
    pub fn en(&self) -> &str {
        self.0
            .get(DEFAULT_LANGUAGE)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Text in `language`, falling back to English.
    pub fn get_or_en(&self, language: &str) -> &str {
        match self.0.get(language) {
            Some(text) => text,
            None => self.en(),
        }
    }

    pub fn has_en(&self) -> bool {
        self.0.contains_key(DEFAULT_LANGUAGE)
    }
}

/// Phase names arrive either as a bare string or as a localized map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhaseText {
    Plain(String),
    Localized(LocalizedText),
}

impl PhaseText {
    /// The plain text, or the English entry of a localized map.
    pub fn display(&self) -> &str {
        match self {
            PhaseText::Plain(text) => text,
            PhaseText::Localized(text) => text.en(),
        }
    }
}

impl From<&str> for PhaseText {
    fn from(text: &str) -> Self {
        PhaseText::Plain(text.to_string())
    }
}

/// One required item inside a module level, project phase or quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementItem {
    pub item_id: String,
    pub quantity: u32,
}

impl RequirementItem {
    pub fn new(item_id: &str, quantity: u32) -> Self {
        Self {
            item_id: item_id.to_string(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub weight_kg: f64,
    #[serde(default)]
    pub stack_size: u32,
    /// Ingredients needed to craft this item (item id -> quantity).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<BTreeMap<String, u32>>,
    /// What recycling this item yields (item id -> quantity).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycles_into: Option<BTreeMap<String, u32>>,
}

impl Item {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: LocalizedText::new(name),
            description: LocalizedText::default(),
            item_type: String::new(),
            rarity: String::new(),
            value: 0.0,
            weight_kg: 0.0,
            stack_size: 1,
            recipe: None,
            recycles_into: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = LocalizedText::new(description);
        self
    }

    pub fn with_type(mut self, item_type: &str, rarity: &str) -> Self {
        self.item_type = item_type.to_string();
        self.rarity = rarity.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HideoutModuleLevel {
    pub level: u32,
    #[serde(default, alias = "requirements")]
    pub requirement_item_ids: Vec<RequirementItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HideoutModule {
    pub id: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub max_level: u32,
    #[serde(default)]
    pub levels: Vec<HideoutModuleLevel>,
}

impl HideoutModule {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: LocalizedText::new(name),
            max_level: 0,
            levels: Vec::new(),
        }
    }

    pub fn with_level(mut self, level: u32, requirements: Vec<RequirementItem>) -> Self {
        self.levels.push(HideoutModuleLevel {
            level,
            requirement_item_ids: requirements,
        });
        self.max_level = self.max_level.max(level);
        self
    }

    /// Every requirement across all levels, in level order.
    pub fn requirements(&self) -> impl Iterator<Item = &RequirementItem> {
        self.levels
            .iter()
            .flat_map(|level| level.requirement_item_ids.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPhase {
    pub phase: u32,
    pub name: PhaseText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<PhaseText>,
    #[serde(default, alias = "requirements")]
    pub requirement_item_ids: Vec<RequirementItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default)]
    pub phases: Vec<ProjectPhase>,
}

impl Project {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: LocalizedText::new(name),
            description: LocalizedText::default(),
            phases: Vec::new(),
        }
    }

    pub fn with_phase(
        mut self,
        phase: u32,
        name: PhaseText,
        requirements: Vec<RequirementItem>,
    ) -> Self {
        self.phases.push(ProjectPhase {
            phase,
            name,
            description: None,
            requirement_item_ids: requirements,
        });
        self
    }

    /// Every requirement across all phases, in phase order.
    pub fn requirements(&self) -> impl Iterator<Item = &RequirementItem> {
        self.phases
            .iter()
            .flat_map(|phase| phase.requirement_item_ids.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default)]
    pub trader: String,
    #[serde(default)]
    pub objectives: Vec<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_item_ids: Option<Vec<RequirementItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_item_ids: Option<Vec<RequirementItem>>,
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub previous_quest_ids: Vec<String>,
    #[serde(default)]
    pub next_quest_ids: Vec<String>,
}

impl Quest {
    pub fn new(id: &str, name: &str, trader: &str) -> Self {
        Self {
            id: id.to_string(),
            name: LocalizedText::new(name),
            description: LocalizedText::default(),
            trader: trader.to_string(),
            objectives: Vec::new(),
            required_item_ids: None,
            reward_item_ids: None,
            xp: 0,
            previous_quest_ids: Vec::new(),
            next_quest_ids: Vec::new(),
        }
    }

    pub fn with_required(mut self, item_id: &str, quantity: u32) -> Self {
        self.required_item_ids
            .get_or_insert_with(Vec::new)
            .push(RequirementItem::new(item_id, quantity));
        self
    }

    pub fn with_reward(mut self, item_id: &str, quantity: u32) -> Self {
        self.reward_item_ids
            .get_or_insert_with(Vec::new)
            .push(RequirementItem::new(item_id, quantity));
        self
    }

    /// Items the quest consumes; rewards are not included.
    pub fn required_items(&self) -> &[RequirementItem] {
        self.required_item_ids.as_deref().unwrap_or(&[])
    }
}
