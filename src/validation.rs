//! Dataset validation applied once at the fetch boundary.
//!
//! Each upstream payload must be a JSON array. Every element is deserialized
//! into its record type and then checked by [`DatasetRecord::check`]; elements
//! that fail either step are dropped with a warning. The payload as a whole is
//! only rejected when the top level is not an array or nothing survives.

use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;

use crate::catalog::errors::CatalogError;
use crate::catalog::types::{
    HideoutModule, Item, LocalizedText, PhaseText, Project, Quest, RequirementItem,
};

/// Reasons a single record is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("{0}")]
    Malformed(String),

    #[error("missing or empty id")]
    MissingId,

    #[error("`{field}` has no `en` text")]
    MissingEnglish { field: String },

    #[error("requirement {index} of {context} has an empty itemId")]
    EmptyItemId { context: String, index: usize },

    #[error("requirement for `{item_id}` in {context} has quantity 0")]
    ZeroQuantity { context: String, item_id: String },
}

/// A record type that can be validated out of a raw dataset payload.
pub trait DatasetRecord: DeserializeOwned {
    fn record_id(&self) -> &str;

    /// Semantic checks that serde typing alone does not cover.
    fn check(&self) -> Result<(), RecordError>;
}

/// A dropped element: its index in the payload and why it was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub index: usize,
    pub reason: RecordError,
}

/// Outcome of validating one dataset payload.
#[derive(Debug, Clone)]
pub struct Validated<T> {
    pub records: Vec<T>,
    pub rejected: Vec<Rejected>,
}

/// Validate a raw payload for `dataset`.
///
/// Fails with [`CatalogError::Shape`] when `raw` is not an array and with
/// [`CatalogError::EmptyResult`] when no record survives (including an empty
/// array).
pub fn validate<T: DatasetRecord>(dataset: &str, raw: Value) -> Result<Validated<T>, CatalogError> {
    let elements = match raw {
        Value::Array(elements) => elements,
        other => {
            return Err(CatalogError::Shape {
                dataset: dataset.to_string(),
                found: format!("expected an array, got {}", json_kind(&other)),
            })
        }
    };

    let mut records = Vec::with_capacity(elements.len());
    let mut rejected = Vec::new();
    let mut seen = HashSet::new();

    for (index, element) in elements.into_iter().enumerate() {
        let outcome = serde_json::from_value::<T>(element)
            .map_err(|e| RecordError::Malformed(e.to_string()))
            .and_then(|record| record.check().map(|_| record));
        match outcome {
            Ok(record) => {
                if !seen.insert(record.record_id().to_string()) {
                    warn!("{}: duplicate id `{}` at record {}", dataset, record.record_id(), index);
                }
                records.push(record)
            }
            Err(reason) => {
                warn!("{}: dropping record {}: {}", dataset, index, reason);
                rejected.push(Rejected { index, reason });
            }
        }
    }

    if records.is_empty() {
        return Err(CatalogError::EmptyResult {
            dataset: dataset.to_string(),
            rejected: rejected.len(),
        });
    }
    if !rejected.is_empty() {
        warn!(
            "{}: kept {} records, dropped {} malformed",
            dataset,
            records.len(),
            rejected.len()
        );
    }

    Ok(Validated { records, rejected })
}

/// Human-readable name of a JSON value's type, for shape errors.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn check_id(id: &str) -> Result<(), RecordError> {
    if id.trim().is_empty() {
        return Err(RecordError::MissingId);
    }
    Ok(())
}

fn check_english(field: &str, text: &LocalizedText) -> Result<(), RecordError> {
    if !text.has_en() {
        return Err(RecordError::MissingEnglish {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn check_phase_text(field: &str, text: &PhaseText) -> Result<(), RecordError> {
    match text {
        PhaseText::Plain(_) => Ok(()),
        PhaseText::Localized(localized) => check_english(field, localized),
    }
}

fn check_requirements(context: &str, requirements: &[RequirementItem]) -> Result<(), RecordError> {
    for (index, requirement) in requirements.iter().enumerate() {
        if requirement.item_id.trim().is_empty() {
            return Err(RecordError::EmptyItemId {
                context: context.to_string(),
                index,
            });
        }
        if requirement.quantity == 0 {
            return Err(RecordError::ZeroQuantity {
                context: context.to_string(),
                item_id: requirement.item_id.clone(),
            });
        }
    }
    Ok(())
}

impl DatasetRecord for Item {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn check(&self) -> Result<(), RecordError> {
        check_id(&self.id)?;
        check_english("name", &self.name)
    }
}

impl DatasetRecord for HideoutModule {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn check(&self) -> Result<(), RecordError> {
        check_id(&self.id)?;
        check_english("name", &self.name)?;
        for level in &self.levels {
            check_requirements(&format!("level {}", level.level), &level.requirement_item_ids)?;
        }
        Ok(())
    }
}

impl DatasetRecord for Project {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn check(&self) -> Result<(), RecordError> {
        check_id(&self.id)?;
        check_english("name", &self.name)?;
        for phase in &self.phases {
            check_phase_text("phases[].name", &phase.name)?;
            if let Some(description) = &phase.description {
                check_phase_text("phases[].description", description)?;
            }
            check_requirements(&format!("phase {}", phase.phase), &phase.requirement_item_ids)?;
        }
        Ok(())
    }
}

impl DatasetRecord for Quest {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn check(&self) -> Result<(), RecordError> {
        check_id(&self.id)?;
        check_english("name", &self.name)?;
        check_requirements("requiredItemIds", self.required_items())?;
        if let Some(rewards) = &self.reward_item_ids {
            check_requirements("rewardItemIds", rewards)?;
        }
        Ok(())
    }
}
