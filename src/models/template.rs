use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A reusable trade plan: setup, situation and the pre-entry checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeTemplate {
    pub id: String,
    pub name: String,
    pub setup: String,
    #[serde(default)]
    pub situation: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateInput {
    pub name: String,
    pub setup: String,
    pub situation: String,
    pub tags: Vec<String>,
    pub notes: String,
}
