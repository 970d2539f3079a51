use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

const DEFAULT_SETUPS: &[&str] = &["Breakout", "Pullback", "Reversal", "Range Fade", "Gap and Go"];
const DEFAULT_SITUATIONS: &[&str] = &["Trending", "Ranging", "News Driven", "Earnings", "Low Volume"];
const DEFAULT_TAGS: &[&str] = &["A+ Setup", "FOMO", "Revenge", "Scaled In", "Scaled Out"];

fn vocabulary(words: &[&str]) -> BTreeSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn default_setups() -> BTreeSet<String> {
    vocabulary(DEFAULT_SETUPS)
}

fn default_situations() -> BTreeSet<String> {
    vocabulary(DEFAULT_SITUATIONS)
}

fn default_tags() -> BTreeSet<String> {
    vocabulary(DEFAULT_TAGS)
}

fn default_first_launch() -> bool {
    true
}

fn default_fiscal_year_start() -> u32 {
    1
}

/// Journal-wide configuration. Every field falls back to its default when
/// absent from a persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub starting_balance: f64,
    #[serde(default = "default_setups")]
    pub default_setups: BTreeSet<String>,
    #[serde(default = "default_tags")]
    pub default_tags: BTreeSet<String>,
    #[serde(default = "default_situations")]
    pub default_situations: BTreeSet<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_first_launch")]
    pub is_first_launch: bool,
    /// Month (1-12) the fiscal year starts in.
    #[serde(default = "default_fiscal_year_start")]
    pub fiscal_year_start: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_balance: 0.0,
            default_setups: default_setups(),
            default_tags: default_tags(),
            default_situations: default_situations(),
            theme: Theme::default(),
            is_first_launch: default_first_launch(),
            fiscal_year_start: default_fiscal_year_start(),
        }
    }
}

/// Settings patch. Vocabulary additions are applied before removals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSettingsInput {
    /// Only accepted while the journal is on its first launch.
    pub starting_balance: Option<f64>,
    pub add_setups: Vec<String>,
    pub remove_setups: Vec<String>,
    pub add_situations: Vec<String>,
    pub remove_situations: Vec<String>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    pub theme: Option<Theme>,
    pub fiscal_year_start: Option<u32>,
}
