//! Wildcard scope comparison modes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the fixed part of a `prefix*` listing scope is compared with dataset
/// names.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum WildcardMode {
    /// Match names containing the fixed part anywhere.
    #[default]
    Contains,
    /// Match names starting with the fixed part.
    Prefix,
}

/// Errors encountered while parsing a [`WildcardMode`] from text.
pub type WildcardModeParseError = strum::ParseError;
