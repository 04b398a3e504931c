// Reload Decision
// Decides whether a routine must be (re)loaded into the database

use std::collections::BTreeSet;

use sproc_utils::{CatalogRoutineInfo, RoutineMetadataRecord};

use crate::config::SessionSettings;
use crate::placeholder::ReplacePairs;

/// Why a routine must be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadReason {
    /// No metadata from a previous build
    FirstSight,
    SourceModified { previous: i64, current: i64 },
    PlaceholderChanged { token: String },
    /// The routine is absent from the database
    NotInDatabase,
    SessionChanged { setting: &'static str },
}

impl std::fmt::Display for ReloadReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReloadReason::FirstSight => write!(f, "no previous metadata"),
            ReloadReason::SourceModified { previous, current } => {
                write!(f, "source modified ({} -> {})", previous, current)
            }
            ReloadReason::PlaceholderChanged { token } => {
                write!(f, "value of placeholder '{}' changed", token)
            }
            ReloadReason::NotInDatabase => write!(f, "routine not found in database"),
            ReloadReason::SessionChanged { setting } => write!(f, "{} changed", setting),
        }
    }
}

/// Inputs of the reload decision
#[derive(Debug, Clone, Copy)]
pub struct ReloadInputs<'a> {
    pub previous: Option<&'a RoutineMetadataRecord>,
    pub timestamp: i64,
    pub replace_pairs: &'a ReplacePairs,
    pub catalog: Option<&'a CatalogRoutineInfo>,
    pub session: &'a SessionSettings,
}

/// Decide whether the routine must be reloaded.
///
/// Returns the first reason found, checked in order: first sight, source
/// timestamp, placeholder values, presence in the database, session settings.
/// `None` means the previous metadata is still valid and loading is skipped.
pub fn reload_reason(inputs: &ReloadInputs<'_>) -> Option<ReloadReason> {
    let Some(previous) = inputs.previous else {
        return Some(ReloadReason::FirstSight);
    };

    if previous.timestamp != inputs.timestamp {
        return Some(ReloadReason::SourceModified {
            previous: previous.timestamp,
            current: inputs.timestamp,
        });
    }

    for (token, value) in &previous.replace {
        if inputs.replace_pairs.get(token) != Some(value.as_str()) {
            return Some(ReloadReason::PlaceholderChanged {
                token: token.clone(),
            });
        }
    }

    let Some(catalog) = inputs.catalog else {
        return Some(ReloadReason::NotInDatabase);
    };

    if !same_sql_mode(&catalog.sql_mode, &inputs.session.sql_mode) {
        return Some(ReloadReason::SessionChanged {
            setting: "sql_mode",
        });
    }

    if !catalog
        .character_set_client
        .eq_ignore_ascii_case(&inputs.session.character_set)
    {
        return Some(ReloadReason::SessionChanged {
            setting: "character_set_client",
        });
    }

    if !catalog
        .collation_connection
        .eq_ignore_ascii_case(&inputs.session.collation)
    {
        return Some(ReloadReason::SessionChanged {
            setting: "collation_connection",
        });
    }

    None
}

/// Compare sql modes as sets of flags; the server may report the flags in a
/// different order than configured.
fn same_sql_mode(a: &str, b: &str) -> bool {
    let flags = |mode: &str| -> BTreeSet<String> {
        mode.split(',')
            .map(|flag| flag.trim().to_ascii_uppercase())
            .filter(|flag| !flag.is_empty())
            .collect()
    };
    flags(a) == flags(b)
}
