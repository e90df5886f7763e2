//! Helpers behind the resident directory page: text search, the block
//! picker and the header counters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::ResidentInfo;

/// Case-insensitive substring match over name, house number and occupation.
/// An empty (or all-whitespace) term matches every resident.
pub fn matches_search(resident: &ResidentInfo, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    [&resident.full_name, &resident.house_number, &resident.occupation]
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter_residents<'a>(residents: &'a [ResidentInfo], term: &str) -> Vec<&'a ResidentInfo> {
    residents.iter().filter(|r| matches_search(r, term)).collect()
}

/// Sorted, de-duplicated blocks of the public records.
pub fn distinct_blocks<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a ResidentInfo>,
{
    records
        .into_iter()
        .filter(|r| r.is_public)
        .map(|r| r.block.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryStats {
    pub total_residents: u32,
    pub total_blocks: u32,
    pub total_family_members: u32,
}

impl DirectoryStats {
    pub fn from_residents(residents: &[ResidentInfo]) -> Self {
        Self {
            total_residents: residents.len() as u32,
            total_blocks: distinct_blocks(residents).len() as u32,
            total_family_members: residents.iter().map(|r| r.family_members).sum(),
        }
    }
}
