use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a portal region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId(pub i32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The set of regions a user may operate in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionScope {
    /// Unrestricted; carried by portal-wide administrators
    All,
    /// An explicit region set; typically the user's home region plus
    /// any they were granted
    Regions(Vec<RegionId>),
}

impl RegionScope {
    pub fn single(region: RegionId) -> Self {
        RegionScope::Regions(vec![region])
    }

    pub fn contains(&self, region: RegionId) -> bool {
        match self {
            RegionScope::All => true,
            RegionScope::Regions(regions) => regions.contains(&region),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, RegionScope::All)
    }

    /// Region ids for token claims; `None` means unrestricted
    pub fn region_ids(&self) -> Option<&[RegionId]> {
        match self {
            RegionScope::All => None,
            RegionScope::Regions(regions) => Some(regions),
        }
    }
}

impl Default for RegionScope {
    fn default() -> Self {
        RegionScope::Regions(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_scope_contains_everything() {
        let scope = RegionScope::All;
        assert!(scope.contains(RegionId(1)));
        assert!(scope.contains(RegionId(9999)));
        assert!(scope.region_ids().is_none());
    }

    #[test]
    fn test_region_set_membership() {
        let scope = RegionScope::Regions(vec![RegionId(1), RegionId(3)]);
        assert!(scope.contains(RegionId(1)));
        assert!(scope.contains(RegionId(3)));
        assert!(!scope.contains(RegionId(2)));
    }

    #[test]
    fn test_default_scope_is_empty() {
        let scope = RegionScope::default();
        assert!(!scope.contains(RegionId(1)));
        assert!(!scope.is_all());
    }
}
