//! Site domain model.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A logical deployment location, scanned independently from the others.
///
/// The set is closed and declaration order is meaningful: fan-out walks
/// [`Site::ALL`] and skips position 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Site {
    Alpha,
    Bravo,
    Charlie,
}

impl Site {
    /// All sites in declaration order.
    pub const ALL: [Site; 3] = [Site::Alpha, Site::Bravo, Site::Charlie];

    /// The canonical name, also used as the registry partition key.
    pub fn name(&self) -> &'static str {
        match self {
            Site::Alpha => "Alpha",
            Site::Bravo => "Bravo",
            Site::Charlie => "Charlie",
        }
    }

    /// Names of every site, in declaration order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Site::name).collect()
    }
}

impl FromStr for Site {
    type Err = Error;

    /// Parse a site name. Matching ignores ASCII case, anything else is
    /// reported as [`Error::UnknownSite`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|site| site.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::UnknownSite(s.to_string()))
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
