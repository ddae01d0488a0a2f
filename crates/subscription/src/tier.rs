use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Subscription tier, ordered by ascending access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Free,
    Value,
    Standard,
    Professional,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown subscription tier '{0}' (expected free, value, standard or professional)")]
pub struct UnknownTier(pub String);

impl Tier {
    /// All tiers in ascending order.
    pub const ALL: [Tier; 4] = [Tier::Free, Tier::Value, Tier::Standard, Tier::Professional];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Value => "value",
            Tier::Standard => "standard",
            Tier::Professional => "professional",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Tier::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownTier(s.to_string()))
    }
}
