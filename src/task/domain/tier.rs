//! Skill tiers shared by task difficulty and worker qualification.

use super::ParseSkillTierError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered skill level.
///
/// A task's difficulty and a worker's tier must be equal for the worker to
/// be considered for the task. The ordering reflects seniority and is not
/// used for eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillTier {
    /// Workers in training.
    Trainee,
    /// Regular workers.
    Regular,
    /// Specialists handling the hardest tasks.
    Specialist,
}

impl SkillTier {
    /// All tiers in ascending order.
    pub const ALL: [Self; 3] = [Self::Trainee, Self::Regular, Self::Specialist];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trainee => "trainee",
            Self::Regular => "regular",
            Self::Specialist => "specialist",
        }
    }
}

impl TryFrom<&str> for SkillTier {
    type Error = ParseSkillTierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "trainee" => Ok(Self::Trainee),
            "regular" => Ok(Self::Regular),
            "specialist" => Ok(Self::Specialist),
            _ => Err(ParseSkillTierError(value.to_owned())),
        }
    }
}

impl fmt::Display for SkillTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
