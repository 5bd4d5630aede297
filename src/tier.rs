use serde::Serialize;

use crate::config::TierOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    BelowMinimum,
    Minimum,
    Good,
    Great,
}

impl Tier {
    /// Select-option ID of this tier in the weekly table.
    pub fn option_id<'a>(&self, options: &'a TierOptions) -> &'a str {
        match self {
            Tier::BelowMinimum => &options.below_minimum,
            Tier::Minimum => &options.minimum,
            Tier::Good => &options.good,
            Tier::Great => &options.great,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::BelowMinimum => "below_minimum",
            Tier::Minimum => "minimum",
            Tier::Good => "good",
            Tier::Great => "great",
        }
    }
}

/// Tier plus the three threshold flags, each computed from the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierAssessment {
    pub tier: Tier,
    pub minimum_met: bool,
    pub good_met: bool,
    pub great_met: bool,
}

/// Classifies weekly counters.
///
/// - Below minimum: no signups, no calls, no emails.
/// - Minimum: 1+ signup OR 1+ call OR 1+ email.
/// - Good: 3+ signups AND 2+ calls AND 2+ emails.
/// - Great: 5+ signups AND 5+ calls AND 5+ emails.
pub fn classify(signups: i64, calls: i64, emails: i64) -> TierAssessment {
    if signups < 1 && calls == 0 && emails == 0 {
        return TierAssessment {
            tier: Tier::BelowMinimum,
            minimum_met: false,
            good_met: false,
            great_met: false,
        };
    }

    let minimum_met = signups >= 1 || calls >= 1 || emails >= 1;
    let good_met = signups >= 3 && calls >= 2 && emails >= 2;
    let great_met = signups >= 5 && calls >= 5 && emails >= 5;

    let tier = if great_met {
        Tier::Great
    } else if good_met {
        Tier::Good
    } else if minimum_met {
        Tier::Minimum
    } else {
        Tier::BelowMinimum
    };

    TierAssessment {
        tier,
        minimum_met,
        good_met,
        great_met,
    }
}
