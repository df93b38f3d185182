//! Tiered rating of a [`GeometryVector`].
//!
//! `RATING_RULES` is an ordered table of predicates evaluated top to bottom;
//! the first match decides the tier. Bands overlap on purpose, so the order
//! is part of the rule set. Anything unmatched lands in `Unclassified`.

use crate::domain::geometry::{GeometryVector, Horizon};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RatingTier {
    Titan,
    Dominator,
    Phoenix,
    Launchpad,
    Elite,
    StrongBull,
    SteadyBull,
    ModerateBull,
    WeakBull,
    NeutralPlus,
    Neutral,
    NeutralMinus,
    Divergence,
    WeakBear,
    ModerateBear,
    StrongBear,
    SevereBear,
    Depression,
    StructuralDecline,
    Collapse,
    Reversal,
    Unclassified,
    NoData,
}

impl RatingTier {
    pub fn code(&self) -> &'static str {
        match self {
            RatingTier::Titan => "SSS",
            RatingTier::Dominator => "AAA",
            RatingTier::Phoenix => "Phoenix",
            RatingTier::Launchpad => "Launchpad",
            RatingTier::Elite => "AA+",
            RatingTier::StrongBull => "AA",
            RatingTier::SteadyBull => "AA-",
            RatingTier::ModerateBull => "A+",
            RatingTier::WeakBull => "A",
            RatingTier::NeutralPlus => "BBB+",
            RatingTier::Neutral => "BBB",
            RatingTier::NeutralMinus => "BBB-",
            RatingTier::Divergence => "Divergence",
            RatingTier::WeakBear => "BB+",
            RatingTier::ModerateBear => "BB",
            RatingTier::StrongBear => "BB-",
            RatingTier::SevereBear => "B+",
            RatingTier::Depression => "B",
            RatingTier::StructuralDecline => "C",
            RatingTier::Collapse => "D",
            RatingTier::Reversal => "Reversal",
            RatingTier::Unclassified | RatingTier::NoData => "N/A",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RatingTier::Titan => "Titan",
            RatingTier::Dominator => "Dominator",
            RatingTier::Phoenix => "Phoenix",
            RatingTier::Launchpad => "Launchpad",
            RatingTier::Elite => "Elite",
            RatingTier::StrongBull => "Strong Bull",
            RatingTier::SteadyBull => "Steady Bull",
            RatingTier::ModerateBull => "Moderate Bull",
            RatingTier::WeakBull => "Weak Bull",
            RatingTier::NeutralPlus => "Neutral+",
            RatingTier::Neutral => "Neutral",
            RatingTier::NeutralMinus => "Neutral-",
            RatingTier::Divergence => "Divergence",
            RatingTier::WeakBear => "Weak Bear",
            RatingTier::ModerateBear => "Moderate Bear",
            RatingTier::StrongBear => "Strong Bear",
            RatingTier::SevereBear => "Severe Bear",
            RatingTier::Depression => "Depression",
            RatingTier::StructuralDecline => "Structural Decline",
            RatingTier::Collapse => "Collapse",
            RatingTier::Reversal => "Reversal",
            RatingTier::Unclassified => "Unclassified",
            RatingTier::NoData => "No Data",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RatingTier::Titan => "every horizon above 45 degrees",
            RatingTier::Dominator => "short-term acceleration on a strong trend",
            RatingTier::Phoenix => "long-term decline with a strong recent turn",
            RatingTier::Launchpad => "highly linear one-year climb, accelerating",
            RatingTier::Elite => "strong one-year advance",
            RatingTier::StrongBull => "steady medium and short-term rise",
            RatingTier::SteadyBull => "healthy uptrend",
            RatingTier::ModerateBull => "good short-term performance",
            RatingTier::WeakBull => "mild short-term rise",
            RatingTier::NeutralPlus => "range-bound with an upward lean",
            RatingTier::Neutral => "sideways",
            RatingTier::NeutralMinus => "range-bound with a downward lean",
            RatingTier::Divergence => "one-year strength with fading momentum",
            RatingTier::WeakBear => "short-term decline",
            RatingTier::ModerateBear => "clear downtrend",
            RatingTier::StrongBear => "sharp decline",
            RatingTier::SevereBear => "crash mode",
            RatingTier::Depression => "long-term bear market",
            RatingTier::StructuralDecline => "generational bear market",
            RatingTier::Collapse => "extreme danger",
            RatingTier::Reversal => "V-shaped turn inside a bear market",
            RatingTier::Unclassified => "no rule matched",
            RatingTier::NoData => "insufficient data",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RatingTier::Titan | RatingTier::StrongBull => "#FFD700",
            RatingTier::Dominator => "#FF4500",
            RatingTier::Phoenix | RatingTier::ModerateBear => "#FF6347",
            RatingTier::Launchpad => "#32CD32",
            RatingTier::Elite => "#FFA500",
            RatingTier::SteadyBull => "#ADFF2F",
            RatingTier::ModerateBull => "#7FFF00",
            RatingTier::WeakBull => "#98FB98",
            RatingTier::NeutralPlus => "#F0E68C",
            RatingTier::Neutral => "#D3D3D3",
            RatingTier::NeutralMinus => "#DDA0DD",
            RatingTier::Divergence => "#FF1493",
            RatingTier::WeakBear => "#FFA07A",
            RatingTier::StrongBear => "#DC143C",
            RatingTier::SevereBear => "#8B0000",
            RatingTier::Depression => "#800000",
            RatingTier::StructuralDecline => "#4B0082",
            RatingTier::Collapse => "#000000",
            RatingTier::Reversal => "#00CED1",
            RatingTier::Unclassified | RatingTier::NoData => "#808080",
        }
    }
}

impl fmt::Display for RatingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.name())
    }
}

/// A tier together with its display metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub tier: RatingTier,
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
}

impl From<RatingTier> for Rating {
    fn from(tier: RatingTier) -> Self {
        Rating {
            tier,
            code: tier.code(),
            name: tier.name(),
            description: tier.description(),
            color: tier.color(),
        }
    }
}

pub struct RatingRule {
    pub tier: RatingTier,
    pub matches: fn(&GeometryReading) -> bool,
}

/// The parts of a [`GeometryVector`] the cascade reads, extracted once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryReading {
    pub y35: f64,
    pub y10: f64,
    pub y1: f64,
    pub m6: f64,
    pub m3: f64,
    pub r2_y1: f64,
    pub r2_m3: f64,
    pub acceleration: f64,
    pub reversal: bool,
}

impl GeometryReading {
    pub fn of(g: &GeometryVector) -> Self {
        GeometryReading {
            y35: g.angle(Horizon::Y35),
            y10: g.angle(Horizon::Y10),
            y1: g.angle(Horizon::Y1),
            m6: g.angle(Horizon::M6),
            m3: g.angle(Horizon::M3),
            r2_y1: g.r_squared(Horizon::Y1),
            r2_m3: g.r_squared(Horizon::M3),
            acceleration: g.acceleration,
            reversal: g.reversal_signal,
        }
    }
}

fn between(v: f64, lo: f64, hi: f64) -> bool {
    lo < v && v < hi
}

pub static RATING_RULES: &[RatingRule] = &[
    RatingRule {
        tier: RatingTier::Titan,
        matches: |r| r.y35 > 45.0 && r.y10 > 45.0 && r.y1 > 45.0 && r.m3 > 45.0,
    },
    RatingRule {
        tier: RatingTier::Dominator,
        matches: |r| r.y1 > 40.0 && r.m6 > 45.0 && r.m3 > 50.0 && r.acceleration > 20.0,
    },
    RatingRule {
        tier: RatingTier::Phoenix,
        matches: |r| r.reversal && r.m3 > 30.0,
    },
    RatingRule {
        tier: RatingTier::Launchpad,
        matches: |r| r.r2_y1 > 0.95 && between(r.y1, 20.0, 40.0) && r.acceleration > 0.0,
    },
    RatingRule {
        tier: RatingTier::Elite,
        matches: |r| r.y1 > 35.0 && r.m3 > 40.0 && r.r2_m3 > 0.85,
    },
    RatingRule {
        tier: RatingTier::StrongBull,
        matches: |r| r.y1 > 30.0 && r.m6 > 35.0,
    },
    RatingRule {
        tier: RatingTier::SteadyBull,
        matches: |r| r.y1 > 25.0 && r.m3 > 30.0,
    },
    RatingRule {
        tier: RatingTier::ModerateBull,
        matches: |r| r.m6 > 20.0 && r.m3 > 25.0,
    },
    RatingRule {
        tier: RatingTier::WeakBull,
        matches: |r| r.m3 > 15.0,
    },
    RatingRule {
        tier: RatingTier::NeutralPlus,
        matches: |r| between(r.m3, -5.0, 15.0) && r.y1 > 0.0,
    },
    RatingRule {
        tier: RatingTier::Neutral,
        matches: |r| between(r.m3, -10.0, 10.0) && between(r.y1, -10.0, 10.0),
    },
    RatingRule {
        tier: RatingTier::NeutralMinus,
        matches: |r| between(r.m3, -15.0, 5.0) && r.y1 < 0.0,
    },
    RatingRule {
        tier: RatingTier::Divergence,
        matches: |r| r.y1 > 20.0 && r.m3 < -10.0,
    },
    RatingRule {
        tier: RatingTier::WeakBear,
        matches: |r| between(r.m3, -25.0, -15.0) && r.y1 > -10.0,
    },
    RatingRule {
        tier: RatingTier::ModerateBear,
        matches: |r| between(r.m3, -35.0, -25.0),
    },
    RatingRule {
        tier: RatingTier::StrongBear,
        matches: |r| between(r.m3, -45.0, -35.0),
    },
    RatingRule {
        tier: RatingTier::SevereBear,
        matches: |r| r.m3 < -45.0 && r.y1 < -30.0,
    },
    RatingRule {
        tier: RatingTier::Depression,
        matches: |r| r.y10 < -30.0 && r.m3 < -40.0,
    },
    RatingRule {
        tier: RatingTier::StructuralDecline,
        matches: |r| r.y35 < -20.0 && r.y10 < -35.0,
    },
    RatingRule {
        tier: RatingTier::Collapse,
        matches: |r| r.m3 < -60.0,
    },
    // Shadowed by WeakBull whenever 3M > 15; kept so reordering stays a
    // one-line change.
    RatingRule {
        tier: RatingTier::Reversal,
        matches: |r| r.y10 < -20.0 && r.m3 > 15.0 && r.acceleration > 30.0,
    },
];

/// First matching tier in `rules`, or `Unclassified`.
pub fn rate_with(rules: &[RatingRule], geometry: &GeometryVector) -> RatingTier {
    let reading = GeometryReading::of(geometry);
    rules
        .iter()
        .find(|rule| (rule.matches)(&reading))
        .map(|rule| rule.tier)
        .unwrap_or(RatingTier::Unclassified)
}

pub fn rate(geometry: &GeometryVector) -> Rating {
    rate_with(RATING_RULES, geometry).into()
}

/// `NoData` when no geometry could be computed.
pub fn rate_optional(geometry: Option<&GeometryVector>) -> Rating {
    match geometry {
        Some(g) => rate(g),
        None => RatingTier::NoData.into(),
    }
}
