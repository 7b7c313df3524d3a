//! The ten numbered golden rules.

use std::ops::RangeInclusive;

use serde::Serialize;

/// Full range of rule numbers.
pub const RULE_RANGE: RangeInclusive<u8> = 1..=10;

/// Rule enforced by the approval-rate circuit breaker.
pub const APPROVAL_RATE_RULE: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoldenRule {
    pub number: u8,
    pub title: &'static str,
    pub description: &'static str,
}

static RULEBOOK: [GoldenRule; 10] = [
    GoldenRule {
        number: 1,
        title: "Alpha never trades",
        description: "Alpha analyses, structures and authorizes. Execution belongs to other teams.",
    },
    GoldenRule {
        number: 2,
        title: "No single figure dominates",
        description: "Price, spread, volume, time, edge and risk weigh the same. One critical figure means rejection.",
    },
    GoldenRule {
        number: 3,
        title: "A tradable market is not a signal",
        description: "A tradable market authorizes analysis. An Alpha signal authorizes a trade.",
    },
    GoldenRule {
        number: 4,
        title: "Raw edge is never enough",
        description: "Only net edge, after costs, spread and safety margin, is considered.",
    },
    GoldenRule {
        number: 5,
        title: "Time is a risk",
        description: "The closer the resolution, the more fragile the signal. A high late edge is suspect.",
    },
    GoldenRule {
        number: 6,
        title: "Alpha is a machine for saying no",
        description: "At most 5% of analysed markets may produce an approved signal.",
    },
    GoldenRule {
        number: 7,
        title: "No vague language",
        description: "Opinion, hedging and intuition wording is forbidden.",
    },
    GoldenRule {
        number: 8,
        title: "Every signal is written",
        description: "A signal that cannot be formalised in writing is rejected.",
    },
    GoldenRule {
        number: 9,
        title: "Missing an opportunity is acceptable",
        description: "Authorizing a bad trade is a serious fault.",
    },
    GoldenRule {
        number: 10,
        title: "Discipline over intelligence",
        description: "A brilliant but undisciplined agent is rejected.",
    },
];

pub fn rulebook() -> &'static [GoldenRule] {
    &RULEBOOK
}

pub fn rule(number: u8) -> Option<&'static GoldenRule> {
    RULEBOOK.iter().find(|r| r.number == number)
}
