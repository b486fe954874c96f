use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How a named modifier alters a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScoreModifier {
    /// Multiplies the running value.
    Factor(f64),
    /// Adds to the running value.
    Bonus(f64),
}

/// Composite suitability value used to rank candidate work.
///
/// The value is the sum of the named base components, then every named
/// modifier applied in insertion order. The resolved score is never
/// negative. A score that resolves to zero means "ineligible": once zero,
/// further modifiers are neither applied nor recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingScore {
    bases: Vec<(String, f64)>,
    modifiers: Vec<(String, ScoreModifier)>,
}

impl RatingScore {
    /// The ineligible sentinel.
    pub const ZERO: RatingScore = RatingScore {
        bases: Vec::new(),
        modifiers: Vec::new(),
    };

    /// A score with a single base component named `base`.
    pub fn new(base: f64) -> Self {
        Self {
            bases: vec![("base".to_string(), base.max(0.0))],
            modifiers: Vec::new(),
        }
    }

    /// Add (or replace) a named base component. Negative values count as
    /// zero. Ignored once the score is zero, like every other adjustment.
    pub fn add_base(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        if self.is_zero() {
            return self;
        }
        let name = name.into();
        let value = value.max(0.0);
        match self.bases.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.bases.push((name, value)),
        }
        self
    }

    /// Apply a named multiplicative factor. Ignored once the score is zero.
    pub fn add_modifier(&mut self, name: impl Into<String>, factor: f64) -> &mut Self {
        self.push_modifier(name.into(), ScoreModifier::Factor(factor.max(0.0)))
    }

    /// Apply a named additive bonus (may be negative). Ignored once the score is zero.
    pub fn add_bonus(&mut self, name: impl Into<String>, amount: f64) -> &mut Self {
        self.push_modifier(name.into(), ScoreModifier::Bonus(amount))
    }

    fn push_modifier(&mut self, name: String, modifier: ScoreModifier) -> &mut Self {
        if self.is_zero() {
            return self;
        }
        match self.modifiers.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = modifier,
            None => self.modifiers.push((name, modifier)),
        }
        self
    }

    pub fn base(&self) -> f64 {
        self.bases.iter().map(|(_, v)| v).sum()
    }

    pub fn bases(&self) -> &[(String, f64)] {
        &self.bases
    }

    pub fn modifiers(&self) -> &[(String, ScoreModifier)] {
        &self.modifiers
    }

    /// Look up a recorded modifier by name.
    pub fn modifier(&self, name: &str) -> Option<ScoreModifier> {
        self.modifiers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| *m)
    }

    /// The resolved, non-negative score.
    pub fn score(&self) -> f64 {
        let mut value = self.base();
        for (_, modifier) in &self.modifiers {
            if value <= 0.0 {
                return 0.0;
            }
            value = match modifier {
                ScoreModifier::Factor(f) => value * f,
                ScoreModifier::Bonus(b) => value + b,
            };
        }
        if value.is_finite() { value.max(0.0) } else { 0.0 }
    }

    pub fn is_zero(&self) -> bool {
        self.score() <= 0.0
    }

    /// Total order on resolved scores.
    pub fn cmp_score(&self, other: &RatingScore) -> Ordering {
        self.score().total_cmp(&other.score())
    }
}

impl PartialOrd for RatingScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_score(other))
    }
}

impl fmt::Display for RatingScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.score())?;
        if self.bases.is_empty() && self.modifiers.is_empty() {
            return Ok(());
        }
        let bases: Vec<String> = self
            .bases
            .iter()
            .map(|(n, v)| format!("{n}={v:.2}"))
            .collect();
        let modifiers: Vec<String> = self
            .modifiers
            .iter()
            .map(|(n, m)| match m {
                ScoreModifier::Factor(v) => format!("{n} x{v:.2}"),
                ScoreModifier::Bonus(v) => format!("{n} {v:+.2}"),
            })
            .collect();
        write!(f, " (base: {}; {})", bases.join(", "), modifiers.join(", "))
    }
}
