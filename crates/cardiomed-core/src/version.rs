//! Dotted numeric version tuples as used by the clinic's version
//! requirements table.
//!
//! Ordering pads the shorter tuple with zeros, so `1.2`, `1.2.0` and
//! `1.2.0.0` are the same version.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use log::warn;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("version string is empty")]
    Empty,
    #[error("invalid component {component:?} at position {position} in {input:?}")]
    InvalidComponent {
        input: String,
        position: usize,
        component: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct VersionTuple {
    components: Vec<u64>,
}

impl VersionTuple {
    #[must_use]
    pub fn new(components: Vec<u64>) -> Self {
        Self { components }
    }

    /// Parse without failing: any component that is not a base-10 unsigned
    /// integer (including an empty one) counts as `0`. Digit runs too large
    /// for a `u64` saturate to `u64::MAX`, so they still order above every
    /// representable component.
    #[must_use]
    pub fn parse_lenient(input: &str) -> Self {
        let trimmed = strip_prefix(input);
        if trimmed.is_empty() {
            return Self::default();
        }

        let components = trimmed
            .split('.')
            .enumerate()
            .map(|(position, part)| lenient_component(input, position, part.trim()))
            .collect();
        Self { components }
    }

    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    fn significant(&self) -> &[u64] {
        let len = self
            .components
            .iter()
            .rposition(|&c| c != 0)
            .map_or(0, |idx| idx + 1);
        &self.components[..len]
    }
}

fn lenient_component(input: &str, position: usize, part: &str) -> u64 {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        warn!("Version {input:?}: component {position} ({part:?}) is not numeric, using 0");
        return 0;
    }
    part.parse::<u64>().unwrap_or_else(|_| {
        warn!("Version {input:?}: component {position} ({part:?}) overflows, using u64::MAX");
        u64::MAX
    })
}

fn strip_prefix(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed)
}

impl FromStr for VersionTuple {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = strip_prefix(s);
        if trimmed.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let components = trimmed
            .split('.')
            .enumerate()
            .map(|(position, part)| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(VersionParseError::InvalidComponent {
                        input: s.to_string(),
                        position,
                        component: part.to_string(),
                    });
                }
                part.parse::<u64>()
                    .map_err(|_| VersionParseError::InvalidComponent {
                        input: s.to_string(),
                        position,
                        component: part.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { components })
    }
}

impl Ord for VersionTuple {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for idx in 0..len {
            let ours = self.components.get(idx).copied().unwrap_or(0);
            let theirs = other.components.get(idx).copied().unwrap_or(0);
            match ours.cmp(&theirs) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for VersionTuple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionTuple {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionTuple {}

impl Hash for VersionTuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("0");
        }
        for (idx, component) in self.components.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

/// Whether `current` satisfies `required`, i.e. `current >= required`.
#[must_use]
pub fn is_up_to_date(current: &str, required: &str) -> bool {
    VersionTuple::parse_lenient(current) >= VersionTuple::parse_lenient(required)
}
