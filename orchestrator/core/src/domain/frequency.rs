// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # FrequencySpec
//!
//! Parses cadence strings of the exact form `every <count> <unit>` where
//! `<count>` is a positive integer and `<unit>` is one of `seconds`,
//! `minutes` or `hours`. Anything else is rejected with
//! [`FrequencyError::InvalidFrequencyFormat`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrequencyError {
    #[error("invalid frequency '{0}': expected 'every <number> (seconds|minutes|hours)'")]
    InvalidFrequencyFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnit {
    Seconds,
    Minutes,
    Hours,
}

impl FrequencyUnit {
    fn seconds(self) -> u64 {
        match self {
            FrequencyUnit::Seconds => 1,
            FrequencyUnit::Minutes => 60,
            FrequencyUnit::Hours => 3600,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            FrequencyUnit::Seconds => "seconds",
            FrequencyUnit::Minutes => "minutes",
            FrequencyUnit::Hours => "hours",
        }
    }
}

/// Parsed cadence: `count` repetitions of `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrequencySpec {
    count: u64,
    unit: FrequencyUnit,
}

impl FrequencySpec {
    pub fn parse(text: &str) -> Result<Self, FrequencyError> {
        let invalid = || FrequencyError::InvalidFrequencyFormat(text.to_string());

        let tokens: Vec<&str> = text.split(' ').collect();
        let [keyword, count, unit] = tokens.as_slice() else {
            return Err(invalid());
        };

        if *keyword != "every" {
            return Err(invalid());
        }

        // Digits only: rejects signs, fractions and whitespace that `parse` would tolerate.
        if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let count: u64 = count.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }

        let unit = match *unit {
            "seconds" => FrequencyUnit::Seconds,
            "minutes" => FrequencyUnit::Minutes,
            "hours" => FrequencyUnit::Hours,
            _ => return Err(invalid()),
        };

        count.checked_mul(unit.seconds()).ok_or_else(invalid)?;

        Ok(Self { count, unit })
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn unit(&self) -> FrequencyUnit {
        self.unit
    }

    /// Interval between two consecutive ticks.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.count * self.unit.seconds())
    }
}

impl FromStr for FrequencySpec {
    type Err = FrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FrequencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every {} {}", self.count, self.unit.as_str())
    }
}
