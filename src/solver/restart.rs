//! Restart schedules.
//!
//! The strategy is chosen on the command line and handed to the search engine
//! unmodified. Names follow clasp's `--restarts` syntax, with long aliases:
//!
//! | Short           | Long                      | Meaning                                   |
//! |-----------------|---------------------------|-------------------------------------------|
//! | `no`            | `none`                    | never restart                             |
//! | `F,<n>`         | `fixed,<n>`               | restart every `n` conflicts               |
//! | `L,<n>`         | `luby,<n>`                | Luby sequence scaled by `n`               |
//! | `x,<n>,<f>`     | `geometric,<n>,<f>`       | `n`, `n*f`, `n*f^2`, ... conflicts        |

use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ConfigError;

/// When the engine should abandon its current path and restart from the root.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RestartStrategy {
    #[default]
    None,
    Fixed(u64),
    Luby(u64),
    Geometric { base: u64, factor: f64 },
}

impl FromStr for RestartStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ConfigError::UnknownRestartStrategy { name: s.to_string() };
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let int = |i: usize| -> Result<u64, ConfigError> {
            parts
                .get(i)
                .and_then(|p| p.parse::<u64>().ok())
                .filter(|&n| n > 0)
                .ok_or_else(unknown)
        };

        match parts[0].to_ascii_lowercase().as_str() {
            "no" | "none" if parts.len() == 1 => Ok(Self::None),
            "f" | "fixed" if parts.len() == 2 => Ok(Self::Fixed(int(1)?)),
            "l" | "luby" if parts.len() == 2 => Ok(Self::Luby(int(1)?)),
            "x" | "geometric" if parts.len() == 3 => {
                let factor = parts[2]
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 1.0)
                    .ok_or_else(unknown)?;
                Ok(Self::Geometric {
                    base: int(1)?,
                    factor,
                })
            }
            _ => Err(unknown()),
        }
    }
}

impl std::fmt::Display for RestartStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "no"),
            Self::Fixed(n) => write!(f, "F,{n}"),
            Self::Luby(n) => write!(f, "L,{n}"),
            Self::Geometric { base, factor } => write!(f, "x,{base},{factor}"),
        }
    }
}

impl Serialize for RestartStrategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The `i`-th element (1-based) of the Luby sequence 1 1 2 1 1 2 4 ...
pub fn luby(i: u64) -> u64 {
    let mut i = i;
    loop {
        // Smallest k with 2^k - 1 >= i.
        let mut k = 1u32;
        while (1u64 << k) - 1 < i {
            k += 1;
        }
        if (1u64 << k) - 1 == i {
            return 1u64 << (k - 1);
        }
        i -= (1u64 << (k - 1)) - 1;
    }
}

/// Conflict counter driving a [`RestartStrategy`].
#[derive(Debug, Clone)]
pub struct RestartSchedule {
    strategy: RestartStrategy,
    conflicts: u64,
    restarts: u64,
    limit: Option<u64>,
}

impl RestartSchedule {
    pub fn new(strategy: RestartStrategy) -> Self {
        let mut schedule = Self {
            strategy,
            conflicts: 0,
            restarts: 0,
            limit: None,
        };
        schedule.limit = schedule.next_limit();
        schedule
    }

    fn next_limit(&self) -> Option<u64> {
        match self.strategy {
            RestartStrategy::None => None,
            RestartStrategy::Fixed(n) => Some(n),
            RestartStrategy::Luby(n) => Some(n.saturating_mul(luby(self.restarts + 1))),
            RestartStrategy::Geometric { base, factor } => {
                let scaled = base as f64 * factor.powi(self.restarts.min(i32::MAX as u64) as i32);
                Some(scaled.min(u64::MAX as f64) as u64)
            }
        }
    }

    /// Record a conflict; returns `true` when a restart is due.
    pub fn on_conflict(&mut self) -> bool {
        self.conflicts += 1;
        match self.limit {
            Some(limit) if self.conflicts >= limit => {
                self.conflicts = 0;
                self.restarts += 1;
                self.limit = self.next_limit();
                true
            }
            _ => false,
        }
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }
}
