use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::task::{Category, Priority};

const DAY_MS: i64 = 86_400_000;

/// How often a recurring template spawns a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    /// Fixed 30-day interval, not calendar months
    Monthly,
}

impl Frequency {
    /// Interval in milliseconds
    pub fn interval_ms(self) -> i64 {
        match self {
            Frequency::Daily => DAY_MS,
            Frequency::Weekly => 7 * DAY_MS,
            Frequency::Monthly => 30 * DAY_MS,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(format!(
                "unknown frequency '{}' (expected: daily, weekly, monthly)",
                s
            )),
        }
    }
}

/// Template for a task that is re-created on a fixed interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTask {
    pub text: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    pub frequency: Frequency,
    /// When a task was last spawned from this template (ms since epoch)
    pub last_created: i64,
}

impl RecurringTask {
    /// Whether the template should spawn a task at `now`
    pub fn is_due(&self, now: i64) -> bool {
        now - self.last_created >= self.frequency.interval_ms()
    }
}
