//! Build stamps and the clocks that produce them.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Label used in the stamp comment unless configured otherwise.
pub const DEFAULT_LABEL: &str = "BUILD_VERSION";

/// Seconds since the UNIX epoch, captured once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildStamp(u64);

impl BuildStamp {
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// Render the leading comment line, terminator included.
    ///
    /// ```ignore
    /// let line = BuildStamp::from_secs(1700000000).comment_line("BUILD_VERSION");
    /// assert_eq!(line, "/* BUILD_VERSION: 1700000000 */\n");
    /// ```
    pub fn comment_line(self, label: &str) -> String {
        format!("/* {}: {} */\n", label, self.0)
    }
}

impl fmt::Display for BuildStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of the current stamp.
pub trait Clock {
    fn now(&self) -> BuildStamp;
}

/// Wall clock, UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> BuildStamp {
        // A clock set before 1970 clamps to zero
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        BuildStamp(secs)
    }
}

/// Always returns the same stamp. Used for reproducible output and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub BuildStamp);

impl Clock for FixedClock {
    fn now(&self) -> BuildStamp {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> BuildStamp {
        (**self).now()
    }
}
