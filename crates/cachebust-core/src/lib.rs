//! # cachebust-core
//!
//! Prepends a build stamp comment to a text file so that content-hashing
//! bundlers see a new artifact on every build.
//!
//! The output is the input, byte for byte, behind one extra line:
//!
//! ```text
//! /* BUILD_VERSION: 1700000000 */
//! <original content>
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cachebust_config::path::is_same_file;
use cachebust_config::{log_bust_debug, validate_label};
use thiserror::Error;

pub mod stamp;

pub use stamp::{BuildStamp, Clock, FixedClock, SystemClock, DEFAULT_LABEL};

#[derive(Error, Debug)]
pub enum BustError {
    #[error("{0}")]
    Label(String),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BustError>;

/// What a successful [`CacheBuster::apply`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BustReport {
    pub stamp: BuildStamp,
    pub input: PathBuf,
    pub output: PathBuf,
    pub bytes_written: usize,
}

impl fmt::Display for BustReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "✓ Cache-bust added: {}", self.stamp)?;
        writeln!(f, "  Input:  {}", self.input.display())?;
        write!(f, "  Output: {}", self.output.display())
    }
}

/// Stamps files using a [`Clock`] and a comment label.
#[derive(Debug, Clone)]
pub struct CacheBuster<C = SystemClock> {
    clock: C,
    label: String,
}

impl CacheBuster<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for CacheBuster<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> CacheBuster<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            label: DEFAULT_LABEL.to_string(),
        }
    }

    /// Override the label inside the comment (`BUILD_VERSION` by default).
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Read `input` whole, then write the stamp line and the original
    /// content to `output`, truncating it.
    ///
    /// The read handle is closed before `output` is opened, so `input` and
    /// `output` may name the same file. A failure while writing can leave
    /// `output` truncated. A label that cannot sit in a one-line comment is
    /// rejected before either file is touched.
    pub fn apply(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<BustReport> {
        let input = input.as_ref();
        let output = output.as_ref();
        validate_label(&self.label).map_err(BustError::Label)?;
        let stamp = self.clock.now();

        let content = std::fs::read_to_string(input).map_err(|source| BustError::Read {
            path: input.to_path_buf(),
            source,
        })?;

        log_bust_debug!(
            "Read input",
            path = tracing::field::display(input.display()),
            bytes = content.len(),
            already_stamped = strip_stamp(&content).is_some(),
        );

        if is_same_file(input, output) {
            log_bust_debug!(
                "Rewriting in place",
                path = tracing::field::display(output.display())
            );
        }

        let stamped = stamp_content(stamp, &self.label, &content);
        write_output(output, stamped.as_bytes()).map_err(|source| BustError::Write {
            path: output.to_path_buf(),
            source,
        })?;

        log_bust_debug!(
            "Wrote output",
            path = tracing::field::display(output.display()),
            stamp = stamp.as_secs(),
            bytes = stamped.len(),
        );

        Ok(BustReport {
            stamp,
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            bytes_written: stamped.len(),
        })
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()
}

/// The stamp comment line followed by `content`, unchanged.
pub fn stamp_content(stamp: BuildStamp, label: &str, content: &str) -> String {
    let line = stamp.comment_line(label);
    let mut out = String::with_capacity(line.len() + content.len());
    out.push_str(&line);
    out.push_str(content);
    out
}

/// Split a leading stamp line off `text`.
///
/// Returns the stamp and everything after the line terminator, or `None`
/// when the first line is not of the form `/* <label>: <secs> */`.
pub fn strip_stamp(text: &str) -> Option<(BuildStamp, &str)> {
    let (line, rest) = text.split_once('\n')?;
    let inner = line.strip_prefix("/* ")?.strip_suffix(" */")?;
    let (label, secs) = inner.rsplit_once(": ")?;
    if label.is_empty() || secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let secs = secs.parse().ok()?;
    Some((BuildStamp::from_secs(secs), rest))
}
