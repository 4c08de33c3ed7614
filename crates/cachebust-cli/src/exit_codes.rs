//! Exit codes for the `cache-bust` binary.
//! Build scripts test only for zero versus non-zero.

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1; // Wrong argument count, or any read/write error
