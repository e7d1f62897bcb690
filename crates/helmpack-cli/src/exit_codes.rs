//! Exit codes of the `helmpack` binary

/// Success - operation completed, possibly with per-item warnings
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Chart error - source unreachable, unsupported or missing `Chart.yaml`
pub const CHART_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Bundle error - malformed bundle archive or manifest
pub const BUNDLE_ERROR: i32 = 6;

/// Registry error - credentials, connectivity or TLS
pub const REGISTRY_ERROR: i32 = 7;
