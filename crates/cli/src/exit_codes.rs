//! CLI Exit Code Registry
//!
//! Single source of truth for all exit codes. Exit codes are part of the
//! shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3       | Universal        | Local I/O error                          |
//! | 10-19   | auth             | Credential / login codes                 |
//! | 20-29   | api              | Backend request codes                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Local I/O error (cannot read input file, cannot write output).
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Auth (10-19)
// =============================================================================

/// No saved credentials (run `reconsole login` first).
pub const EXIT_NOT_AUTH: u8 = 10;

/// Credentials rejected by the backend (401/403).
pub const EXIT_AUTH_REJECTED: u8 = 11;

// =============================================================================
// API (20-29)
// =============================================================================

/// Network failure reaching the backend (after retries, for reads).
pub const EXIT_API_NETWORK: u8 = 20;

/// Backend returned an HTTP error status.
pub const EXIT_API_HTTP: u8 = 21;

/// Backend rejected the request as invalid (400/422).
pub const EXIT_API_VALIDATION: u8 = 22;

/// Backend response could not be parsed.
pub const EXIT_API_PARSE: u8 = 23;
