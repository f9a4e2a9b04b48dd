//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `moa` exit codes.
//! Scripts rely on them, so a code never changes meaning once assigned.
//!
//! # Exit Codes
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success                                               |
//! | 1    | General error (a command's action failed)             |
//! | 2    | Usage error (bad arguments, unknown category, etc.)   |
//! | 3    | Unknown module (no built-in layout with that id)      |
//! | 4    | Unknown command id                                    |
//! | 5    | Invalid layout file                                   |
//! | 6    | State directory unusable                              |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant with the next free number
//! 2. Document what triggers it
//! 3. Update the table above

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - a command's callback failed or panicked.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing file, unknown navigation id.
pub const EXIT_USAGE: u8 = 2;

/// No built-in layout for the requested module.
pub const EXIT_UNKNOWN_MODULE: u8 = 3;

/// The command id is not registered in the module.
pub const EXIT_UNKNOWN_COMMAND: u8 = 4;

/// A `--layout` file failed to parse or validate.
pub const EXIT_INVALID_LAYOUT: u8 = 5;

/// The state directory could not be created or written.
pub const EXIT_STORAGE: u8 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_UNKNOWN_MODULE,
            EXIT_UNKNOWN_COMMAND,
            EXIT_INVALID_LAYOUT,
            EXIT_STORAGE,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
