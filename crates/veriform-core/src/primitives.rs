//! # Engine Primitives
//!
//! Hardcoded limits and defaults for the Veriform engine.
//!
//! These values are compiled into the binary. Configuration may choose a
//! different default timeout, but never exceed the hard bounds below.

/// Default solve time bound in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Smallest accepted time bound. Requests below it are raised to it.
pub const MIN_TIMEOUT_MS: u64 = 1;

/// Largest accepted time bound (10 minutes). Requests above it are clamped.
pub const MAX_TIMEOUT_MS: u64 = 600_000;

// =============================================================================
// MODEL LIMITS
// =============================================================================

/// Maximum number of items in one model.
pub const MAX_MODEL_ITEMS: usize = 10_000;

/// Maximum length of an item's source text, in bytes.
pub const MAX_ITEM_SOURCE_LENGTH: usize = 4096;

/// Maximum nesting depth of an expression.
///
/// Bounds the recursive-descent parser so adversarial input cannot exhaust the stack.
pub const MAX_EXPRESSION_DEPTH: usize = 64;

/// Maximum number of digits in a numeric literal.
pub const MAX_NUMBER_DIGITS: usize = 64;

// =============================================================================
// EXTRACTION LIMITS
// =============================================================================

/// Maximum length of criteria text scanned by the extractor, in bytes.
///
/// Anything past this point is reported as a skipped fragment.
pub const MAX_CRITERIA_LENGTH: usize = 16 * 1024;

/// Fallback subject when a clause names none and nothing can be inherited.
pub const DEFAULT_SUBJECT: &str = "value";

// =============================================================================
// BACKEND NAMES
// =============================================================================

/// Name of the external SMT-LIB process backend.
pub const SMTLIB_BACKEND: &str = "smtlib";

/// Name of the built-in bounds-consistency backend.
pub const INTERVAL_BACKEND: &str = "interval";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_bounds_are_ordered() {
        assert!(MIN_TIMEOUT_MS <= DEFAULT_TIMEOUT_MS);
        assert!(DEFAULT_TIMEOUT_MS <= MAX_TIMEOUT_MS);
    }
}
