//! Stack growth for the recursive parser and evaluator.
//!
//! Deeply nested expressions and deep (but finite) script recursion would
//! otherwise overflow the host stack before the script gets a chance to
//! finish.

/// Grow the stack if less than this remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
