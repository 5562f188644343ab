//! Deterministic fallback colors for calendars.
//!
//! Some providers do not return a color for every calendar (Microsoft
//! Graph reports `"auto"` or nothing unless the user picked one). The
//! adapter assigns one from this palette, keyed by the calendar's
//! position in the listing, so the same listing always yields the same
//! colors.

/// The fallback palette, cycled by index.
pub const PALETTE: [&str; 10] = [
    "#7986cb", "#33b679", "#8e24aa", "#e67c73", "#f6bf26", "#f4511e", "#039be5", "#616161",
    "#3f51b5", "#0b8043",
];

/// Returns the fallback color for a zero-based calendar index.
///
/// Pure and cyclic: the same index always yields the same color, and
/// indices wrap around the palette.
pub fn fallback_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}
