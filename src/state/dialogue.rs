pub const AUTO_ADVANCE_MIN_MS: u64 = 1800;
pub const AUTO_ADVANCE_MAX_MS: u64 = 6000;
const BASE_MS: u64 = 1200;
const PER_CHAR_MS: u64 = 55;

/// How long a dialogue line stays up before advancing on its own.
pub fn dialogue_auto_advance(line: &str) -> u64 {
    let chars = line.chars().count() as u64;
    BASE_MS
        .saturating_add(chars.saturating_mul(PER_CHAR_MS))
        .clamp(AUTO_ADVANCE_MIN_MS, AUTO_ADVANCE_MAX_MS)
}
