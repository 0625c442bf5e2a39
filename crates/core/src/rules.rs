//
// ─── REWARD POLICY ─────────────────────────────────────────────────────────────
//

/// XP needed to climb one level. Thresholds are uniform, no scaling curve.
pub const XP_PER_LEVEL: u64 = 200;

/// XP granted every time a lesson is marked complete.
pub const LESSON_COMPLETION_XP: u64 = 50;

/// XP granted for a perfect quiz; partial scores earn a proportional share.
pub const QUIZ_MAX_XP: f64 = 30.0;

/// Number of completed lessons that unlocks the `q-five` quest.
pub const FIVE_LESSONS_THRESHOLD: usize = 5;

//
// ─── LEVELS ────────────────────────────────────────────────────────────────────
//

/// Level for a given XP total: `floor(xp / 200) + 1`.
///
/// # Examples
///
/// ```
/// # use academy_core::rules::level_for_xp;
/// assert_eq!(level_for_xp(0), 1);
/// assert_eq!(level_for_xp(199), 1);
/// assert_eq!(level_for_xp(200), 2);
/// ```
#[must_use]
pub fn level_for_xp(xp: u64) -> u32 {
    u32::try_from(xp / XP_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// Whole XP points for a raw award amount.
///
/// Amounts are floored; negative, NaN and infinite inputs award nothing.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn whole_xp(amount: f64) -> u64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    amount.floor() as u64
}

/// Quiz reward before flooring: `30 * score / total`.
///
/// An empty quiz earns nothing.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn quiz_reward(score: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    QUIZ_MAX_XP * (score as f64 / total as f64)
}
