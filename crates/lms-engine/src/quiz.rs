//! Quiz grading.

/// Minimum score (percent) for a passing attempt. Grading and analytics
/// both read this constant.
pub const PASS_THRESHOLD: i32 = 70;

/// Score an attempt as a whole-number percentage.
pub fn score(correct: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as i32
}

/// Whether a score passes.
pub const fn passed(score: i32) -> bool {
    score >= PASS_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_rounds_to_nearest_percent() {
        assert_eq!(score(2, 3), 67);
        assert_eq!(score(1, 3), 33);
        assert_eq!(score(3, 3), 100);
        assert_eq!(score(0, 0), 0);
    }

    #[test]
    fn test_pass_threshold_is_inclusive() {
        assert!(passed(70));
        assert!(passed(100));
        assert!(!passed(69));
        // 7 of 10 passes, 2 of 3 does not
        assert!(passed(score(7, 10)));
        assert!(!passed(score(2, 3)));
    }
}
