use crate::models::ScoreOutcome;

pub const PASS_THRESHOLD: f64 = 60.0;

const TEST_WEIGHT: f64 = 0.5;
const ATTENDANCE_WEIGHT: f64 = 0.3;
const HOMEWORK_WEIGHT: f64 = 0.2;

pub fn weighted_percentage(attendance: f64, homework_completion: f64, test_scores: f64) -> f64 {
    // Summation order is fixed so results stay bit-identical across callers.
    (test_scores * TEST_WEIGHT)
        + (attendance * ATTENDANCE_WEIGHT)
        + (homework_completion * HOMEWORK_WEIGHT)
}

/// Scores one student. Inputs are not range checked; values outside 0..=100
/// flow through the arithmetic as-is.
pub fn score(attendance: f64, homework_completion: f64, test_scores: f64) -> ScoreOutcome {
    let percentage = weighted_percentage(attendance, homework_completion, test_scores);

    ScoreOutcome {
        prediction: percentage > PASS_THRESHOLD,
        probability: round2(percentage),
    }
}

/// Rounds to two decimals, half to even on the exact binary value.
///
/// `{:.2}` formatting is correctly rounded, so 77.005 (stored as 77.00499...)
/// becomes 77.0 rather than 77.01.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    format!("{value:.2}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn good_student_scores_above_threshold() {
        let outcome = score(80.0, 90.0, 70.0);
        assert!(outcome.prediction);
        assert_eq!(outcome.probability, 77.0);
    }

    #[test]
    fn weak_student_scores_below_threshold() {
        let outcome = score(40.0, 50.0, 55.0);
        assert!(!outcome.prediction);
        assert_eq!(outcome.probability, 49.5);
    }

    #[test]
    fn exactly_sixty_is_not_a_pass() {
        let cases = [(60.0, 60.0, 60.0), (100.0, 0.0, 60.0), (0.0, 0.0, 120.0)];
        for (attendance, homework, tests) in cases {
            let outcome = score(attendance, homework, tests);
            assert_eq!(outcome.probability, 60.0);
            assert!(!outcome.prediction);
        }
    }

    #[test]
    fn weights_follow_formula() {
        for attendance in [0.0, 12.5, 50.0, 99.0, 100.0] {
            for homework in [0.0, 33.0, 70.0, 100.0] {
                for tests in [0.0, 41.5, 88.0, 100.0] {
                    let expected = 0.5 * tests + 0.3 * attendance + 0.2 * homework;
                    let actual = weighted_percentage(attendance, homework, tests);
                    assert!((actual - expected).abs() < 1e-9);
                    assert_eq!(score(attendance, homework, tests).prediction, actual > 60.0);
                }
            }
        }
    }

    #[test]
    fn scoring_is_idempotent() {
        let first = score(85.5, 72.25, 90.1);
        let second = score(85.5, 72.25, 90.1);
        assert_eq!(first, second);
        assert_eq!(first.probability, 85.15);
    }

    #[test]
    fn rounds_on_binary_value() {
        assert_eq!(round2(77.005), 77.0);
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(85.14999999999999), 85.15);
        assert_eq!(round2(56.6400000000001), 56.64);
    }

    #[test]
    fn out_of_range_inputs_pass_through() {
        let outcome = score(150.0, 100.0, 100.0);
        assert!(outcome.prediction);
        assert_eq!(outcome.probability, 115.0);

        let negative = score(-10.0, 0.0, 0.0);
        assert!(!negative.prediction);
        assert_eq!(negative.probability, -3.0);
    }
}
