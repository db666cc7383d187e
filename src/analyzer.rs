use crate::models::{InputError, ProbabilityRow};

/// Computes allotment probabilities for a lottery-based IPO allocation.
///
/// With an oversubscription factor `s >= 1`, a single application misses out
/// with probability `1 - 1/s`; applications are treated as independent, so
/// `n` of them all miss with probability `(1 - 1/s)^n`.
pub struct AllotmentAnalyzer {
    subscription_factor: f64,
}

impl AllotmentAnalyzer {
    pub fn new(subscription_factor: f64) -> Self {
        Self {
            subscription_factor,
        }
    }

    /// Produce one row per application count from 1 to `max_applications`.
    pub fn calculate_probabilities(
        &self,
        max_applications: u32,
    ) -> Result<Vec<ProbabilityRow>, InputError> {
        if !self.subscription_factor.is_finite() || self.subscription_factor < 0.0 {
            return Err(InputError::OutOfRange {
                field: "oversubscription factor",
                reason: "must be a non-negative number",
            });
        }
        if max_applications == 0 {
            return Err(InputError::OutOfRange {
                field: "maximum applications",
                reason: "must be a positive integer",
            });
        }

        let mut rows = Vec::with_capacity(max_applications as usize);

        if self.subscription_factor < 1.0 {
            // Undersubscribed issues fill every application, so the
            // percentages are fixed rather than derived from the factor.
            for applications in 1..=max_applications {
                rows.push(ProbabilityRow {
                    applications,
                    no_allotment_pct: 0.0,
                    at_least_one_pct: 100.0,
                });
            }
        } else {
            let miss_probability = 1.0 - (1.0 / self.subscription_factor);

            for applications in 1..=max_applications {
                let all_miss = miss_probability.powi(applications as i32);
                rows.push(ProbabilityRow {
                    applications,
                    no_allotment_pct: round2(all_miss * 100.0),
                    at_least_one_pct: round2((1.0 - all_miss) * 100.0),
                });
            }
        }

        Ok(rows)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    #[test]
    fn ten_x_single_application() {
        let rows = AllotmentAnalyzer::new(10.0).calculate_probabilities(1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].applications, 1);
        assert_float_absolute_eq!(rows[0].no_allotment_pct, 90.0, 1e-9);
        assert_float_absolute_eq!(rows[0].at_least_one_pct, 10.0, 1e-9);
    }

    #[test]
    fn ten_x_second_application() {
        let rows = AllotmentAnalyzer::new(10.0).calculate_probabilities(2).unwrap();
        assert_eq!(rows[1].applications, 2);
        assert_float_absolute_eq!(rows[1].no_allotment_pct, 81.0, 1e-9);
        assert_float_absolute_eq!(rows[1].at_least_one_pct, 19.0, 1e-9);
    }

    #[test]
    fn four_x_fifth_application_rounds_to_two_decimals() {
        let rows = AllotmentAnalyzer::new(4.0).calculate_probabilities(5).unwrap();
        assert_float_absolute_eq!(rows[4].no_allotment_pct, 23.73, 1e-9);
        assert_float_absolute_eq!(rows[4].at_least_one_pct, 76.27, 1e-9);
    }

    #[test]
    fn rows_sum_to_one_hundred() {
        for factor in [1.0, 1.5, 3.7, 10.0, 250.0] {
            let rows = AllotmentAnalyzer::new(factor).calculate_probabilities(25).unwrap();
            for row in rows {
                assert_float_absolute_eq!(
                    row.no_allotment_pct + row.at_least_one_pct,
                    100.0,
                    0.01
                );
            }
        }
    }

    #[test]
    fn probabilities_are_monotonic_in_application_count() {
        let rows = AllotmentAnalyzer::new(3.7).calculate_probabilities(40).unwrap();
        for pair in rows.windows(2) {
            assert!(pair[1].no_allotment_pct <= pair[0].no_allotment_pct);
            assert!(pair[1].at_least_one_pct >= pair[0].at_least_one_pct);
        }
    }

    #[test]
    fn undersubscribed_issue_is_always_allotted() {
        let rows = AllotmentAnalyzer::new(0.5).calculate_probabilities(3).unwrap();
        assert_eq!(rows.len(), 3);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.applications, i as u32 + 1);
            assert_eq!(row.no_allotment_pct, 0.0);
            assert_eq!(row.at_least_one_pct, 100.0);
        }
    }

    #[test]
    fn exactly_subscribed_issue_is_always_allotted() {
        // factor 1 gives a zero miss probability through the general formula
        let rows = AllotmentAnalyzer::new(1.0).calculate_probabilities(4).unwrap();
        for row in rows {
            assert_eq!(row.no_allotment_pct, 0.0);
            assert_eq!(row.at_least_one_pct, 100.0);
        }
    }

    #[test]
    fn zero_applications_is_rejected() {
        let err = AllotmentAnalyzer::new(10.0).calculate_probabilities(0).unwrap_err();
        assert!(matches!(err, InputError::OutOfRange { .. }));
    }

    #[test]
    fn invalid_factor_is_rejected() {
        for factor in [-0.5, f64::NAN, f64::INFINITY] {
            let err = AllotmentAnalyzer::new(factor).calculate_probabilities(5).unwrap_err();
            assert!(matches!(err, InputError::OutOfRange { .. }));
        }
    }

    #[test]
    fn table_covers_counts_in_ascending_order() {
        let rows = AllotmentAnalyzer::new(7.0).calculate_probabilities(12).unwrap();
        let counts: Vec<u32> = rows.iter().map(|row| row.applications).collect();
        assert_eq!(counts, (1..=12).collect::<Vec<u32>>());
    }
}
