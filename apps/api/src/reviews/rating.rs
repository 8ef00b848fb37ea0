//! Employer rating aggregation over approved reviews: arithmetic mean, review
//! count, and a five-bucket star histogram with percentages.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBucket {
    pub stars: i16,
    pub count: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    /// Arithmetic mean of approved ratings; 0.0 sentinel when there are none.
    pub average: f64,
    pub count: i64,
    /// Buckets in display order: 5 stars first, 1 star last.
    pub histogram: Vec<RatingBucket>,
}

/// Aggregates raw ratings (each 1..=5). Out-of-range values cannot occur —
/// the schema carries a range check — but are ignored here rather than
/// panicking. Zero reviews yields average 0.0 and 0% buckets, never a
/// division error.
pub fn aggregate_ratings(ratings: &[i16]) -> RatingSummary {
    let mut counts = [0i64; 5];
    let mut sum = 0i64;
    let mut total = 0i64;

    for &r in ratings {
        if (1..=5).contains(&r) {
            counts[(r - 1) as usize] += 1;
            sum += i64::from(r);
            total += 1;
        }
    }

    let average = if total == 0 {
        0.0
    } else {
        sum as f64 / total as f64
    };

    let histogram = (1..=5i16)
        .rev()
        .map(|stars| {
            let count = counts[(stars - 1) as usize];
            let percent = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            RatingBucket {
                stars,
                count,
                percent,
            }
        })
        .collect();

    RatingSummary {
        average,
        count: total,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_reviews_sentinel() {
        let summary = aggregate_ratings(&[]);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.count, 0);
        assert!(summary.histogram.iter().all(|b| b.count == 0 && b.percent == 0.0));
    }

    #[test]
    fn test_mean_of_mixed_ratings() {
        let summary = aggregate_ratings(&[5, 4, 4, 3]);
        assert_eq!(summary.count, 4);
        assert!((summary.average - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_histogram_order_and_percentages() {
        let summary = aggregate_ratings(&[5, 5, 5, 1]);
        assert_eq!(summary.histogram[0].stars, 5);
        assert_eq!(summary.histogram[4].stars, 1);
        assert_eq!(summary.histogram[0].count, 3);
        assert!((summary.histogram[0].percent - 75.0).abs() < f64::EPSILON);
        assert!((summary.histogram[4].percent - 25.0).abs() < f64::EPSILON);
        assert_eq!(summary.histogram[1].count, 0);
        assert_eq!(summary.histogram[1].percent, 0.0);
    }

    #[test]
    fn test_out_of_range_values_ignored() {
        let summary = aggregate_ratings(&[0, 6, 3]);
        assert_eq!(summary.count, 1);
        assert!((summary.average - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_single_review() {
        let summary = aggregate_ratings(&[2]);
        assert_eq!(summary.count, 1);
        assert!((summary.average - 2.0).abs() < f64::EPSILON);
        let two_star = summary.histogram.iter().find(|b| b.stars == 2).unwrap();
        assert!((two_star.percent - 100.0).abs() < f64::EPSILON);
    }
}
