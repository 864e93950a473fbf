//! Derived review ratings.

use std::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Count and sum of an item's review ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RatingSummary {
    review_count: u64,
    rating_total: u64,
}

impl RatingSummary {
    /// Summary of an item nobody has reviewed.
    pub const EMPTY: Self = Self {
        review_count: 0,
        rating_total: 0,
    };

    /// Build a summary from aggregate values.
    #[must_use]
    pub const fn new(review_count: u64, rating_total: u64) -> Self {
        Self {
            review_count,
            rating_total,
        }
    }

    /// Fold individual ratings into a summary.
    pub fn from_ratings(ratings: impl IntoIterator<Item = u8>) -> Self {
        ratings.into_iter().fold(Self::EMPTY, |summary, rating| {
            Self::new(
                summary.review_count + 1,
                summary.rating_total + u64::from(rating),
            )
        })
    }

    /// Number of reviews.
    #[must_use]
    pub const fn review_count(&self) -> u64 {
        self.review_count
    }

    /// Sum of all ratings.
    #[must_use]
    pub const fn rating_total(&self) -> u64 {
        self.rating_total
    }

    /// Arithmetic mean of the ratings, exactly zero without reviews.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "review counts and totals stay far below 2^52"
    )]
    pub fn average(&self) -> AverageRating {
        if self.review_count == 0 {
            return AverageRating::ZERO;
        }
        AverageRating(self.rating_total as f64 / self.review_count as f64)
    }
}

/// Mean review rating kept at full precision.
///
/// Never NaN: the only constructor divides by a non-zero count. Ordering is
/// total, so averages can key a sort directly. Serialisation emits the value
/// rounded to two decimal places.
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageRating(f64);

impl AverageRating {
    /// Average of an unreviewed item.
    pub const ZERO: Self = Self(0.0);

    /// Full-precision value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Value rounded half away from zero to two decimal places.
    ///
    /// # Examples
    /// ```
    /// use review_catalogue::domain::RatingSummary;
    ///
    /// let average = RatingSummary::from_ratings([5, 5, 4]).average();
    /// assert_eq!(average.rounded(), 4.67);
    /// ```
    #[must_use]
    pub fn rounded(self) -> f64 {
        (self.0 * 100.0).round() / 100.0
    }
}

impl PartialEq for AverageRating {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AverageRating {}

impl PartialOrd for AverageRating {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AverageRating {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Serialize for AverageRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.rounded())
    }
}

impl<'de> Deserialize<'de> for AverageRating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if value.is_nan() {
            return Err(serde::de::Error::custom("average rating must be a number"));
        }
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn unreviewed_items_average_exactly_zero() {
        let average = RatingSummary::EMPTY.average();
        assert_eq!(average.value(), 0.0);
        assert!(!average.value().is_nan());
    }

    #[rstest]
    #[case(&[5, 5, 4], 14.0 / 3.0)]
    #[case(&[1], 1.0)]
    #[case(&[2, 3], 2.5)]
    fn average_is_arithmetic_mean(#[case] ratings: &[u8], #[case] expected: f64) {
        let summary = RatingSummary::from_ratings(ratings.iter().copied());
        assert_eq!(summary.review_count(), u64::try_from(ratings.len()).expect("len"));
        assert!((summary.average().value() - expected).abs() < f64::EPSILON);
    }

    #[rstest]
    fn averages_order_totally() {
        let mut averages = vec![
            RatingSummary::new(3, 14).average(),
            RatingSummary::EMPTY.average(),
            RatingSummary::new(1, 2).average(),
        ];
        averages.sort();
        let values: Vec<f64> = averages.into_iter().map(AverageRating::rounded).collect();
        assert_eq!(values, vec![0.0, 2.0, 4.67]);
    }

    #[rstest]
    fn serialises_rounded_value() {
        let value = serde_json::to_value(RatingSummary::new(3, 14).average()).expect("serialise");
        assert_eq!(value, serde_json::json!(4.67));
    }
}
