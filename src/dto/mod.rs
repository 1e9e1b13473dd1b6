pub mod catalog;
pub mod conversion;
pub mod purchase_orders;

/// Calendar dates arrive either as `YYYY-MM-DD` or as a full RFC 3339 timestamp
/// (what browser date pickers and `Date#toISOString` produce); both collapse to a date.
pub(crate) mod flexible_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            D::Error::custom(format!(
                "invalid date '{}', expected YYYY-MM-DD or an RFC 3339 timestamp",
                raw
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::flexible_date;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    #[case("2024-07-01")]
    #[case("2024-07-01T00:00:00Z")]
    #[case("2024-07-01T09:30:00.000+02:00")]
    fn flexible_date_accepts_dates_and_timestamps(#[case] raw: &str) {
        assert_eq!(
            flexible_date::parse(raw),
            NaiveDate::from_ymd_opt(2024, 7, 1)
        );
    }

    #[rstest]
    #[case("")]
    #[case("07/01/2024")]
    #[case("2024-13-01")]
    fn flexible_date_rejects_garbage(#[case] raw: &str) {
        assert!(flexible_date::parse(raw).is_none());
    }
}
