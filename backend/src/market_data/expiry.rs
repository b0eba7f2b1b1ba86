// =============================================================================
// Options expiry filtering
// =============================================================================
//
// Contracts are kept only when they expire between today and today + 730 days
// (inclusive). An optional bucket narrows the upper bound further. Contracts
// without a parseable `YYYY-MM-DD` expiration are dropped.
//
// Reference payloads carry `expiration_date` at the top level; snapshot
// payloads nest it under `details`. Both are recognised.
// =============================================================================

use chrono::{Days, NaiveDate};
use serde::Deserialize;
use serde_json::Value;

/// Widest expiry horizon served, in days.
pub const MAX_EXPIRY_DAYS: u64 = 730;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ExpiryBucket {
    #[serde(rename = "otd")]
    SameDay,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "365d")]
    Year,
    #[serde(rename = "730d")]
    TwoYears,
}

impl ExpiryBucket {
    pub fn days(self) -> u64 {
        match self {
            Self::SameDay => 0,
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
            Self::TwoYears => 730,
        }
    }
}

/// Expiration date of one contract record.
pub fn expiration(contract: &Value) -> Option<NaiveDate> {
    let raw = contract
        .get("expiration_date")
        .or_else(|| contract.get("details")?.get("expiration_date"))?
        .as_str()?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// `today <= expiry <= today + 730 days`.
pub fn within_horizon(expiry: NaiveDate, today: NaiveDate) -> bool {
    let max = today.checked_add_days(Days::new(MAX_EXPIRY_DAYS));
    expiry >= today && max.is_some_and(|max| expiry <= max)
}

pub fn filter_by_expiry(
    contracts: Vec<Value>,
    today: NaiveDate,
    bucket: Option<ExpiryBucket>,
) -> Vec<Value> {
    let cutoff = bucket.and_then(|b| today.checked_add_days(Days::new(b.days())));
    contracts
        .into_iter()
        .filter(|c| match expiration(c) {
            Some(expiry) => {
                within_horizon(expiry, today) && cutoff.map_or(true, |cutoff| expiry <= cutoff)
            }
            None => false,
        })
        .collect()
}

/// Filter `payload["results"]` in place when it is an array.
pub fn filter_results(payload: &mut Value, today: NaiveDate, bucket: Option<ExpiryBucket>) {
    if let Some(results) = payload.get_mut("results").and_then(Value::as_array_mut) {
        let kept = filter_by_expiry(std::mem::take(results), today, bucket);
        *results = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn contract(expiry: &str) -> Value {
        json!({ "ticker": format!("O:SPY{expiry}"), "expiration_date": expiry })
    }

    fn expiries(v: &[Value]) -> Vec<&str> {
        v.iter().map(|c| c["expiration_date"].as_str().unwrap()).collect()
    }

    #[test]
    fn drops_expired_far_and_undated() {
        let kept = filter_by_expiry(
            vec![
                contract("2025-01-09"),
                contract("2025-01-10"),
                contract("2027-01-10"),
                contract("2027-01-11"),
                contract("not-a-date"),
                json!({ "ticker": "O:SPY" }),
            ],
            today(),
            None,
        );
        assert_eq!(expiries(&kept), vec!["2025-01-10", "2027-01-10"]);
    }

    #[test]
    fn bucket_narrows_the_cutoff() {
        let all = vec![
            contract("2025-01-10"),
            contract("2025-01-17"),
            contract("2025-01-18"),
            contract("2025-04-10"),
        ];
        let same_day = filter_by_expiry(all.clone(), today(), Some(ExpiryBucket::SameDay));
        assert_eq!(expiries(&same_day), vec!["2025-01-10"]);

        let week = filter_by_expiry(all.clone(), today(), Some(ExpiryBucket::Week));
        assert_eq!(expiries(&week), vec!["2025-01-10", "2025-01-17"]);

        let quarter = filter_by_expiry(all, today(), Some(ExpiryBucket::Quarter));
        assert_eq!(quarter.len(), 4);
    }

    #[test]
    fn snapshot_records_nest_the_expiry() {
        let snap = json!({ "details": { "expiration_date": "2025-02-21" } });
        assert_eq!(expiration(&snap), NaiveDate::from_ymd_opt(2025, 2, 21));
        assert_eq!(filter_by_expiry(vec![snap], today(), Some(ExpiryBucket::Month)).len(), 0);
    }

    #[test]
    fn filter_results_in_place() {
        let mut payload = json!({
            "status": "OK",
            "results": [contract("2024-12-20"), contract("2025-03-21")],
        });
        filter_results(&mut payload, today(), None);
        assert_eq!(payload["results"].as_array().unwrap().len(), 1);
        assert_eq!(payload["status"], "OK");

        let mut no_results = json!({ "status": "ERROR" });
        filter_results(&mut no_results, today(), None);
        assert_eq!(no_results, json!({ "status": "ERROR" }));
    }

    #[test]
    fn bucket_names_deserialize() {
        let b: ExpiryBucket = serde_json::from_str("\"365d\"").unwrap();
        assert_eq!(b, ExpiryBucket::Year);
        assert!(serde_json::from_str::<ExpiryBucket>("\"1d\"").is_err());
    }
}
