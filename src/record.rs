// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::{Local, NaiveDateTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StationError};

/// Product label stamped on automatically ingested readings
pub const DEFAULT_PRODUCT_TYPE: &str = "Product";

/// Timestamp layout written to the ledger (local time, microsecond precision)
pub const LEDGER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Operator-visible identifier of one weighing event.
///
/// Generated ids are six random decimal digits. Nothing checks them for
/// uniqueness against the ledger, so two bags can collide; lookups then
/// resolve to the first match in storage order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BagId(String);

impl BagId {
    pub const LEN: usize = 6;

    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let id = (0..Self::LEN)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        Self(id)
    }

    pub fn random() -> Self {
        Self::generate(&mut rand::thread_rng())
    }

    /// Accept an operator-entered id: non-empty and ASCII digits only.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(StationError::InvalidBagId(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BagId {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for BagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One scale reading as stored in the ledger.
///
/// Field order and header names match the persisted CSV layout:
/// `BagID, GrossWeight, DateAndTime, BatchNumb, ProductType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeighRecord {
    #[serde(rename = "BagID")]
    pub bag_id: BagId,

    #[serde(rename = "GrossWeight")]
    pub gross_weight: f64,

    #[serde(rename = "DateAndTime", alias = "DateandTime", with = "ledger_time")]
    pub timestamp: NaiveDateTime,

    #[serde(rename = "BatchNumb")]
    pub batch_number: u32,

    #[serde(rename = "ProductType")]
    pub product_type: String,
}

impl WeighRecord {
    pub fn new(
        bag_id: BagId,
        gross_weight: f64,
        timestamp: NaiveDateTime,
        batch_number: u32,
        product_type: impl Into<String>,
    ) -> Self {
        Self {
            bag_id,
            gross_weight,
            timestamp: truncate_to_micros(timestamp),
            batch_number,
            product_type: product_type.into(),
        }
    }

    /// Check the field invariants a ledger row must satisfy.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.gross_weight.is_finite() || self.gross_weight < 0.0 {
            return Err(format!(
                "gross weight {} must be finite and non-negative",
                self.gross_weight
            ));
        }
        if self.batch_number == 0 {
            return Err("batch number must be positive".to_string());
        }
        if self.bag_id.as_str().is_empty() {
            return Err("bag id is empty".to_string());
        }
        if self.timestamp.nanosecond() % 1_000 != 0 {
            return Err(format!(
                "timestamp {} is finer than microsecond precision",
                self.timestamp
            ));
        }
        Ok(())
    }
}

/// Drop sub-microsecond digits the ledger format cannot hold.
pub fn truncate_to_micros(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(ts.nanosecond() / 1_000 * 1_000)
        .unwrap_or(ts)
}

/// Current local time, truncated to what the ledger format can hold.
pub fn capture_time() -> NaiveDateTime {
    truncate_to_micros(Local::now().naive_local())
}

/// Parse a ledger timestamp; readings written without a fractional part are accepted.
pub fn parse_timestamp(raw: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
}

pub(crate) mod ledger_time {
    use super::{parse_timestamp, LEDGER_TIME_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(LEDGER_TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(|e| {
            serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_bag_id_is_six_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let id = BagId::generate(&mut rng);
            assert_eq!(id.as_str().len(), BagId::LEN);
            assert!(id.as_str().bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_bag_id_parse() {
        assert_eq!(BagId::parse(" 123456 ").unwrap().as_str(), "123456");
        assert_eq!(BagId::parse("42").unwrap().as_str(), "42");
        assert!(BagId::parse("").is_err());
        assert!(BagId::parse("12a456").is_err());
        assert!(BagId::parse("-12").is_err());
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let with_fraction = parse_timestamp("2024-03-01 08:15:30.123456").unwrap();
        assert_eq!(with_fraction.nanosecond(), 123_456_000);

        let without_fraction = parse_timestamp("2024-03-01 08:15:30").unwrap();
        assert_eq!(without_fraction.second(), 30);

        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_capture_time_fits_ledger_precision() {
        let ts = capture_time();
        assert_eq!(ts.nanosecond() % 1_000, 0);
        let text = ts.format(LEDGER_TIME_FORMAT).to_string();
        assert_eq!(parse_timestamp(&text).unwrap(), ts);
    }

    #[test]
    fn test_validate() {
        let ts = parse_timestamp("2024-03-01 08:15:30").unwrap();
        let good = WeighRecord::new(BagId::parse("1").unwrap(), 12.5, ts, 1, "Product");
        assert!(good.validate().is_ok());

        let mut negative = good.clone();
        negative.gross_weight = -1.0;
        assert!(negative.validate().is_err());

        let mut nan = good.clone();
        nan.gross_weight = f64::NAN;
        assert!(nan.validate().is_err());

        let mut batch_zero = good;
        batch_zero.batch_number = 0;
        assert!(batch_zero.validate().is_err());
    }

    #[test]
    fn test_new_truncates_to_ledger_precision() {
        let fine = parse_timestamp("2024-03-01 08:00:00.123456789").unwrap();
        let record = WeighRecord::new(BagId::parse("1").unwrap(), 1.0, fine, 1, "Product");

        assert_eq!(record.timestamp.nanosecond(), 123_456_000);
        assert!(record.validate().is_ok());

        let mut edited = record;
        edited.timestamp = fine;
        assert!(edited.validate().is_err());
    }
}
