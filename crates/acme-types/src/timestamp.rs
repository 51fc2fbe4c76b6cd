//! `Timestamp` — a UTC instant serialized as an ISO-8601 `Z` string on the wire.
//!
//! The orchestrator deals in calendar certificate validity dates
//! (`not_before`/`not_after`) as well as instants (`created_at`,
//! `retry_after`), so unlike a bare unix-seconds counter this wraps
//! `chrono::DateTime<Utc>` directly.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Copy, Debug)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
	pub fn now() -> Timestamp {
		Timestamp(Utc::now())
	}

	pub fn from_unix(secs: i64) -> Timestamp {
		Timestamp(Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now))
	}

	/// Parse an OpenSSL-style `notBefore=`/`notAfter=` date
	/// (e.g. `Jan  2 03:04:05 2025 GMT`) into a `Timestamp`.
	pub fn from_openssl_date(s: &str) -> Option<Timestamp> {
		DateTime::parse_from_str(s, "%b %e %H:%M:%S %Y GMT")
			.ok()
			.map(|dt| Timestamp(dt.with_timezone(&Utc)))
	}

	/// Parse a `retry after YYYY-MM-DD HH:MM:SS UTC` style timestamp.
	pub fn from_acme_retry_after(s: &str) -> Option<Timestamp> {
		DateTime::parse_from_str(&format!("{s} +0000"), "%Y-%m-%d %H:%M:%S UTC %z")
			.ok()
			.map(|dt| Timestamp(dt.with_timezone(&Utc)))
	}

	pub fn add_seconds(&self, seconds: i64) -> Timestamp {
		Timestamp(self.0 + chrono::Duration::seconds(seconds))
	}

	pub fn to_rfc3339(&self) -> String {
		self.0.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.to_rfc3339())
	}
}

impl PartialEq for Timestamp {
	fn eq(&self, other: &Self) -> bool {
		self.0 == other.0
	}
}
impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for Timestamp {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.0.cmp(&other.0)
	}
}

impl Serialize for Timestamp {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_rfc3339())
	}
}

impl<'de> Deserialize<'de> for Timestamp {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		DateTime::parse_from_rfc3339(&s)
			.map(|dt| Timestamp(dt.with_timezone(&Utc)))
			.map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_acme_retry_after() {
		let ts = Timestamp::from_acme_retry_after("2025-01-02 03:04:05 UTC").unwrap();
		assert_eq!(ts.to_rfc3339(), "2025-01-02T03:04:05Z");
	}

	#[test]
	fn parses_openssl_not_after() {
		let ts = Timestamp::from_openssl_date("Jan  2 03:04:05 2025 GMT").unwrap();
		assert_eq!(ts.to_rfc3339(), "2025-01-02T03:04:05Z");
	}

	#[test]
	fn roundtrips_through_json() {
		let ts = Timestamp::now();
		let json = serde_json::to_string(&ts).unwrap();
		let back: Timestamp = serde_json::from_str(&json).unwrap();
		assert_eq!(ts.0.timestamp(), back.0.timestamp());
	}
}

// vim: ts=4
