//! Type-safe ticket code with human-readable generation.
//!
//! [`TicketCode`] wraps the string code handed to registrants. Codes are
//! entered manually by humans, so the format stays short and unambiguous:
//! `DRM25-<CITY>-<6 uppercase hex>`. The 6-hex-char suffix gives a 16.7M
//! code space, so generation is collision-checked by the caller.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Seasonal prefix for all generated codes.
pub const CODE_PREFIX: &str = "DRM25";

/// Unique human-readable identifier for a ticket.
///
/// Shape: `DRM25-<CITY>-<6 uppercase hex>`. Generated once at
/// registration time and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketCode(String);

impl TicketCode {
    /// Generates a new random code for the given city.
    ///
    /// Not guaranteed unique: the caller must collision-check against
    /// the store and retry on conflict.
    #[must_use]
    pub fn generate(city_code: &str) -> Self {
        let mut bytes = [0u8; 3];
        rand::rng().fill(&mut bytes);
        let suffix = hex::encode_upper(bytes);
        Self(format!("{CODE_PREFIX}-{city_code}-{suffix}"))
    }

    /// Wraps an existing code string without validation.
    #[must_use]
    pub fn from_string(code: String) -> Self {
        Self(code)
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if `s` matches the documented code shape for the
    /// given city.
    #[must_use]
    pub fn matches_format(s: &str, city_code: &str) -> bool {
        let Some(rest) = s.strip_prefix(CODE_PREFIX) else {
            return false;
        };
        let Some(rest) = rest.strip_prefix('-') else {
            return false;
        };
        let Some(suffix) = rest.strip_prefix(city_code).and_then(|r| r.strip_prefix('-'))
        else {
            return false;
        };
        suffix.len() == 6
            && suffix
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TicketCode> for String {
    fn from(code: TicketCode) -> Self {
        code.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_match_format() {
        for _ in 0..100 {
            let code = TicketCode::generate("KOL");
            assert!(
                TicketCode::matches_format(code.as_str(), "KOL"),
                "bad code: {code}"
            );
        }
    }

    #[test]
    fn format_rejects_wrong_prefix_city_or_suffix() {
        assert!(TicketCode::matches_format("DRM25-KOL-A1B2C3", "KOL"));
        assert!(!TicketCode::matches_format("DRM24-KOL-A1B2C3", "KOL"));
        assert!(!TicketCode::matches_format("DRM25-BLR-A1B2C3", "KOL"));
        assert!(!TicketCode::matches_format("DRM25-KOL-a1b2c3", "KOL"));
        assert!(!TicketCode::matches_format("DRM25-KOL-A1B2C", "KOL"));
        assert!(!TicketCode::matches_format("DRM25-KOL-A1B2C3F", "KOL"));
        assert!(!TicketCode::matches_format("DRM25-KOL-G1B2C3", "KOL"));
    }

    #[test]
    fn generation_is_not_constant() {
        let a = TicketCode::generate("KOL");
        let mut saw_different = false;
        for _ in 0..32 {
            if TicketCode::generate("KOL") != a {
                saw_different = true;
                break;
            }
        }
        assert!(saw_different);
    }

    #[test]
    fn display_matches_as_str() {
        let code = TicketCode::from_string("DRM25-KOL-FFFFFF".to_string());
        assert_eq!(format!("{code}"), code.as_str());
    }
}
