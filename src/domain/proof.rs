//! Proof records for social-engagement screenshots.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Social platform a proof screenshot belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Platform {
    /// Instagram follow proof.
    Instagram,
    /// YouTube subscribe proof.
    Youtube,
    /// Facebook follow proof.
    Facebook,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Instagram => "instagram",
            Self::Youtube => "youtube",
            Self::Facebook => "facebook",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instagram" => Ok(Self::Instagram),
            "youtube" => Ok(Self::Youtube),
            "facebook" => Ok(Self::Facebook),
            other => Err(format!("invalid platform: {other}")),
        }
    }
}

/// A stored proof image row.
///
/// `code_or_session` is an ephemeral session UUID until registration
/// completes, at which point it is re-keyed to the permanent ticket code
/// atomically with ticket creation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Proof {
    /// Auto-increment row ID.
    pub id: i64,
    /// Session UUID or permanent ticket code.
    pub code_or_session: String,
    /// Platform the screenshot proves engagement with.
    pub platform: Platform,
    /// Relative file path under the upload root.
    pub file_path: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_known_values() {
        assert_eq!("instagram".parse::<Platform>().ok(), Some(Platform::Instagram));
        assert_eq!("youtube".parse::<Platform>().ok(), Some(Platform::Youtube));
        assert_eq!("facebook".parse::<Platform>().ok(), Some(Platform::Facebook));
        assert!("tiktok".parse::<Platform>().is_err());
    }

    #[test]
    fn platform_display_round_trips() {
        for p in [Platform::Instagram, Platform::Youtube, Platform::Facebook] {
            assert_eq!(p.to_string().parse::<Platform>().ok(), Some(p));
        }
    }
}
