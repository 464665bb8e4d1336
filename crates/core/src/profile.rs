//! Source-system profiles.
//!
//! A profile identifies the legacy platform edition a converter understands.
//! Profiles are resolved once at configuration time and carried on the
//! [`MigrationContext`](crate::context::MigrationContext); nothing in the
//! pipeline compares raw profile-name strings.

use serde::{Deserialize, Serialize};

/// A supported source-system profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// The legacy 5.x platform: flat SQL rows, locale tagged per record
    /// via the `_locale` key.
    Shop5,
    /// A structured 6.x-schema source instance whose records already carry
    /// the target shape but need re-identification.
    Shop6,
}

impl Profile {
    /// Return the profile name as stored in configuration and run rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shop5 => "shop5",
            Self::Shop6 => "shop6",
        }
    }

    /// Parse a profile name. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "shop5" => Some(Self::Shop5),
            "shop6" => Some(Self::Shop6),
            _ => None,
        }
    }

    /// All valid profile names.
    pub const ALL: &'static [&'static str] = &["shop5", "shop6"];
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_round_trip() {
        for s in Profile::ALL {
            let profile = Profile::from_str(s).unwrap();
            assert_eq!(profile.as_str(), *s);
        }
    }

    #[test]
    fn profile_unknown_returns_none() {
        assert!(Profile::from_str("shop4").is_none());
        assert!(Profile::from_str("").is_none());
    }

    #[test]
    fn profile_display_matches_as_str() {
        assert_eq!(format!("{}", Profile::Shop5), "shop5");
        assert_eq!(format!("{}", Profile::Shop6), "shop6");
    }
}
