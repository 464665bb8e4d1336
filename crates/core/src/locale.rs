//! Locale code handling.
//!
//! Source records from the 5.x profile carry a `_locale` tag per row
//! (e.g. `en-GB`); untranslated fields fall back to the shop's default
//! locale.

/// The shop default locale used when a record carries no locale tag.
pub const DEFAULT_LOCALE: &str = "en-GB";

/// Maximum accepted length of a locale code.
pub const MAX_LOCALE_LENGTH: usize = 16;

/// Validate that a locale code has the `xx-YY` shape (underscore variants
/// such as `en_GB` are accepted and normalized by [`normalize_locale`]).
pub fn validate_locale(code: &str) -> Result<(), String> {
    if code.is_empty() {
        return Err("Locale code cannot be empty".to_string());
    }
    if code.len() > MAX_LOCALE_LENGTH {
        return Err(format!(
            "Locale code exceeds maximum length of {MAX_LOCALE_LENGTH} characters"
        ));
    }
    let normalized = normalize_locale(code);
    let mut parts = normalized.split('-');
    let language = parts.next().unwrap_or_default();
    let region = parts.next();
    if parts.next().is_some() {
        return Err(format!("Locale code '{code}' has too many segments"));
    }
    if language.len() < 2
        || language.len() > 3
        || !language.chars().all(|c| c.is_ascii_lowercase())
    {
        return Err(format!("Locale code '{code}' has an invalid language part"));
    }
    if let Some(region) = region {
        if region.len() != 2 || !region.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(format!("Locale code '{code}' has an invalid region part"));
        }
    }
    Ok(())
}

/// Normalize a locale code to the `xx-YY` form: underscores become dashes,
/// language lowercased, region uppercased.
pub fn normalize_locale(code: &str) -> String {
    let code = code.replace('_', "-");
    match code.split_once('-') {
        Some((language, region)) => {
            format!("{}-{}", language.to_lowercase(), region.to_uppercase())
        }
        None => code.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_locale_is_valid() {
        assert!(validate_locale(DEFAULT_LOCALE).is_ok());
    }

    #[test]
    fn underscore_variant_accepted() {
        assert!(validate_locale("de_DE").is_ok());
    }

    #[test]
    fn language_only_accepted() {
        assert!(validate_locale("nl").is_ok());
    }

    #[test]
    fn empty_rejected() {
        assert!(validate_locale("").is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(validate_locale("ENGLISH").is_err());
        assert!(validate_locale("en-GB-foo").is_err());
        assert!(validate_locale("e-GB").is_err());
    }

    #[test]
    fn overlong_rejected() {
        assert!(validate_locale("en-GBGBGBGBGBGBGBGB").is_err());
    }

    #[test]
    fn normalize_handles_case_and_underscore() {
        assert_eq!(normalize_locale("EN_gb"), "en-GB");
        assert_eq!(normalize_locale("de-de"), "de-DE");
        assert_eq!(normalize_locale("NL"), "nl");
    }
}
