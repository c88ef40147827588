//! Requested framework version validation

use crate::error::ValidationError;
use crate::framework;
use semver::Version;

/// Split a version string into numeric parts ("v11.2" -> [11, 2])
pub fn version_parts(version: &str) -> Result<Vec<u64>, ValidationError> {
    let trimmed = version.trim();
    let cleaned = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let invalid = || ValidationError::Invalid(version.to_string());
    let parts = cleaned
        .split('.')
        .map(|part| {
            // u64 parsing alone would accept a leading `+`
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        })
        .collect::<Result<Vec<_>, _>>()?;

    if parts.is_empty() || parts.len() > 3 {
        return Err(ValidationError::Invalid(version.to_string()));
    }
    Ok(parts)
}

/// Parse a version string, padding missing parts with zero ("8" == "8.0.0")
pub fn parse_version(version: &str) -> Result<Version, ValidationError> {
    let parts = version_parts(version)?;
    let part = |i: usize| parts.get(i).copied().unwrap_or(0);
    Ok(Version::new(part(0), part(1), part(2)))
}

/// Check a requested version against the framework's supported range and the
/// metadata's minimum version, in that order.
pub fn validate(
    framework_name: &str,
    requested: &str,
    min_version: &str,
) -> Result<(), ValidationError> {
    if requested.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    let version = parse_version(requested)?;

    let profile = framework::profile(framework_name);
    let display = profile
        .map(|p| p.display_name().to_string())
        .unwrap_or_else(|| framework_name.to_string());

    if let Some(profile) = profile {
        let (floor, ceiling) = profile.major_range();
        if version.major < floor {
            return Err(ValidationError::TooOld {
                framework: display,
                version: requested.to_string(),
                floor,
            });
        }
        if version.major > ceiling {
            return Err(ValidationError::NotYetSupported {
                framework: display,
                version: requested.to_string(),
                ceiling,
            });
        }
    }

    if !min_version.trim().is_empty() && version < parse_version(min_version)? {
        return Err(ValidationError::BelowMinimum {
            framework: display,
            version: requested.to_string(),
            minimum: min_version.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_version_rejected() {
        let err = validate("laravel", "", "8.0").unwrap_err();
        assert!(matches!(err, ValidationError::Empty));
        assert!(validate("unknown", "  ", "").is_err());
    }

    #[test]
    fn test_versions_in_range_pass() {
        for major in 8..=12 {
            validate("laravel", &major.to_string(), "8.0").unwrap();
            validate("laravel", &format!("{}.1", major), "8.0").unwrap();
        }
        for v in ["4.2", "5", "5.1.3", "6.0"] {
            validate("django", v, "4.2").unwrap();
        }
    }

    #[test]
    fn test_too_old() {
        let err = validate("laravel", "7.0", "8.0").unwrap_err();
        assert!(err.to_string().contains("too old"), "{}", err);
        let err = validate("django", "3.2", "").unwrap_err();
        assert!(err.to_string().contains("too old"), "{}", err);
    }

    #[test]
    fn test_not_yet_supported() {
        let err = validate("laravel", "13", "8.0").unwrap_err();
        assert!(err.to_string().contains("not yet supported"), "{}", err);
        let err = validate("django", "7.0", "4.2").unwrap_err();
        assert!(err.to_string().contains("not yet supported"), "{}", err);
    }

    #[test]
    fn test_below_minimum_uses_ordinal_comparison() {
        // "10" sorts before "9.5" lexicographically but is newer
        validate("laravel", "10", "9.5").unwrap();

        let err = validate("laravel", "9.4", "9.5").unwrap_err();
        assert!(
            err.to_string().contains("below minimum supported version"),
            "{}",
            err
        );
        let err = validate("django", "4.1", "4.2").unwrap_err();
        assert!(err.to_string().contains("below minimum supported version"));
    }

    #[test]
    fn test_unknown_framework_skips_range() {
        validate("rails", "99", "").unwrap();
        let err = validate("rails", "1.0", "2.0").unwrap_err();
        assert!(matches!(err, ValidationError::BelowMinimum { .. }));
    }

    #[test]
    fn test_padding_and_prefix() {
        assert_eq!(parse_version("8").unwrap(), parse_version("8.0.0").unwrap());
        assert_eq!(parse_version("v11.2").unwrap(), Version::new(11, 2, 0));
        validate("laravel", "8", "8.0").unwrap();
    }

    #[test]
    fn test_invalid_versions() {
        for bad in ["11.x", "latest", "1.2.3.4", "11..0", "+11", "11.+2", "-1", " 1 1"] {
            let err = validate("laravel", bad, "8.0").unwrap_err();
            assert!(matches!(err, ValidationError::Invalid(_)), "{}", bad);
        }
    }
}
