//! Per-framework scaffolding rules
//!
//! Each supported framework implements [`FrameworkProfile`] to define:
//! - The supported major version range
//! - How the installer's bare package reference is pinned to a version
//! - Environment file overrides pointing at compose service hostnames
//! - Setup commands run after the installer and asset copy

use crate::templates::version::version_parts;

/// Rules for one framework
pub trait FrameworkProfile: Send + Sync {
    /// Lowercase identifier used on the command line and in template paths
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Inclusive (floor, ceiling) range of supported major versions
    fn major_range(&self) -> (u64, u64);

    /// Version used when the caller does not request one
    fn default_version(&self) -> &'static str;

    /// The installer token naming the framework package
    fn package(&self) -> &'static str;

    /// Version-pinned replacement for [`FrameworkProfile::package`]
    fn pin_package(&self, version: &str) -> Option<String>;

    /// `KEY=value` pairs forced into the project's `.env`. Values may use placeholders.
    fn env_overrides(&self) -> &'static [(&'static str, &'static str)];

    /// Default setup commands, in order. Tokens may use placeholders.
    fn setup_commands(&self) -> Vec<Vec<String>>;
}

pub struct Laravel;

pub struct Django;

static LARAVEL: Laravel = Laravel;
static DJANGO: Django = Django;

/// All built-in profiles
pub fn profiles() -> [&'static dyn FrameworkProfile; 2] {
    [&LARAVEL, &DJANGO]
}

/// Look up a profile by name (case-insensitive)
pub fn profile(name: &str) -> Option<&'static dyn FrameworkProfile> {
    profiles()
        .into_iter()
        .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
}

fn compose_run(args: &[&str]) -> Vec<String> {
    ["docker", "compose", "run", "--rm", "app"]
        .iter()
        .chain(args)
        .map(|s| s.to_string())
        .collect()
}

impl FrameworkProfile for Laravel {
    fn name(&self) -> &'static str {
        "laravel"
    }

    fn display_name(&self) -> &'static str {
        "Laravel"
    }

    fn major_range(&self) -> (u64, u64) {
        (8, 12)
    }

    fn default_version(&self) -> &'static str {
        "12"
    }

    fn package(&self) -> &'static str {
        "laravel/laravel"
    }

    fn pin_package(&self, version: &str) -> Option<String> {
        let parts = version_parts(version).ok()?;
        let constraint = match parts.as_slice() {
            [major] => format!("^{}.0", major),
            [major, minor] => format!("{}.{}.*", major, minor),
            _ => parts
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join("."),
        };
        Some(format!("{}:{}", self.package(), constraint))
    }

    fn env_overrides(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("DB_CONNECTION", "mysql"),
            ("DB_HOST", "mysql"),
            ("DB_PORT", "3306"),
            ("DB_DATABASE", "{{name}}"),
            ("DB_USERNAME", "atempo"),
            ("DB_PASSWORD", "secret"),
            ("REDIS_HOST", "redis"),
            ("MAIL_HOST", "mailpit"),
        ]
    }

    fn setup_commands(&self) -> Vec<Vec<String>> {
        vec![
            compose_run(&["composer", "install"]),
            compose_run(&["php", "artisan", "key:generate"]),
            compose_run(&["php", "artisan", "migrate", "--force"]),
        ]
    }
}

impl FrameworkProfile for Django {
    fn name(&self) -> &'static str {
        "django"
    }

    fn display_name(&self) -> &'static str {
        "Django"
    }

    fn major_range(&self) -> (u64, u64) {
        (4, 6)
    }

    fn default_version(&self) -> &'static str {
        "5"
    }

    fn package(&self) -> &'static str {
        "django"
    }

    fn pin_package(&self, version: &str) -> Option<String> {
        let parts = version_parts(version).ok()?;
        let spec = match parts.as_slice() {
            [major] => format!(">={}.0,<{}.0", major, major + 1),
            [major, minor] => format!(">={}.{},<{}.{}", major, minor, major, minor + 1),
            _ => format!(
                "=={}",
                parts
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join(".")
            ),
        };
        Some(format!("{}{}", self.package(), spec))
    }

    fn env_overrides(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("DB_HOST", "postgres"),
            ("DB_PORT", "5432"),
            ("DB_NAME", "{{name}}"),
            ("DB_USER", "atempo"),
            ("DB_PASSWORD", "secret"),
            ("REDIS_HOST", "redis"),
        ]
    }

    fn setup_commands(&self) -> Vec<Vec<String>> {
        vec![
            compose_run(&["pip", "install", "-r", "requirements.txt"]),
            compose_run(&["python", "manage.py", "migrate"]),
            compose_run(&["python", "manage.py", "collectstatic", "--noinput"]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lookup_is_case_insensitive() {
        assert_eq!(profile("Laravel").map(|p| p.name()), Some("laravel"));
        assert_eq!(profile(" django ").map(|p| p.name()), Some("django"));
        assert!(profile("rails").is_none());
    }

    #[test]
    fn test_laravel_pins() {
        assert_eq!(
            LARAVEL.pin_package("11").as_deref(),
            Some("laravel/laravel:^11.0")
        );
        assert_eq!(
            LARAVEL.pin_package("11.2").as_deref(),
            Some("laravel/laravel:11.2.*")
        );
        assert_eq!(
            LARAVEL.pin_package("v11.2.3").as_deref(),
            Some("laravel/laravel:11.2.3")
        );
        assert!(LARAVEL.pin_package("latest").is_none());
    }

    #[test]
    fn test_django_pins() {
        assert_eq!(DJANGO.pin_package("5").as_deref(), Some("django>=5.0,<6.0"));
        assert_eq!(DJANGO.pin_package("5.1").as_deref(), Some("django>=5.1,<5.2"));
        assert_eq!(DJANGO.pin_package("5.1.2").as_deref(), Some("django==5.1.2"));
    }

    #[test]
    fn test_default_versions_are_in_range() {
        for p in profiles() {
            let major = version_parts(p.default_version()).unwrap()[0];
            let (floor, ceiling) = p.major_range();
            assert!(major >= floor && major <= ceiling, "{}", p.name());
        }
    }
}
