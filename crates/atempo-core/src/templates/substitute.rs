//! Placeholder substitution for installer argv and template file contents

use crate::framework;
use std::path::Path;

/// Values bound to `{{project}}`, `{{cwd}}`, `{{name}}` and `{{version}}` for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variables {
    pub project: String,
    pub cwd: String,
    pub name: String,
    pub version: String,
}

impl Variables {
    pub fn new(project: &Path, cwd: &Path, name: &str, version: &str) -> Self {
        Self {
            project: project.display().to_string(),
            cwd: cwd.display().to_string(),
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        match key {
            "project" => Some(&self.project),
            "cwd" => Some(&self.cwd),
            "name" => Some(&self.name),
            "version" => Some(&self.version),
            _ => None,
        }
    }
}

/// Replace every known placeholder in `text` in a single pass.
///
/// Substituted values are never rescanned, so the order of placeholders does
/// not matter. Unknown placeholders are kept verbatim.
pub fn substitute_str(text: &str, vars: &Variables) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        match vars.lookup(&after[..end]) {
            Some(value) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                // Keep one brace and rescan from the next, so `{{{name}}}` still matches
                out.push('{');
                rest = &rest[start + 1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Substitute placeholders in every token
pub fn substitute(tokens: &[String], vars: &Variables) -> Vec<String> {
    tokens.iter().map(|t| substitute_str(t, vars)).collect()
}

/// Rewrite the token equal to the framework's bare package reference into a
/// version-pinned one. Every other token is returned unchanged.
pub fn apply_framework_options(command: &[String], framework_name: &str, version: &str) -> Vec<String> {
    let Some(profile) = framework::profile(framework_name) else {
        return command.to_vec();
    };
    let Some(pinned) = profile.pin_package(version) else {
        return command.to_vec();
    };

    command
        .iter()
        .map(|token| {
            if token == profile.package() {
                pinned.clone()
            } else {
                token.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Variables {
        Variables::new(
            Path::new("/work/blog"),
            Path::new("/work"),
            "blog",
            "11",
        )
    }

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_placeholders_replaced() {
        let out = substitute_str("{{project}} {{cwd}} {{name}} {{version}}", &vars());
        assert_eq!(out, "/work/blog /work blog 11");
    }

    #[test]
    fn test_unknown_placeholders_left_verbatim() {
        let out = substitute_str("{{other}} {{name}} {{ name }} {{unclosed", &vars());
        assert_eq!(out, "{{other}} blog {{ name }} {{unclosed");
    }

    #[test]
    fn test_nested_braces_still_substitute_inner() {
        assert_eq!(substitute_str("{{x {{name}}", &vars()), "{{x blog");
    }

    #[test]
    fn test_placeholder_inside_extra_braces() {
        assert_eq!(substitute_str("{{{name}}}", &vars()), "{blog}");
        assert_eq!(substitute_str("{{{{version}}}}", &vars()), "{{11}}");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let mut v = vars();
        v.name = "{{version}}".to_string();
        assert_eq!(substitute_str("{{name}}-{{version}}", &v), "{{version}}-11");
    }

    #[test]
    fn test_substitution_is_idempotent() {
        let once = substitute(&argv(&["-v", "{{project}}:/app", "{{name}}"]), &vars());
        let twice = substitute(&once, &vars());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(substitute(&[], &vars()).is_empty());
        assert_eq!(substitute_str("", &vars()), "");
        assert!(apply_framework_options(&[], "laravel", "11").is_empty());
    }

    #[test]
    fn test_laravel_package_pinned_exactly() {
        let cmd = argv(&["composer", "create-project", "laravel/laravel", "laravel/laravel-extra", "."]);
        let out = apply_framework_options(&cmd, "laravel", "11");
        assert_eq!(
            out,
            argv(&["composer", "create-project", "laravel/laravel:^11.0", "laravel/laravel-extra", "."])
        );
        assert_eq!(apply_framework_options(&out, "laravel", "11"), out);
    }

    #[test]
    fn test_django_package_pinned() {
        let cmd = argv(&["sh", "-c", "pip install \"$0\"", "django"]);
        let out = apply_framework_options(&cmd, "django", "5.1");
        assert_eq!(out[3], "django>=5.1,<5.2");
        assert_eq!(out[2], cmd[2]);
    }

    #[test]
    fn test_unknown_framework_untouched() {
        let cmd = argv(&["rails", "new", "."]);
        assert_eq!(apply_framework_options(&cmd, "rails", "7"), cmd);
    }
}
