use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| {
        Regex::new(r"^[@a-zA-Z0-9][\w\-./]*$").expect("package name pattern is valid")
    })
}

/// Counts entry lines: not blank, not a comment, containing a colon.
pub fn count_packages(body: &str) -> usize {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && line.contains(':'))
        .count()
}

/// Checks a single `name:version` line. Versions are full SemVer, so
/// pre-release and build suffixes are accepted.
pub fn is_valid_entry(line: &str) -> bool {
    let Some((name, version)) = line.split_once(':') else {
        return false;
    };
    name_re().is_match(name) && semver::Version::parse(version).is_ok()
}

/// Runs the three checks a downloaded list must pass before it is cached.
pub fn validate_package_list(
    body: &str,
    expected_header: &str,
    min_packages: usize,
) -> Result<(), ValidationError> {
    if !body.contains(expected_header) {
        return Err(ValidationError::MissingHeader);
    }

    let found = count_packages(body);
    if found < min_packages {
        return Err(ValidationError::TooFewPackages {
            found,
            expected: min_packages,
        });
    }

    let invalid = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .find(|line| !is_valid_entry(line));

    match invalid {
        Some(line) => Err(ValidationError::InvalidFormat {
            line: line.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Shai-Hulud NPM Supply Chain Attack";

    fn list(entries: usize) -> String {
        let mut body = format!("# {}\n# generated\n\n", HEADER);
        for i in 0..entries {
            body.push_str(&format!("pkg-{}:1.0.{}\n", i, i));
        }
        body
    }

    #[test]
    fn test_count_skips_comments_and_blanks() {
        assert_eq!(count_packages("# a:b\n\nx:1.0.0\n  y:2.0.0  \nnocolon\n"), 2);
    }

    #[test]
    fn test_valid_entries() {
        assert!(is_valid_entry("@ctrl/tinycolor:4.1.1"));
        assert!(is_valid_entry("left-pad:1.3.0"));
        assert!(is_valid_entry("lodash.debounce:4.0.8"));
        assert!(is_valid_entry("pkg:1.0.0-beta.1"));
        assert!(is_valid_entry("pkg:1.0.0+build.5"));
    }

    #[test]
    fn test_invalid_entries() {
        assert!(!is_valid_entry("left-pad"));
        assert!(!is_valid_entry("left-pad:latest"));
        assert!(!is_valid_entry("-bad:1.0.0"));
        assert!(!is_valid_entry("<script>:1.0.0"));
        assert!(!is_valid_entry("pkg:1.0"));
    }

    #[test]
    fn test_accepts_good_list() {
        assert_eq!(validate_package_list(&list(500), HEADER, 500), Ok(()));
    }

    #[test]
    fn test_rejects_missing_header() {
        let body = list(600).replace(HEADER, "Something Else");
        assert_eq!(
            validate_package_list(&body, HEADER, 500),
            Err(ValidationError::MissingHeader)
        );
    }

    #[test]
    fn test_rejects_truncated_list() {
        assert_eq!(
            validate_package_list(&list(10), HEADER, 500),
            Err(ValidationError::TooFewPackages {
                found: 10,
                expected: 500
            })
        );
    }

    #[test]
    fn test_rejects_bad_line() {
        let mut body = list(500);
        body.push_str("<html>oops</html>\n");
        assert!(matches!(
            validate_package_list(&body, HEADER, 500),
            Err(ValidationError::InvalidFormat { line }) if line == "<html>oops</html>"
        ));
    }
}
