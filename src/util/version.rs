use regex::Regex;
use semver::Version;
use std::sync::OnceLock;

use super::ExtractError;

/// `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`. Group 1 excludes build metadata.
const SEMVER_PATTERN: &str =
    r"(\d+\.\d+\.\d+(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?)(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?";

static SEMVER_REGEX: OnceLock<Regex> = OnceLock::new();

fn semver_regex() -> &'static Regex {
    SEMVER_REGEX.get_or_init(|| Regex::new(SEMVER_PATTERN).expect("semver pattern is valid"))
}

/// Extracts every semantic version embedded in `text`, left to right.
///
/// Build metadata (`+...`) is matched but dropped from the returned value, so
/// `"1.0.0+20160513"` yields `"1.0.0"`.
///
/// # Errors
///
/// Returns [`ExtractError::NoVersionFound`] when the text contains no match.
///
/// # Examples
///
/// ```
/// use appcast::util::extract_semantic_versions;
///
/// let found = extract_semantic_versions("from 1.0.0 to 2.0.0-beta.1+exp").unwrap();
/// assert_eq!(found, vec!["1.0.0", "2.0.0-beta.1"]);
/// ```
pub fn extract_semantic_versions(text: &str) -> Result<Vec<String>, ExtractError> {
    let versions: Vec<String> = semver_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    if versions.is_empty() {
        return Err(ExtractError::NoVersionFound);
    }

    Ok(versions)
}

/// Parses a version string the way feeds actually write them.
///
/// Accepts strict semver plus three relaxations: surrounding whitespace, a
/// single leading `v`/`V`, and a numeric core of one or two components which
/// is padded with `.0` (`"2.1"` parses as `2.1.0`, `"1234"` as `1234.0.0`).
pub fn parse_version(text: &str) -> Result<Version, semver::Error> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);

    match Version::parse(trimmed) {
        Ok(version) => Ok(version),
        Err(err) => match pad_numeric_core(trimmed) {
            Some(padded) => Version::parse(&padded).map_err(|_| err),
            None => Err(err),
        },
    }
}

/// Pads `"1"` / `"1.2"` cores (keeping any `-pre`/`+build` tail) to three components.
fn pad_numeric_core(text: &str) -> Option<String> {
    let split = text.find(['-', '+']).unwrap_or(text.len());
    let (core, tail) = text.split_at(split);

    let all_numeric = core
        .split('.')
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
    if !all_numeric {
        return None;
    }

    match core.split('.').count() {
        1 => Some(format!("{core}.0.0{tail}")),
        2 => Some(format!("{core}.0{tail}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extract_single_version() {
        assert_eq!(
            extract_semantic_versions("Example 1.0.0").unwrap(),
            vec!["1.0.0"]
        );
    }

    #[test]
    fn test_extract_multiple_versions_in_order() {
        let found =
            extract_semantic_versions("/Project/2.0.1/project-2.0.1-rc.1.dmg 10.0.0").unwrap();
        assert_eq!(found, vec!["2.0.1", "2.0.1-rc.1.dmg", "10.0.0"]);
    }

    #[test]
    fn test_extract_drops_build_metadata() {
        let found = extract_semantic_versions("Release 1.2.3-beta+20160513.1 is out").unwrap();
        assert_eq!(found, vec!["1.2.3-beta"]);
    }

    #[test]
    fn test_extract_no_version() {
        assert_eq!(
            extract_semantic_versions("Version 1.2 only"),
            Err(ExtractError::NoVersionFound)
        );
        assert_eq!(
            extract_semantic_versions(""),
            Err(ExtractError::NoVersionFound)
        );
    }

    #[test]
    fn test_parse_version_strict() {
        let v = parse_version("2.0.0-beta").unwrap();
        assert_eq!(v.major, 2);
        assert_eq!(v.pre.as_str(), "beta");
    }

    #[test]
    fn test_parse_version_relaxations() {
        assert_eq!(parse_version(" v1.2.3 ").unwrap(), Version::new(1, 2, 3));
        assert_eq!(parse_version("2.1").unwrap(), Version::new(2, 1, 0));
        assert_eq!(parse_version("1234").unwrap(), Version::new(1234, 0, 0));
        assert_eq!(parse_version("2.1-rc1").unwrap().to_string(), "2.1.0-rc1");
    }

    #[test]
    fn test_parse_version_rejects_garbage() {
        assert!(parse_version("").is_err());
        assert!(parse_version("latest").is_err());
        assert!(parse_version("1.2.3.4").is_err());
        assert!(parse_version("1..2").is_err());
    }

    fn semver_strategy() -> impl Strategy<Value = String> {
        (
            0u32..1000,
            0u32..1000,
            0u32..1000,
            proptest::option::of(proptest::collection::vec("[a-z][a-z0-9]{0,5}", 1..3)),
        )
            .prop_map(|(major, minor, patch, pre)| match pre {
                Some(parts) => format!("{major}.{minor}.{patch}-{}", parts.join(".")),
                None => format!("{major}.{minor}.{patch}"),
            })
    }

    proptest! {
        #[test]
        fn prop_embedded_version_is_extracted(version in semver_strategy()) {
            let text = format!("Release {version} is available");
            prop_assert_eq!(extract_semantic_versions(&text).unwrap(), vec![version.clone()]);
        }

        #[test]
        fn prop_extracted_versions_parse(version in semver_strategy()) {
            let found = extract_semantic_versions(&version).unwrap();
            prop_assert!(parse_version(&found[0]).is_ok());
        }
    }
}
