//! `.env` file loading
//!
//! The project `.env` file must exist and parse; its contents are logged for
//! diagnostics and returned to the caller.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

use tracing::debug;

use crate::error::{EnvError, Result};
use crate::reporter::Reporter;

/// Key/value environment mapping
pub type EnvMap = BTreeMap<String, String>;

/// Snapshot of the process environment
pub fn process_env() -> EnvMap {
    std::env::vars().collect()
}

/// Read and parse `<dir>/<file_name>`.
///
/// A missing or unparsable file is reported through `reporter` and then
/// surfaced as [`EnvError::ConfigurationMissing`].
pub fn assert_dev_env_file(
    dir: &Path,
    file_name: &str,
    template_name: &str,
    reporter: &dyn Reporter,
) -> Result<EnvMap> {
    let env_path = dir.join(file_name);

    let content = match fs::read(&env_path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            reporter.warn(&format!(
                "\nNo {} file in {}\n\tYou may need to copy '{}' to '{}' to begin, or create your own '{}' file manually.",
                file_name,
                dir.display(),
                template_name,
                file_name,
                file_name,
            ));
            return Err(EnvError::ConfigurationMissing {
                path: env_path,
                reason: "file not found".to_string(),
            });
        }
        Err(e) => return Err(unreadable(&env_path, e.to_string(), reporter)),
    };

    let parsed = match parse_env(&content) {
        Ok(parsed) => parsed,
        Err(e) => return Err(unreadable(&env_path, e.to_string(), reporter)),
    };

    reporter.info(&format!("Using environment variables from {}", file_name));
    debug!("Env vars from {}: {:?}", env_path.display(), parsed);

    Ok(parsed)
}

fn unreadable(env_path: &Path, reason: String, reporter: &dyn Reporter) -> EnvError {
    reporter.warn(&format!(
        "\nCould not retrieve and parse {}. {}",
        env_path.display(),
        reason
    ));
    EnvError::ConfigurationMissing {
        path: env_path.to_path_buf(),
        reason,
    }
}

/// Parse dotenv syntax without touching the process environment.
///
/// `$NAME` and `${NAME}` are kept as literal text; values never pull from the
/// process environment.
pub fn parse_env(content: &[u8]) -> std::result::Result<EnvMap, dotenvy::Error> {
    let text = std::str::from_utf8(content)
        .map_err(|e| dotenvy::Error::Io(io::Error::new(ErrorKind::InvalidData, e)))?;
    let literal = escape_substitutions(text);
    dotenvy::from_read_iter(literal.as_bytes()).collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quoting {
    Unquoted,
    Single,
    Double,
    Comment,
}

/// Escape every `$` that dotenvy would expand: unquoted and double-quoted
/// text, outside comments. Single-quoted text is already literal.
fn escape_substitutions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quoting = Quoting::Unquoted;
    let mut escaped = false;
    // A `#` after whitespace or at line start opens a comment
    let mut at_boundary = true;

    for c in text.chars() {
        match quoting {
            Quoting::Comment => {
                if c == '\n' {
                    quoting = Quoting::Unquoted;
                    at_boundary = true;
                }
            }
            Quoting::Single => {
                if c == '\'' {
                    quoting = Quoting::Unquoted;
                    at_boundary = false;
                }
            }
            _ if escaped => {
                escaped = false;
                at_boundary = false;
            }
            Quoting::Double => match c {
                '\\' => escaped = true,
                '"' => {
                    quoting = Quoting::Unquoted;
                    at_boundary = false;
                }
                '$' => out.push('\\'),
                _ => {}
            },
            Quoting::Unquoted => {
                match c {
                    '#' if at_boundary => quoting = Quoting::Comment,
                    '\\' => escaped = true,
                    '\'' => quoting = Quoting::Single,
                    '"' => quoting = Quoting::Double,
                    '$' => out.push('\\'),
                    _ => {}
                }
                at_boundary = matches!(c, '\n' | ' ' | '\t');
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::MemoryReporter;
    use tempfile::TempDir;

    #[test]
    fn test_parse_env_syntax() {
        let parsed = parse_env(
            b"# comment\n\nPLAIN=value\nDOUBLE=\"hello world\"\nSINGLE='single quoted'\n",
        )
        .unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed["PLAIN"], "value");
        assert_eq!(parsed["DOUBLE"], "hello world");
        assert_eq!(parsed["SINGLE"], "single quoted");
    }

    #[test]
    fn test_dollar_signs_stay_literal() {
        std::env::set_var("BUILDPACK_ENV_TEST_SECRET", "leaked");

        let parsed = parse_env(
            b"A=$BUILDPACK_ENV_TEST_SECRET\n\
B=\"${BUILDPACK_ENV_TEST_SECRET}x\"\n\
C='$BUILDPACK_ENV_TEST_SECRET'\n\
D=\\$ALREADY_ESCAPED\n\
E=price$5 # costs $5\n\
# comment with a ' quote and $VAR\n\
F=after\n",
        )
        .unwrap();

        assert_eq!(parsed["A"], "$BUILDPACK_ENV_TEST_SECRET");
        assert_eq!(parsed["B"], "${BUILDPACK_ENV_TEST_SECRET}x");
        assert_eq!(parsed["C"], "$BUILDPACK_ENV_TEST_SECRET");
        assert_eq!(parsed["D"], "$ALREADY_ESCAPED");
        assert_eq!(parsed["E"], "price$5");
        assert_eq!(parsed["F"], "after");
        assert!(parsed.values().all(|v| !v.contains("leaked")));
    }

    #[test]
    fn test_invalid_utf8_is_a_parse_error() {
        assert!(parse_env(b"A=\xff\xfe\n").is_err());
    }

    #[test]
    fn test_process_env_snapshot() {
        std::env::set_var("BUILDPACK_ENV_TEST_SNAPSHOT", "present");

        let env = process_env();

        assert_eq!(
            env.get("BUILDPACK_ENV_TEST_SNAPSHOT").map(String::as_str),
            Some("present")
        );
    }

    #[test]
    fn test_reads_env_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".env"), "MAGENTO_BACKEND_URL=https://example.com/\n").unwrap();

        let reporter = MemoryReporter::new();
        let parsed = assert_dev_env_file(tmp.path(), ".env", ".env.dist", &reporter).unwrap();

        assert_eq!(parsed["MAGENTO_BACKEND_URL"], "https://example.com/");
        assert_eq!(reporter.infos(), vec!["Using environment variables from .env"]);
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn test_missing_env_file() {
        let tmp = TempDir::new().unwrap();
        let reporter = MemoryReporter::new();

        let err = assert_dev_env_file(tmp.path(), ".env", ".env.dist", &reporter).unwrap_err();

        match err {
            EnvError::ConfigurationMissing { path, .. } => assert_eq!(path, tmp.path().join(".env")),
            other => panic!("Expected ConfigurationMissing, got {:?}", other),
        }
        let warnings = reporter.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("copy '.env.dist' to '.env'"));
    }

    #[test]
    fn test_unparsable_env_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".env"), "NOT A VALID LINE\n").unwrap();
        let reporter = MemoryReporter::new();

        let err = assert_dev_env_file(tmp.path(), ".env", ".env.dist", &reporter).unwrap_err();

        assert!(matches!(err, EnvError::ConfigurationMissing { .. }));
        assert!(reporter.warnings()[0].contains("Could not retrieve and parse"));
        assert!(reporter.infos().is_empty());
    }

    #[test]
    fn test_env_file_is_a_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join(".env")).unwrap();
        let reporter = MemoryReporter::new();

        let err = assert_dev_env_file(tmp.path(), ".env", ".env.dist", &reporter).unwrap_err();

        assert!(matches!(err, EnvError::ConfigurationMissing { .. }));
        assert_eq!(reporter.warnings().len(), 1);
    }
}
