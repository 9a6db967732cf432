//! Version information for the application, populated at build time.
//!
//! Version label format:
//! - Prod: `stable:{version}`
//! - Local/Test: `main:{commit}`

/// Environment the service was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnv {
    Local,
    Prod,
    Test,
}

/// Get the build date in RFC3339 format
pub fn build_date() -> &'static str {
    env!("BUILD_DATE")
}

/// Get the git commit hash (short)
pub fn build_commit() -> &'static str {
    env!("BUILD_COMMIT")
}

/// Get the package version
pub fn build_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Build date without the time part, e.g. `2026-01-03`.
pub fn build_day() -> &'static str {
    let date = build_date();
    date.get(..10).unwrap_or(date)
}

/// Format version string for a runtime-determined environment.
pub fn format_version_for_runtime_env(env: RuntimeEnv) -> String {
    match env {
        RuntimeEnv::Local | RuntimeEnv::Test => format!("main:{}", build_commit()),
        RuntimeEnv::Prod => format!("stable:{}", build_version()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_constants_are_set() {
        assert!(!build_date().is_empty());
        assert!(!build_commit().is_empty());
        assert!(!build_version().is_empty());
    }

    #[test]
    fn build_day_is_a_date() {
        let day = build_day();
        assert!(day.len() <= 10);
        assert!(build_date().starts_with(day));
    }

    #[test]
    fn local_and_test_report_commit() {
        let expected = format!("main:{}", build_commit());
        assert_eq!(format_version_for_runtime_env(RuntimeEnv::Local), expected);
        assert_eq!(format_version_for_runtime_env(RuntimeEnv::Test), expected);
    }

    #[test]
    fn prod_reports_package_version() {
        let version = format_version_for_runtime_env(RuntimeEnv::Prod);
        assert_eq!(version, format!("stable:{}", build_version()));
    }
}
