//! Preflight checks behind `repowatch doctor`
//!
//! Verifies that git is usable, the data directory accepts writes and both
//! store files (when present) can be parsed.

use crate::config::Config;
use crate::favorites::FavoritesStore;
use crate::registry::RepoRegistry;
use std::path::Path;

/// Result of system health checks
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Git installation status
    pub git: CheckResult,
    /// Data directory status
    pub data_dir: CheckResult,
    /// Favorites file status
    pub favorites: CheckResult,
    /// Clone registry file status
    pub registry: CheckResult,
    /// SSH configuration status (warning only, not required)
    pub ssh: CheckResult,
}

/// Result of an individual health check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::ok(message)
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: true,
        }
    }
}

impl HealthCheck {
    /// Run all health checks
    pub fn run(config: &Config) -> Self {
        Self {
            git: Self::check_git(),
            data_dir: Self::check_data_dir(Path::new(&config.storage.data_dir)),
            favorites: Self::check_favorites(&FavoritesStore::new(config.favorites_path())),
            registry: Self::check_registry(&RepoRegistry::new(config.registry_path())),
            ssh: Self::check_ssh(),
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.errors().is_empty()
    }

    /// Get list of failed checks (errors only, not warnings)
    pub fn errors(&self) -> Vec<&CheckResult> {
        self.all_checks()
            .into_iter()
            .map(|(_, r)| r)
            .filter(|r| !r.passed && !r.is_warning)
            .collect()
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&CheckResult> {
        self.all_checks()
            .into_iter()
            .map(|(_, r)| r)
            .filter(|r| r.is_warning)
            .collect()
    }

    /// One-line verdict for the end of the report
    pub fn summary(&self) -> String {
        let warnings = match self.warnings().len() {
            0 => String::new(),
            1 => " (1 warning)".to_string(),
            n => format!(" ({} warnings)", n),
        };
        match self.errors().len() {
            0 => format!("All checks passed{}", warnings),
            n => format!("{} of {} checks failed{}", n, self.all_checks().len(), warnings),
        }
    }

    fn check_git() -> CheckResult {
        match std::process::Command::new("git").arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                CheckResult::ok_with_details("Git installed", version.trim().to_string())
            }
            Ok(output) => CheckResult::error_with_details(
                "Git command failed",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ),
            Err(_) => CheckResult::error_with_details(
                "Git not found in PATH",
                "Install git: https://git-scm.com/downloads",
            ),
        }
    }

    /// The store files are written next to each other; try a throwaway temp file
    fn check_data_dir(dir: &Path) -> CheckResult {
        if !dir.exists() {
            return CheckResult::error_with_details(
                "Data directory does not exist",
                format!("Run: mkdir -p {}", dir.display()),
            );
        }

        match tempfile::NamedTempFile::new_in(dir) {
            Ok(_) => CheckResult::ok_with_details("Data directory writable", dir.display().to_string()),
            Err(e) => CheckResult::error_with_details(
                "Data directory not writable",
                format!("{}: {}", dir.display(), e),
            ),
        }
    }

    fn check_favorites(store: &FavoritesStore) -> CheckResult {
        if !store.path().exists() {
            return CheckResult::ok("No favorites file yet");
        }
        match store.load() {
            Ok(entries) => CheckResult::ok_with_details(
                "Favorites file readable",
                format!("{} favorites in {}", entries.len(), store.path().display()),
            ),
            Err(e) => CheckResult::error_with_details("Favorites file unreadable", e.to_string()),
        }
    }

    fn check_registry(registry: &RepoRegistry) -> CheckResult {
        if !registry.path().exists() {
            return CheckResult::ok("No clone registry yet");
        }
        match registry.load() {
            Ok(repos) => CheckResult::ok_with_details(
                "Clone registry readable",
                format!("{} clones in {}", repos.len(), registry.path().display()),
            ),
            Err(e) => CheckResult::error_with_details("Clone registry unreadable", e.to_string()),
        }
    }

    /// Check SSH configuration (warning only)
    fn check_ssh() -> CheckResult {
        let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");
        if !ssh_dir.exists() {
            return CheckResult::warning_with_details(
                "~/.ssh directory not found",
                "git@ URLs will not work without SSH keys",
            );
        }

        let found_keys: Vec<_> = ["id_rsa", "id_ed25519", "id_ecdsa"]
            .into_iter()
            .filter(|key| ssh_dir.join(key).exists())
            .collect();

        if found_keys.is_empty() {
            CheckResult::warning_with_details(
                "No SSH keys found",
                "git@ URLs may fail. Run: ssh-keygen -t ed25519",
            )
        } else {
            CheckResult::ok_with_details("SSH keys found", found_keys.join(", "))
        }
    }

    /// Get all checks as a slice for iteration
    pub fn all_checks(&self) -> [(&'static str, &CheckResult); 5] {
        [
            ("Git Installation", &self.git),
            ("Data Directory", &self.data_dir),
            ("Favorites File", &self.favorites),
            ("Clone Registry", &self.registry),
            ("SSH Configuration", &self.ssh),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::FavoriteEntry;
    use tempfile::TempDir;

    fn healthy() -> HealthCheck {
        HealthCheck {
            git: CheckResult::ok("Git OK"),
            data_dir: CheckResult::ok("Dir OK"),
            favorites: CheckResult::ok("Favorites OK"),
            registry: CheckResult::ok("Registry OK"),
            ssh: CheckResult::ok("SSH OK"),
        }
    }

    #[test]
    fn test_check_result_constructors() {
        let ok = CheckResult::ok_with_details("Test passed", "Some details");
        assert!(ok.passed);
        assert!(!ok.is_warning);
        assert_eq!(ok.details, Some("Some details".to_string()));

        let warning = CheckResult::warning_with_details("Test warning", "w");
        assert!(warning.passed); // Warnings still "pass"
        assert!(warning.is_warning);

        let error = CheckResult::error_with_details("Test failed", "e");
        assert!(!error.passed);
        assert!(!error.is_warning);
    }

    #[test]
    fn test_git_check() {
        let result = HealthCheck::check_git();
        // Git should be installed in dev environment
        assert!(result.passed);
        assert!(result.details.is_some());
    }

    #[test]
    fn test_check_data_dir_existing() {
        let temp_dir = TempDir::new().unwrap();
        let result = HealthCheck::check_data_dir(temp_dir.path());
        assert!(result.passed);
        // the temp file is gone again
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_check_data_dir_nonexistent() {
        let result = HealthCheck::check_data_dir(Path::new("/nonexistent/path/that/does/not/exist"));
        assert!(!result.passed);
        assert!(result.details.unwrap().contains("mkdir -p"));
    }

    #[test]
    fn test_store_checks_without_files_pass() {
        let temp_dir = TempDir::new().unwrap();
        let favorites = FavoritesStore::new(temp_dir.path().join("f.json"));
        let registry = RepoRegistry::new(temp_dir.path().join("r.json"));

        assert!(HealthCheck::check_favorites(&favorites).passed);
        assert!(HealthCheck::check_registry(&registry).passed);
    }

    #[test]
    fn test_store_checks_report_counts_and_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let favorites = FavoritesStore::new(temp_dir.path().join("f.json"));
        favorites.add(FavoriteEntry::new("u", "/p")).unwrap();

        let result = HealthCheck::check_favorites(&favorites);
        assert!(result.passed);
        assert!(result.details.unwrap().starts_with("1 favorites"));

        let registry_path = temp_dir.path().join("r.json");
        std::fs::write(&registry_path, "[not an object").unwrap();
        let result = HealthCheck::check_registry(&RepoRegistry::new(registry_path));
        assert!(!result.passed);
    }

    #[test]
    fn test_check_ssh() {
        let result = HealthCheck::check_ssh();
        // Result depends on system, but should not error
        assert!(result.passed || result.is_warning);
    }

    #[test]
    fn test_all_passed_ignores_warnings() {
        let health = HealthCheck {
            ssh: CheckResult::warning_with_details("No SSH keys", "hint"),
            ..healthy()
        };
        assert!(health.all_passed());
        assert_eq!(health.warnings().len(), 1);
    }

    #[test]
    fn test_failures_are_collected() {
        let health = HealthCheck {
            git: CheckResult::error_with_details("Git missing", "install"),
            registry: CheckResult::error_with_details("Registry broken", "parse"),
            ssh: CheckResult::warning_with_details("SSH warning", "hint"),
            ..healthy()
        };
        assert!(!health.all_passed());

        let errors = health.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "Git missing");
        assert_eq!(errors[1].message, "Registry broken");
    }

    #[test]
    fn test_summary_counts_failures_and_warnings() {
        assert_eq!(healthy().summary(), "All checks passed");

        let warned = HealthCheck {
            ssh: CheckResult::warning_with_details("No SSH keys", "hint"),
            ..healthy()
        };
        assert_eq!(warned.summary(), "All checks passed (1 warning)");

        let broken = HealthCheck {
            git: CheckResult::error_with_details("Git missing", "install"),
            favorites: CheckResult::error_with_details("Favorites broken", "parse"),
            ssh: CheckResult::warning_with_details("No SSH keys", "hint"),
            data_dir: CheckResult::warning_with_details("Odd dir", "hint"),
            ..healthy()
        };
        assert_eq!(broken.summary(), "2 of 5 checks failed (2 warnings)");
    }

    #[test]
    fn test_all_checks_names() {
        let health = healthy();
        let names: Vec<_> = health.all_checks().iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "Git Installation",
                "Data Directory",
                "Favorites File",
                "Clone Registry",
                "SSH Configuration"
            ]
        );
    }
}
