//! Integration tests for config

#[cfg(test)]
mod tests {
    use mirrorcheck_config::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: &[&str] = &[
        "MIRRORCHECK_BASE",
        "MIRRORCHECK_REPO",
        "MIRRORCHECK_KEYRING",
        "MIRRORCHECK_JOBS",
        "MIRRORCHECK_INSECURE",
        "MIRRORCHECK_PRUNE",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[paths]
base = "/srv/mirror"
repo = "/7/os/x86_64/"
keyring = "/etc/mirrorcheck/keys"

[security]
verify_signatures = false

[scan]
jobs = 4
io_timeout_secs = 30
supplementary_catalogs = true

[prune]
mode = "report"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.base_path(), PathBuf::from("/srv/mirror"));
        assert_eq!(config.repo_path(), "7/os/x86_64");
        assert!(!config.security.verify_signatures);
        assert_eq!(config.jobs(), 4);
        assert_eq!(config.io_timeout(), Some(std::time::Duration::from_secs(30)));
        assert!(config.scan.supplementary_catalogs);
        assert_eq!(config.scan.package_suffix, ".rpm");
        assert_eq!(config.prune.mode, PruneMode::Report);
    }

    #[tokio::test]
    async fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_path(), PathBuf::from("."));
        assert_eq!(config.repo_path(), "");
        assert_eq!(config.keyring_path(), PathBuf::from("keys/"));
        assert_eq!(config.output(), "-");
        assert!(config.security.verify_signatures);
        assert_eq!(config.io_timeout(), None);
        assert_eq!(config.prune.mode, PruneMode::Off);
        assert!((1..=constants::MAX_AUTO_JOBS).contains(&config.jobs()));
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[scan]\njobs = \"many\"").unwrap();
        assert!(Config::load_from_file(temp_file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_package_suffix_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[scan]\npackage_suffix = \"\"").unwrap();
        assert!(Config::load_from_file(temp_file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = Config::load_from_file(std::path::Path::new("/nonexistent/config.toml")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("MIRRORCHECK_BASE", "/data/mirror");
        std::env::set_var("MIRRORCHECK_JOBS", "3");
        std::env::set_var("MIRRORCHECK_INSECURE", "yes");
        std::env::set_var("MIRRORCHECK_PRUNE", "delete");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.base_path(), PathBuf::from("/data/mirror"));
        assert_eq!(config.jobs(), 3);
        assert!(!config.security.verify_signatures);
        assert_eq!(config.prune.mode, PruneMode::Delete);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("MIRRORCHECK_PRUNE", "sometimes");
        let mut config = Config::default();
        assert!(config.merge_env().is_err());
        clear_env();

        std::env::set_var("MIRRORCHECK_JOBS", "-2");
        let mut config = Config::default();
        assert!(config.merge_env().is_err());
        clear_env();
    }

    #[test]
    fn test_calculate_jobs() {
        assert_eq!(calculate_jobs(7), 7);
        let auto = calculate_jobs(0);
        assert!(auto >= 1 && auto <= constants::MAX_AUTO_JOBS);
    }
}
