//! End-to-end tests of a check run over a signed fixture mirror

#[cfg(test)]
mod tests {
    use mirrorcheck_config::{Config, PruneMode};
    use mirrorcheck_errors::{Error, SigningError};
    use mirrorcheck_events::{
        channel, AppEvent, CatalogEvent, EventReceiver, GeneralEvent, TrustEvent,
    };
    use mirrorcheck_ops::*;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;

    const X_LINE: &str = "{sha256}f8d1a27f9fc1c282d1dc824050db5372c38ca95bb71dc429355577f3007af59d 18 Packages/x-1.0-1.noarch.rpm";
    const Y_LINE: &str = "{sha}a2bff18847662fd5fb08189c0bd08c3b3dcb68a6 35 Packages/y-2.0-1.noarch.rpm";

    fn fixtures() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
    }

    fn copy_tree(from: &Path, to: &Path) {
        std::fs::create_dir_all(to).unwrap();
        for entry in std::fs::read_dir(from).unwrap() {
            let entry = entry.unwrap();
            let target = to.join(entry.file_name());
            if entry.file_type().unwrap().is_dir() {
                copy_tree(&entry.path(), &target);
            } else {
                std::fs::copy(entry.path(), &target).unwrap();
            }
        }
    }

    /// Copies the fixture mirror under `dir/base/<repo>` and returns the base
    fn mirror(dir: &TempDir, repo: &str) -> PathBuf {
        let base = dir.path().join("base");
        copy_tree(&fixtures().join("mirror"), &base.join(repo));
        base
    }

    fn config(base: &Path, repo: &str, key: &str) -> Config {
        let mut config = Config::default();
        config.paths.base = Some(base.to_path_buf());
        config.paths.repo = Some(repo.to_string());
        config.paths.keyring = Some(fixtures().join("keys").join(key));
        config.scan.jobs = 2;
        config
    }

    async fn run(config: Config) -> (Result<RunOutcome, Error>, Arc<MemorySink>, EventReceiver) {
        let (tx, rx) = channel();
        let sink = Arc::new(MemorySink::new());
        let ctx = CheckContextBuilder::new()
            .with_config(config)
            .with_event_sender(tx)
            .with_sink(sink.clone())
            .build()
            .unwrap();
        let result = run_check(&ctx).await;
        (result, sink, rx)
    }

    fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_intact_signed_mirror_succeeds() {
        let dir = TempDir::new().unwrap();
        let base = mirror(&dir, "");

        let (result, sink, _rx) = run(config(&base, "", "mirror.gpg")).await;
        let outcome = result.unwrap();

        assert!(outcome.success());
        assert_eq!(sink.contents(), "");
        assert_eq!(outcome.signer.as_deref(), Some("D230F0A6EBAA8CE1"));
        assert_eq!(outcome.catalog_entries, 2);
        assert_eq!(outcome.checked, 2);
        assert_eq!(
            outcome.stages,
            vec![
                Stage::Start,
                Stage::TrustEstablished,
                Stage::IndexResolved,
                Stage::CatalogBuilt,
                Stage::Reconciled,
                Stage::Done
            ]
        );
    }

    #[tokio::test]
    async fn test_untrusted_index_is_fatal_before_any_report() {
        let dir = TempDir::new().unwrap();
        let base = mirror(&dir, "");
        std::fs::write(base.join("Packages/x-1.0-1.noarch.rpm"), "tampered").unwrap();

        let (result, sink, mut rx) = run(config(&base, "", "unrelated.gpg")).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Signing(SigningError::NoMatchingKey { .. })
        ));
        assert!(sink.lines().is_empty());
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            AppEvent::General(GeneralEvent::OperationFailed { operation, .. }) if operation == "check"
        )));
    }

    #[tokio::test]
    async fn test_altered_and_missing_packages_fail_the_run() {
        let dir = TempDir::new().unwrap();
        let base = mirror(&dir, "");
        std::fs::write(base.join("Packages/x-1.0-1.noarch.rpm"), "x package payloaD\n").unwrap();
        std::fs::remove_file(base.join("Packages/y-2.0-1.noarch.rpm")).unwrap();

        let (result, sink, _rx) = run(config(&base, "", "mirror.gpg")).await;
        let outcome = result.unwrap();

        assert!(!outcome.success());
        assert_eq!(outcome.package_failures, 2);
        assert_eq!(sink.lines(), vec![X_LINE.to_string(), Y_LINE.to_string()]);
    }

    #[tokio::test]
    async fn test_repeated_runs_produce_identical_reports() {
        let dir = TempDir::new().unwrap();
        let base = mirror(&dir, "");
        std::fs::write(base.join("Packages/y-2.0-1.noarch.rpm"), "changed").unwrap();

        let (first, first_sink, _rx) = run(config(&base, "", "mirror.gpg")).await;
        let (second, second_sink, _rx) = run(config(&base, "", "mirror.gpg")).await;
        assert!(!first.unwrap().success());
        assert!(!second.unwrap().success());
        assert_eq!(first_sink.contents(), second_sink.contents());
        assert_eq!(first_sink.contents(), format!("{Y_LINE}\n"));
    }

    #[tokio::test]
    async fn test_supplementary_disagreement_keeps_primary_record() {
        let dir = TempDir::new().unwrap();
        let base = mirror(&dir, "");
        std::fs::write(
            base.join("repodata/extra-primary.xml"),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://linux.duke.edu/metadata/common" packages="1">
<package type="rpm">
  <name>x</name>
  <arch>noarch</arch>
  <checksum type="sha256" pkgid="YES">0000000000000000000000000000000000000000000000000000000000000000</checksum>
  <size package="18" installed="0" archive="0"/>
  <location href="Packages/x-1.0-1.noarch.rpm"/>
</package>
</metadata>
"#,
        )
        .unwrap();
        let mut config = config(&base, "", "mirror.gpg");
        config.scan.supplementary_catalogs = true;

        let (result, sink, mut rx) = run(config).await;
        let outcome = result.unwrap();

        assert!(outcome.success());
        assert_eq!(sink.contents(), "");
        assert_eq!(outcome.catalog_entries, 2);
        assert_eq!(outcome.passed, 2);
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            AppEvent::Catalog(CatalogEvent::ChecksumDisagreement { path, .. })
                if path == "Packages/x-1.0-1.noarch.rpm"
        )));
    }

    #[tokio::test]
    async fn test_repo_subpath_prefixes_report_paths() {
        let dir = TempDir::new().unwrap();
        let base = mirror(&dir, "7/os/x86_64");
        std::fs::remove_file(base.join("7/os/x86_64/Packages/x-1.0-1.noarch.rpm")).unwrap();

        let (result, sink, _rx) = run(config(&base, "/7/os/x86_64/", "mirror.gpg")).await;
        assert!(!result.unwrap().success());
        assert_eq!(
            sink.lines(),
            vec![X_LINE.replace(" Packages/", " 7/os/x86_64/Packages/")]
        );
    }

    #[tokio::test]
    async fn test_corrupt_secondary_metadata_is_reported() {
        let dir = TempDir::new().unwrap();
        let base = mirror(&dir, "");
        let filelists = std::fs::read_dir(base.join("repodata"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .find(|p| p.to_string_lossy().contains("-filelists"))
            .unwrap();
        std::fs::write(&filelists, "garbage").unwrap();

        let (result, sink, _rx) = run(config(&base, "", "mirror.gpg")).await;
        let outcome = result.unwrap();
        assert!(!outcome.success());
        assert_eq!(outcome.metadata_failures, 1);
        assert_eq!(outcome.package_failures, 0);
        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("{sha256}100702968db3c7f0"));
        assert!(lines[0].ends_with(" 124 repodata/100702968db3c7f0f462c88fbdd3b9f133814c746a8db8a708144d1b8b88d896-filelists.xml.gz"));
    }

    #[tokio::test]
    async fn test_prune_report_lists_orphans_without_removing() {
        let dir = TempDir::new().unwrap();
        let base = mirror(&dir, "");
        std::fs::write(base.join("Packages/old-0.9-1.noarch.rpm"), "old").unwrap();
        let mut config = config(&base, "", "mirror.gpg");
        config.prune.mode = PruneMode::Report;

        let (result, sink, _rx) = run(config).await;
        let outcome = result.unwrap();
        assert!(outcome.success());
        assert!(outcome.reached(Stage::Pruned));
        assert_eq!(outcome.orphans, 1);
        assert_eq!(sink.lines(), vec!["Packages/old-0.9-1.noarch.rpm".to_string()]);
        assert!(base.join("Packages/old-0.9-1.noarch.rpm").exists());
    }

    #[tokio::test]
    async fn test_prune_delete_removes_orphans_only() {
        let dir = TempDir::new().unwrap();
        let base = mirror(&dir, "");
        std::fs::write(base.join("Packages/old-0.9-1.noarch.rpm"), "old").unwrap();
        let mut config = config(&base, "", "mirror.gpg");
        config.prune.mode = PruneMode::Delete;

        let (result, sink, _rx) = run(config).await;
        let outcome = result.unwrap();
        assert!(outcome.success());
        assert_eq!(outcome.removed, 1);
        assert!(sink.lines().is_empty());
        assert!(!base.join("Packages/old-0.9-1.noarch.rpm").exists());
        assert!(base.join("Packages/x-1.0-1.noarch.rpm").exists());
        assert!(base.join("Packages/y-2.0-1.noarch.rpm").exists());
    }

    #[tokio::test]
    async fn test_insecure_mode_skips_keyring_and_logs_downgrade() {
        let dir = TempDir::new().unwrap();
        let base = mirror(&dir, "");
        std::fs::remove_file(base.join("repodata/repomd.xml.asc")).unwrap();
        let mut config = config(&base, "", "does-not-exist.gpg");
        config.security.verify_signatures = false;

        let (result, _sink, mut rx) = run(config).await;
        let outcome = result.unwrap();
        assert!(outcome.success());
        assert!(outcome.signer.is_none());
        assert!(!outcome.reached(Stage::TrustEstablished));
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, AppEvent::Trust(TrustEvent::TrustDisabled { .. }))));
    }

    #[tokio::test]
    async fn test_missing_keyring_is_fatal_when_enforced() {
        let dir = TempDir::new().unwrap();
        let base = mirror(&dir, "");
        let (result, _sink, _rx) = run(config(&base, "", "does-not-exist.gpg")).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Signing(SigningError::KeyringNotFound { .. })
        ));
    }

    #[test]
    fn test_builder_requires_sender_and_sink() {
        assert!(CheckContextBuilder::new().build().is_err());
        let (tx, _rx) = channel();
        assert!(CheckContextBuilder::new()
            .with_event_sender(tx)
            .build()
            .is_err());
    }
}
