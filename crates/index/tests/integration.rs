//! Integration tests for index resolution and catalog building

#[cfg(test)]
mod tests {
    use mirrorcheck_errors::{Error, MetadataError, SigningError};
    use mirrorcheck_events::{channel, AppEvent, CatalogEvent, EventReceiver, MetadataEvent, TrustEvent};
    use mirrorcheck_hash::{Checksum, ChecksumAlgorithm};
    use mirrorcheck_index::*;
    use mirrorcheck_signing::{load_keyring, TrustPolicy};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn fixture_mirror() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mirror")
    }

    fn key_fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../signing/tests/fixtures/keys")
            .join(name)
    }

    fn sha256(data: &[u8]) -> String {
        Checksum::from_data(ChecksumAlgorithm::Sha256, data)
            .to_hex()
            .to_string()
    }

    fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn write(path: &Path, bytes: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    fn package_xml(name: &str, href: &str, checksum: &str, size: u64) -> String {
        format!(
            r#"<package type="rpm"><name>{name}</name><arch>noarch</arch><checksum type="sha256" pkgid="YES">{checksum}</checksum><size package="{size}" installed="0" archive="0"/><location href="{href}"/></package>"#
        )
    }

    fn primary_xml(packages: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><metadata xmlns="http://linux.duke.edu/metadata/common" packages="{}">{}</metadata>"#,
            packages.len(),
            packages.concat()
        )
    }

    /// (type, href, checksum, size)
    fn repomd_xml(entries: &[(&str, &str, String, u64)]) -> String {
        let data: String = entries
            .iter()
            .map(|(kind, href, checksum, size)| {
                format!(
                    r#"<data type="{kind}"><checksum type="sha256">{checksum}</checksum><location href="{href}"/><size>{size}</size></data>"#
                )
            })
            .collect();
        format!(r#"<?xml version="1.0"?><repomd xmlns="http://linux.duke.edu/metadata/repo"><revision>7</revision>{data}</repomd>"#)
    }

    /// Writes a repository with one package and plain-XML metadata under
    /// `root/repo`. Returns the primary document for reuse.
    fn write_repo(root: &Path, repo: &str, corrupt_filelists: bool, corrupt_primary: bool) -> String {
        let repo_root = root.join(repo);
        let payload = b"a payload\n";
        write(&repo_root.join("Packages/a-1.0.rpm"), payload);

        let primary = primary_xml(&[package_xml(
            "a",
            "Packages/a-1.0.rpm",
            &sha256(payload),
            payload.len() as u64,
        )]);
        let filelists = "<filelists packages=\"1\"/>";
        write(&repo_root.join("repodata/p-primary.xml"), primary.as_bytes());
        write(&repo_root.join("repodata/f-filelists.xml"), filelists.as_bytes());

        let primary_sum = if corrupt_primary { sha256(b"other") } else { sha256(primary.as_bytes()) };
        let filelists_sum = if corrupt_filelists { sha256(b"other") } else { sha256(filelists.as_bytes()) };
        let repomd = repomd_xml(&[
            ("primary", "repodata/p-primary.xml", primary_sum, primary.len() as u64),
            ("filelists", "repodata/f-filelists.xml", filelists_sum, filelists.len() as u64),
        ]);
        write(&repo_root.join("repodata/repomd.xml"), repomd.as_bytes());
        primary
    }

    #[tokio::test]
    async fn test_fixture_mirror_resolves_and_builds() {
        let (tx, _rx) = channel();
        let location = IndexLocation::new(fixture_mirror(), "");

        let resolved = resolve_index(&location, &TrustPolicy::Disabled, &tx).await.unwrap();
        assert!(resolved.failures.is_empty());
        assert_eq!(resolved.revision.as_deref(), Some("1792368000"));
        assert_eq!(resolved.entries.len(), 2);
        assert!(resolved.primary.is_primary());
        assert!(resolved.signature.is_none());

        let catalog = build_catalog(&resolved, &CatalogOptions::default(), &tx).await.unwrap();
        assert_eq!(catalog.len(), 2);
        let x = catalog.get("Packages/x-1.0-1.noarch.rpm").unwrap();
        assert_eq!(x.algorithm, "sha256");
        assert_eq!(x.package_size, 18);
        let y = catalog.get("Packages/y-2.0-1.noarch.rpm").unwrap();
        assert_eq!(y.algorithm, "sha");
        assert_eq!(y.expected().unwrap().algorithm(), ChecksumAlgorithm::Sha1);
    }

    #[tokio::test]
    async fn test_signed_index_passes_trust_gate() {
        let (tx, mut rx) = channel();
        let keyring = load_keyring(&key_fixture("mirror.gpg")).unwrap();
        let location = IndexLocation::new(fixture_mirror(), "");

        let resolved = resolve_index(&location, &TrustPolicy::Enforced(keyring), &tx)
            .await
            .unwrap();
        let signature = resolved.signature.unwrap();
        assert_eq!(signature.assertion.issuer.to_string(), "D230F0A6EBAA8CE1");

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::Trust(TrustEvent::SignatureVerified { .. }))));
    }

    #[tokio::test]
    async fn test_untrusted_signer_is_fatal_before_checksums() {
        let (tx, mut rx) = channel();
        let keyring = load_keyring(&key_fixture("unrelated.gpg")).unwrap();
        let location = IndexLocation::new(fixture_mirror(), "");

        let err = resolve_index(&location, &TrustPolicy::Enforced(keyring), &tx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Signing(SigningError::NoMatchingKey { .. })
        ));

        let events = drain(&mut rx);
        assert!(!events
            .iter()
            .any(|e| matches!(e, AppEvent::Metadata(MetadataEvent::EntryChecking { .. }))));
    }

    #[tokio::test]
    async fn test_missing_signature_is_fatal_when_enforced() {
        let dir = TempDir::new().unwrap();
        write_repo(dir.path(), "", false, false);
        let (tx, _rx) = channel();
        let keyring = load_keyring(&key_fixture("mirror.gpg")).unwrap();

        let location = IndexLocation::new(dir.path(), "");
        assert!(resolve_index(&location, &TrustPolicy::Enforced(keyring), &tx)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_corrupt_secondary_metadata_is_reported() {
        let dir = TempDir::new().unwrap();
        write_repo(dir.path(), "7/os", true, false);
        let (tx, _rx) = channel();

        let location = IndexLocation::new(dir.path(), "/7/os/");
        let resolved = resolve_index(&location, &TrustPolicy::Disabled, &tx).await.unwrap();

        assert_eq!(resolved.failures.len(), 1);
        let line = &resolved.failures[0];
        assert_eq!(line.path, "7/os/repodata/f-filelists.xml");
        assert_eq!(line.checksum, sha256(b"other"));
        assert!(line.to_string().starts_with("{sha256}"));
        assert_eq!(resolved.primary_path, dir.path().join("7/os/repodata/p-primary.xml"));

        let catalog = build_catalog(&resolved, &CatalogOptions::default(), &tx).await.unwrap();
        assert!(catalog.contains("7/os/Packages/a-1.0.rpm"));
    }

    #[tokio::test]
    async fn test_corrupt_primary_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_repo(dir.path(), "", false, true);
        let (tx, _rx) = channel();

        let location = IndexLocation::new(dir.path(), "");
        let err = resolve_index(&location, &TrustPolicy::Disabled, &tx).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Metadata(MetadataError::PrimaryNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_index_is_fatal() {
        let dir = TempDir::new().unwrap();
        let (tx, _rx) = channel();
        let location = IndexLocation::new(dir.path(), "");
        let err = resolve_index(&location, &TrustPolicy::Disabled, &tx).await.unwrap_err();
        assert!(matches!(err, Error::Metadata(MetadataError::Unreadable { .. })));
    }

    #[tokio::test]
    async fn test_unparseable_index_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("repodata/repomd.xml"), b"<repomd><data type=");
        let (tx, _rx) = channel();
        let location = IndexLocation::new(dir.path(), "");
        let err = resolve_index(&location, &TrustPolicy::Disabled, &tx).await.unwrap_err();
        assert!(matches!(err, Error::Metadata(MetadataError::ParseError { .. })));
    }

    #[tokio::test]
    async fn test_explicit_repodata_directory() {
        let dir = TempDir::new().unwrap();
        write_repo(dir.path(), "repo", false, false);
        let snapshot = dir.path().join("snapshot");
        std::fs::create_dir(&snapshot).unwrap();
        std::fs::copy(
            dir.path().join("repo/repodata/repomd.xml"),
            snapshot.join("repomd.xml"),
        )
        .unwrap();
        let (tx, _rx) = channel();

        let location = IndexLocation::new(dir.path(), "repo").with_repodata(&snapshot);
        let resolved = resolve_index(&location, &TrustPolicy::Disabled, &tx).await.unwrap();
        assert!(resolved.failures.is_empty());
        assert_eq!(resolved.primary_path, dir.path().join("repo/repodata/p-primary.xml"));
    }

    #[tokio::test]
    async fn test_supplementary_catalog_is_first_seen_wins() {
        let dir = TempDir::new().unwrap();
        write_repo(dir.path(), "", false, false);
        let payload = b"a payload\n";
        let supplementary = primary_xml(&[
            package_xml("a", "Packages/a-1.0.rpm", &sha256(b"tampered"), 8),
            package_xml("b", "Packages/b-2.0.rpm", &sha256(b"b"), 1),
        ]);
        write(
            &dir.path().join("repodata/old-primary.xml"),
            supplementary.as_bytes(),
        );
        let (tx, mut rx) = channel();

        let location = IndexLocation::new(dir.path(), "");
        let resolved = resolve_index(&location, &TrustPolicy::Disabled, &tx).await.unwrap();

        let without = build_catalog(&resolved, &CatalogOptions::default(), &tx).await.unwrap();
        assert_eq!(without.len(), 1);

        let options = CatalogOptions { supplementary: true };
        let catalog = build_catalog(&resolved, &options, &tx).await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.sources().len(), 2);
        assert_eq!(catalog.get("Packages/a-1.0.rpm").unwrap().checksum, sha256(payload));
        assert!(catalog.contains("Packages/b-2.0.rpm"));

        let events = drain(&mut rx);
        let disagreements: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, AppEvent::Catalog(CatalogEvent::ChecksumDisagreement { .. })))
            .collect();
        assert_eq!(disagreements.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_location_within_catalog() {
        let dir = TempDir::new().unwrap();
        let primary = primary_xml(&[
            package_xml("a", "Packages/a.rpm", &sha256(b"first"), 5),
            package_xml("a", "Packages/a.rpm", &sha256(b"second"), 6),
        ]);
        write(&dir.path().join("repodata/p-primary.xml"), primary.as_bytes());
        let repomd = repomd_xml(&[(
            "primary",
            "repodata/p-primary.xml",
            sha256(primary.as_bytes()),
            primary.len() as u64,
        )]);
        write(&dir.path().join("repodata/repomd.xml"), repomd.as_bytes());
        let (tx, mut rx) = channel();

        let location = IndexLocation::new(dir.path(), "");
        let resolved = resolve_index(&location, &TrustPolicy::Disabled, &tx).await.unwrap();
        let catalog = build_catalog(&resolved, &CatalogOptions::default(), &tx).await.unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Packages/a.rpm").unwrap().checksum, sha256(b"first"));
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, AppEvent::Catalog(CatalogEvent::DuplicateLocation { .. }))));
    }

    #[tokio::test]
    async fn test_unknown_compression_extension_reads_plain() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.xml");
        std::fs::write(&path, b"<x/>").unwrap();
        assert_eq!(Compression::from_path(&path), Compression::None);
        assert_eq!(read_metadata_file(&path).await.unwrap(), b"<x/>");

        let bogus = dir.path().join("bogus-primary.xml.gz");
        std::fs::write(&bogus, b"not gzip").unwrap();
        let err = read_metadata_file(&bogus).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Metadata(MetadataError::DecompressionFailed { .. })
        ));
    }
}
