//! Environment Prober Integration Tests
//!
//! Platform detection, package manager priority and bin directory fallback.

mod support;

use std::path::PathBuf;

use r2d2_installer::domain::{ErrorKind, PackageManager, Platform};
use r2d2_installer::steps::EnvironmentProber;
use support::FakeLocator;
use tempfile::TempDir;

#[tokio::test]
async fn test_supported_platforms_produce_descriptor() {
    let temp = TempDir::new().unwrap();
    let home = temp.path().join("home");

    for os in ["linux", "macos", "windows"] {
        let prober = EnvironmentProber::new(
            os,
            FakeLocator::with(&["apt-get"]),
            Some(home.clone()),
            Some(temp.path().join("profile")),
        );
        let env = prober.probe().await.unwrap();

        assert!(!env.package_manager_name().is_empty(), "{}", os);
        assert!(
            env.bin_directory.is_dir() || env.bin_directory == home.join("bin"),
            "{}: {}",
            os,
            env.bin_directory.display()
        );
    }
}

#[tokio::test]
async fn test_unsupported_platform() {
    for os in ["freebsd", "solaris", ""] {
        let prober = EnvironmentProber::new(os, FakeLocator::with(&[]), None, None);
        let err = prober.probe().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedPlatform);
    }
}

#[tokio::test]
async fn test_existing_bin_dir_is_kept() {
    let temp = TempDir::new().unwrap();
    let bin = temp.path().join("bin-here");
    std::fs::create_dir_all(&bin).unwrap();

    let env = EnvironmentProber::new(
        "linux",
        FakeLocator::with(&["pacman"]),
        Some(temp.path().join("home")),
        None,
    )
    .with_bin_dir(Some(bin.clone()))
    .probe()
    .await
    .unwrap();

    assert_eq!(env.platform, Platform::Linux);
    assert_eq!(env.package_manager, PackageManager::Pacman);
    assert_eq!(env.bin_directory, bin);
}

#[tokio::test]
async fn test_missing_bin_dir_falls_back_without_creating() {
    let temp = TempDir::new().unwrap();
    let home = temp.path().join("home");

    let env = EnvironmentProber::new("macos", FakeLocator::with(&[]), Some(home.clone()), None)
        .with_bin_dir(Some(temp.path().join("nope")))
        .probe()
        .await
        .unwrap();

    assert_eq!(env.package_manager, PackageManager::Brew);
    assert_eq!(env.bin_directory, home.join("bin"));
    assert!(!home.join("bin").exists());
}

#[tokio::test]
async fn test_windows_uses_user_profile_bin() {
    let temp = TempDir::new().unwrap();
    let profile = temp.path().join("profile");
    std::fs::create_dir_all(profile.join("bin")).unwrap();

    let env = EnvironmentProber::new(
        "windows",
        FakeLocator::with(&[]),
        Some(PathBuf::from("/unused")),
        Some(profile.clone()),
    )
    .probe()
    .await
    .unwrap();

    assert_eq!(env.platform, Platform::Windows);
    assert_eq!(env.package_manager, PackageManager::Choco);
    assert_eq!(env.bin_directory, profile.join("bin"));
}

#[tokio::test]
async fn test_probe_uses_locator_only() {
    let locator = FakeLocator::with(&["zypper"]);
    let env = EnvironmentProber::new("linux", locator.clone(), None, None)
        .probe()
        .await
        .unwrap();
    assert_eq!(env.package_manager, PackageManager::Zypper);
}
