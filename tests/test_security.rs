use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vesta::config::{HostConfig, SecurityConfig};
use vesta::error::{ServerError, StatusError};
use vesta::security::{SecurityRules, normalize};

fn host_at(root: &Path) -> HostConfig {
    HostConfig {
        name: "localhost".to_string(),
        http_root: root.to_path_buf(),
        welcome_file: "index.html".to_string(),
        error_pages: None,
    }
}

fn default_rules() -> SecurityRules {
    SecurityRules::from_config(&SecurityConfig::default()).unwrap()
}

fn assert_forbidden(result: Result<PathBuf, ServerError>) {
    match result {
        Err(e) => assert_eq!(e.status(), StatusError::Forbidden, "unexpected error {e}"),
        Ok(p) => panic!("expected 403, resolved to {}", p.display()),
    }
}

#[test]
fn test_default_patterns_block_executables() {
    let rules = default_rules();

    assert!(rules.is_forbidden("/app.exe"));
    assert!(rules.is_forbidden("/scripts/deploy.sh"));
    assert!(rules.is_forbidden("/run.bat"));
    assert!(rules.is_forbidden("/run.cmd"));
    assert!(!rules.is_forbidden("/index.html"));
    assert!(!rules.is_forbidden("/app.exe.txt"));
}

#[test]
fn test_configured_patterns_replace_defaults() {
    let rules = SecurityRules::from_config(&SecurityConfig {
        forbidden_patterns: vec![r"/admin/.*".to_string()],
        ..Default::default()
    })
    .unwrap();

    assert!(rules.is_forbidden("/admin/users"));
    assert!(!rules.is_forbidden("/app.exe"));
}

#[test]
fn test_patterns_require_full_match() {
    let rules = SecurityRules::from_config(&SecurityConfig {
        forbidden_patterns: vec!["secret".to_string()],
        ..Default::default()
    })
    .unwrap();

    assert!(rules.is_forbidden("secret"));
    assert!(!rules.is_forbidden("/secret"));
    assert!(!rules.is_forbidden("/secret.txt"));
}

#[test]
fn test_extensions_and_exact_paths() {
    let rules = SecurityRules::from_config(&SecurityConfig {
        forbidden_patterns: vec![],
        forbidden_extensions: vec![".log".to_string()],
        forbidden_paths: vec!["/private.txt".to_string()],
    })
    .unwrap();

    assert!(rules.is_forbidden("/logs/app.log"));
    assert!(rules.is_forbidden("/private.txt"));
    assert!(!rules.is_forbidden("/private.txt.bak"));
    assert!(!rules.is_forbidden("/dir/private.txt"));
}

#[test]
fn test_invalid_pattern_is_rejected() {
    let result = SecurityRules::from_config(&SecurityConfig {
        forbidden_patterns: vec!["(unclosed".to_string()],
        ..Default::default()
    });

    assert!(result.is_err());
}

#[test]
fn test_normalize() {
    assert_eq!(normalize(Path::new("/srv/www/./a/../b")), PathBuf::from("/srv/www/b"));
    assert_eq!(normalize(Path::new("/srv/../../etc")), PathBuf::from("/etc"));
    assert_eq!(normalize(Path::new("www/../..")), PathBuf::from(".."));
}

#[tokio::test]
async fn test_resolve_existing_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("page.html"), "<p>hi</p>").unwrap();

    let target = default_rules()
        .resolve_target(&host_at(dir.path()), "/page.html")
        .await
        .unwrap();

    assert_eq!(target, normalize(&dir.path().join("page.html")));
}

#[tokio::test]
async fn test_resolve_missing_file_is_not_an_error() {
    let dir = TempDir::new().unwrap();

    let target = default_rules()
        .resolve_target(&host_at(dir.path()), "/nope.html")
        .await;

    assert!(target.is_ok());
}

#[tokio::test]
async fn test_traversal_is_forbidden_regardless_of_existence() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("www");
    fs::create_dir(&root).unwrap();
    fs::write(dir.path().join("outside.txt"), "secret").unwrap();
    let host = host_at(&root);
    let rules = default_rules();

    assert_forbidden(rules.resolve_target(&host, "/../outside.txt").await);
    assert_forbidden(rules.resolve_target(&host, "/../../etc/passwd").await);
    assert_forbidden(rules.resolve_target(&host, "/a/../../outside.txt").await);
    assert_forbidden(rules.resolve_target(&host, "//etc/passwd").await);
}

#[tokio::test]
async fn test_tilde_is_forbidden() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes~"), "backup").unwrap();
    let rules = default_rules();
    let host = host_at(dir.path());

    assert_forbidden(rules.resolve_target(&host, "/notes~").await);
    assert_forbidden(rules.resolve_target(&host, "/~root/file").await);
}

#[tokio::test]
async fn test_forbidden_rules_checked_first() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.exe"), "MZ").unwrap();

    assert_forbidden(
        default_rules()
            .resolve_target(&host_at(dir.path()), "/app.exe")
            .await,
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_escaping_root_is_forbidden() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("www");
    fs::create_dir(&root).unwrap();
    fs::write(dir.path().join("outside.txt"), "secret").unwrap();
    fs::write(root.join("inside.txt"), "public").unwrap();
    std::os::unix::fs::symlink(dir.path().join("outside.txt"), root.join("escape.txt")).unwrap();
    std::os::unix::fs::symlink(root.join("inside.txt"), root.join("alias.txt")).unwrap();

    let rules = default_rules();
    let host = host_at(&root);

    assert_forbidden(rules.resolve_target(&host, "/escape.txt").await);
    assert!(rules.resolve_target(&host, "/alias.txt").await.is_ok());
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreadable_file_is_forbidden() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let locked = dir.path().join("locked.txt");
    fs::write(&locked, "private").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits don't apply to root
    if fs::File::open(&locked).is_ok() {
        return;
    }

    let result = default_rules().resolve_target(&host_at(dir.path()), "/locked.txt").await;

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
    assert_forbidden(result);
}
