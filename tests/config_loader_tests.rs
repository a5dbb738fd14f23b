use jobdesk::config::ConfigLoader;
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const VARS: &[&str] = &[
    "JOBDESK_PROFILE",
    "JOBDESK_API_BIND_ADDR",
    "JOBDESK_LOG_LEVEL",
    "JOBDESK_JOB_PREFIX_IMPORT",
    "JOBDESK_JOB_PREFIX_EXPORT",
    "JOBDESK_SESSION_TTL_MINUTES",
    "JOBDESK_BLOB_STORE_URL",
    "JOBDESK_BLOB_STORE_TOKEN",
    "JOBDESK_BOOTSTRAP_ADMIN_EMAIL",
    "JOBDESK_BOOTSTRAP_ADMIN_PASSWORD",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    for var in VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

fn empty_dir_loader() -> (TempDir, ConfigLoader) {
    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    (temp_dir, loader)
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let (_dir, loader) = empty_dir_loader();
    let cfg = loader.load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.superadmin_marker, "@");
    assert_eq!(cfg.job_numbers.import_prefix, "IMP");
    assert_eq!(cfg.job_numbers.export_prefix, "EXP");
    assert_eq!(cfg.session_ttl_minutes, 720);
    assert!(cfg.blob_store_url.is_none());
    cfg.bind_addr().expect("default bind addr parses");
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "JOBDESK_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(
        &temp_dir,
        ".env.test",
        "JOBDESK_API_BIND_ADDR=192.168.0.10:5000\nJOBDESK_JOB_PREFIX_IMPORT=imx\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "JOBDESK_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "JOBDESK_PROFILE=test\nJOBDESK_API_BIND_ADDR=127.0.0.1:4000\n",
    );

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.job_numbers.import_prefix, "IMX");
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "JOBDESK_API_BIND_ADDR=127.0.0.1:3000\nJOBDESK_SESSION_TTL_MINUTES=60\n",
    );

    unsafe {
        env::set_var("JOBDESK_API_BIND_ADDR", "0.0.0.0:9090");
    }

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with env override");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");
    assert_eq!(cfg.session_ttl_minutes, 60);

    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("JOBDESK_API_BIND_ADDR", "not-an-addr");
    }
    let (_dir, loader) = empty_dir_loader();
    let err = loader.load().expect_err("invalid bind addr should fail");
    assert!(err.to_string().contains("invalid api bind address"));

    clear_env();
}

#[test]
fn deployed_profiles_require_a_blob_store() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("JOBDESK_PROFILE", "prod");
    }
    let (_dir, loader) = empty_dir_loader();
    let err = loader.load().expect_err("prod without blob store should fail");
    assert!(err.to_string().contains("blob store url is missing"));

    unsafe {
        env::set_var("JOBDESK_BLOB_STORE_URL", "https://blobs.example.com/documents/");
    }
    let cfg = loader.load().expect("prod with blob store loads");
    assert_eq!(cfg.profile, "prod");

    clear_env();
}

#[test]
fn bootstrap_admin_needs_both_halves() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("JOBDESK_BOOTSTRAP_ADMIN_EMAIL", "admin@example.com");
    }
    let (_dir, loader) = empty_dir_loader();
    let err = loader.load().expect_err("email without password should fail");
    assert!(err.to_string().contains("bootstrap admin requires both"));

    unsafe {
        env::set_var("JOBDESK_BOOTSTRAP_ADMIN_PASSWORD", "change-me");
    }
    let cfg = loader.load().expect("complete bootstrap admin loads");
    assert_eq!(cfg.bootstrap_admin_email.as_deref(), Some("admin@example.com"));

    let redacted = cfg.redacted_json().unwrap();
    assert!(!redacted.contains("change-me"));

    clear_env();
}

#[test]
fn identical_job_prefixes_are_rejected() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("JOBDESK_JOB_PREFIX_IMPORT", "JOB");
        env::set_var("JOBDESK_JOB_PREFIX_EXPORT", "job");
    }
    let (_dir, loader) = empty_dir_loader();
    let err = loader.load().expect_err("duplicate prefixes should fail");
    assert!(err.to_string().contains("must differ"));

    clear_env();
}
