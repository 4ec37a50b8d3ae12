//! Session settings validation in debug and release builds.

use std::collections::HashMap;
use std::io::Write;

use mockable::MockEnv;
use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

use super::*;

fn key_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp key file");
    file.write_all(&vec![b'k'; len]).expect("write key");
    file
}

#[fixture]
fn valid_key() -> NamedTempFile {
    key_file(SESSION_KEY_MIN_LEN)
}

fn path_of(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().into_owned()
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn release_vars(key_path: String) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key_path),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

fn release_error(vars: HashMap<&'static str, String>) -> SessionConfigError {
    match session_settings_from_env(&mock_env(vars), BuildMode::Release) {
        Ok(_) => panic!("release settings should be rejected"),
        Err(error) => error,
    }
}

#[rstest]
fn release_accepts_explicit_settings(valid_key: NamedTempFile) {
    let settings = session_settings_from_env(
        &mock_env(release_vars(path_of(&valid_key))),
        BuildMode::Release,
    )
    .expect("valid settings");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(settings.ttl, CookieDuration::hours(2));
}

#[rstest]
#[case::cookie_secure(COOKIE_SECURE_ENV)]
#[case::same_site(SAMESITE_ENV)]
#[case::allow_ephemeral(ALLOW_EPHEMERAL_ENV)]
fn release_requires_each_toggle(valid_key: NamedTempFile, #[case] missing: &'static str) {
    let mut vars = release_vars(path_of(&valid_key));
    vars.remove(missing);

    let error = release_error(vars);
    assert!(matches!(error, SessionConfigError::MissingEnv { name } if name == missing));
}

#[rstest]
#[case("maybe")]
#[case("")]
fn release_rejects_malformed_cookie_secure(valid_key: NamedTempFile, #[case] value: &str) {
    let mut vars = release_vars(path_of(&valid_key));
    vars.insert(COOKIE_SECURE_ENV, value.to_owned());

    let error = release_error(vars);
    assert!(matches!(
        error,
        SessionConfigError::InvalidEnv {
            name: COOKIE_SECURE_ENV,
            ..
        }
    ));
}

#[rstest]
fn release_rejects_ephemeral_keys(valid_key: NamedTempFile) {
    let mut vars = release_vars(path_of(&valid_key));
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());

    assert!(matches!(
        release_error(vars),
        SessionConfigError::EphemeralNotAllowed
    ));
}

#[rstest]
fn release_rejects_short_key() {
    let short = key_file(32);
    assert!(matches!(
        release_error(release_vars(path_of(&short))),
        SessionConfigError::KeyTooShort { length: 32, .. }
    ));
}

#[rstest]
fn release_rejects_missing_key_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("absent").to_string_lossy().into_owned();

    assert!(matches!(
        release_error(release_vars(missing)),
        SessionConfigError::KeyRead { .. }
    ));
}

#[rstest]
fn release_rejects_same_site_none_without_secure(valid_key: NamedTempFile) {
    let mut vars = release_vars(path_of(&valid_key));
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());

    assert!(matches!(
        release_error(vars),
        SessionConfigError::InsecureSameSiteNone
    ));
}

#[rstest]
fn debug_defaults_to_secure_lax_with_ephemeral_key() {
    let settings = session_settings_from_env(&mock_env(HashMap::new()), BuildMode::Debug)
        .expect("debug defaults");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
#[case("unexpected", SameSite::Lax)]
#[case("none", SameSite::None)]
#[case("STRICT", SameSite::Strict)]
fn debug_same_site_parsing(
    valid_key: NamedTempFile,
    #[case] value: &str,
    #[case] expected: SameSite,
) {
    let mut vars = release_vars(path_of(&valid_key));
    vars.insert(SAMESITE_ENV, value.to_owned());

    let settings =
        session_settings_from_env(&mock_env(vars), BuildMode::Debug).expect("debug settings");
    assert_eq!(settings.same_site, expected);
}
