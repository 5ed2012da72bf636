//! Credential file (`.env`) loading and updating
//!
//! The credential file is a plain `KEY=VALUE` text file shared by both CLI
//! tools. Values already present in the process environment always win over
//! the file, so an exported variable can override a stored one for a single
//! run. Parsing is delegated to `dotenvy` (comments, `export` prefixes and
//! quoted values); writing is a line-preserving upsert.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Environment variable that points at an alternative credential file.
pub const ENV_FILE_VAR: &str = "TWITTER_ENV_FILE";

/// Default credential file name, relative to the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Key/value pairs read from the credential file.
#[derive(Debug, Default)]
pub struct EnvFile {
    path: PathBuf,
    vars: HashMap<String, String>,
}

impl EnvFile {
    /// Resolve the credential file path.
    ///
    /// Precedence: CLI `--env-file` > `TWITTER_ENV_FILE` > `./.env`.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var(ENV_FILE_VAR) {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_ENV_FILE)
    }

    /// Load the credential file at `path`.
    ///
    /// A missing file is not an error: both tools must run with credentials
    /// supplied purely through the environment. Lines `dotenvy` cannot parse
    /// are skipped with a warning.
    pub fn load(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "credential file not found, using environment only");
            return Ok(Self {
                path,
                vars: HashMap::new(),
            });
        }

        let iter = dotenvy::from_path_iter(&path)
            .map_err(|e| Error::EnvFile(format!("opening {}: {e}", path.display())))?;

        let mut vars = HashMap::new();
        for item in iter {
            match item {
                Ok((key, value)) => {
                    vars.insert(key, value);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unparseable line"),
            }
        }

        info!(path = %path.display(), keys = vars.len(), "loaded credential file");
        Ok(Self { path, vars })
    }

    /// Build an in-memory credential set (tests and callers that already
    /// hold the pairs).
    pub fn from_pairs<I, K, V>(path: PathBuf, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            path,
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Path this credential set was loaded from (and is written back to).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw value from the file, ignoring the process environment.
    pub fn file_value(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Look up `key`, process environment first, then the file.
    ///
    /// A variable present in the environment shadows the file even when it
    /// is empty. Empty values are reported as unset.
    pub fn var(&self, key: &str) -> Option<String> {
        let value = match std::env::var(key) {
            Ok(v) => v,
            Err(_) => self.vars.get(key).cloned()?,
        };
        if value.is_empty() { None } else { Some(value) }
    }

    /// Number of keys read from the file.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the file contributed no keys.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Set `key` to `value` in the credential file at `path`.
///
/// The first line assigning `key` (with or without an `export ` prefix) is
/// replaced by `KEY=value`, later assignments of the same key are dropped,
/// and the pair is appended when absent. Every other line is kept verbatim.
/// Applying the same update twice leaves the file unchanged.
pub async fn upsert(path: &Path, key: &str, value: &str) -> Result<()> {
    let existing = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(Error::EnvFile(format!(
                "reading {}: {e}",
                path.display()
            )));
        }
    };

    let updated = upsert_contents(&existing, key, value);
    write_atomic(path, &updated).await?;
    debug!(path = %path.display(), key, "persisted credential");
    Ok(())
}

/// Pure line rewrite behind [`upsert`].
pub fn upsert_contents(contents: &str, key: &str, value: &str) -> String {
    let assignment = format!("{key}={value}");
    let plain_prefix = format!("{key}=");
    let export_prefix = format!("export {key}=");

    let mut out = String::with_capacity(contents.len() + assignment.len() + 1);
    let mut found = false;

    for line in contents.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with(&plain_prefix) || trimmed.starts_with(&export_prefix) {
            if !found {
                out.push_str(&assignment);
                out.push('\n');
                found = true;
            }
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    if !found {
        out.push_str(&assignment);
        out.push('\n');
    }
    out
}

/// Write the credential file atomically.
///
/// Writes a temp file next to the target, then renames it over the target.
/// Permissions are set to 0600 on unix since the file holds tokens.
async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::EnvFile("credential path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".env.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, contents.as_bytes())
        .await
        .map_err(|e| Error::EnvFile(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::EnvFile(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::EnvFile(format!("renaming temp credential file: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that touch process environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    #[test]
    fn load_parses_comments_exports_and_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# twitter credentials\n\
             \n\
             TWITTER_BEARER_TOKEN=plain\n\
             export TWITTER_CONSUMER_KEY=exported\n\
             TWITTER_SECRET_KEY=\"double quoted\"\n\
             TWITTER_ACCESS_TOKEN='single quoted'\n",
        )
        .unwrap();

        let env = EnvFile::load(path.clone()).unwrap();
        assert_eq!(env.len(), 4);
        assert_eq!(env.path(), path.as_path());
        assert_eq!(env.file_value("TWITTER_BEARER_TOKEN"), Some("plain"));
        assert_eq!(env.file_value("TWITTER_CONSUMER_KEY"), Some("exported"));
        assert_eq!(env.file_value("TWITTER_SECRET_KEY"), Some("double quoted"));
        assert_eq!(env.file_value("TWITTER_ACCESS_TOKEN"), Some("single quoted"));
    }

    #[test]
    fn missing_file_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let env = EnvFile::load(dir.path().join("absent.env")).unwrap();
        assert!(env.is_empty());
    }

    #[test]
    fn process_environment_wins_over_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let env = EnvFile::from_pairs(
            PathBuf::from(".env"),
            [("COMMON_TEST_SHADOWED", "from-file"), ("COMMON_TEST_FILE_ONLY", "kept")],
        );

        unsafe { set_env("COMMON_TEST_SHADOWED", "from-env") };
        unsafe { remove_env("COMMON_TEST_FILE_ONLY") };

        assert_eq!(env.var("COMMON_TEST_SHADOWED").as_deref(), Some("from-env"));
        assert_eq!(env.var("COMMON_TEST_FILE_ONLY").as_deref(), Some("kept"));
        assert_eq!(env.file_value("COMMON_TEST_SHADOWED"), Some("from-file"));

        unsafe { remove_env("COMMON_TEST_SHADOWED") };
    }

    #[test]
    fn empty_values_count_as_unset() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let env = EnvFile::from_pairs(
            PathBuf::from(".env"),
            [("COMMON_TEST_EMPTY_FILE", ""), ("COMMON_TEST_EMPTY_ENV", "file-value")],
        );
        unsafe { remove_env("COMMON_TEST_EMPTY_FILE") };
        unsafe { set_env("COMMON_TEST_EMPTY_ENV", "") };

        assert_eq!(env.var("COMMON_TEST_EMPTY_FILE"), None);
        assert_eq!(
            env.var("COMMON_TEST_EMPTY_ENV"),
            None,
            "an empty exported variable still shadows the file"
        );
        assert_eq!(env.var("COMMON_TEST_NEVER_SET"), None);

        unsafe { remove_env("COMMON_TEST_EMPTY_ENV") };
    }

    #[test]
    fn resolve_path_precedence() {
        let _lock = ENV_MUTEX.lock().unwrap();

        unsafe { set_env(ENV_FILE_VAR, "/env/creds.env") };
        assert_eq!(
            EnvFile::resolve_path(Some("/cli/creds.env")),
            PathBuf::from("/cli/creds.env")
        );
        assert_eq!(EnvFile::resolve_path(None), PathBuf::from("/env/creds.env"));

        unsafe { remove_env(ENV_FILE_VAR) };
        assert_eq!(EnvFile::resolve_path(None), PathBuf::from(".env"));
    }

    #[test]
    fn upsert_replaces_matching_line_and_keeps_others() {
        let contents = "# keep me\nTWITTER_BEARER_TOKEN=abc\nexport TWITTER_OAUTH2_USER_TOKEN=old\nOTHER=1\n";
        let updated = upsert_contents(contents, "TWITTER_OAUTH2_USER_TOKEN", "new");
        assert_eq!(
            updated,
            "# keep me\nTWITTER_BEARER_TOKEN=abc\nTWITTER_OAUTH2_USER_TOKEN=new\nOTHER=1\n"
        );
    }

    #[test]
    fn upsert_appends_missing_key() {
        let updated = upsert_contents("A=1", "B", "2");
        assert_eq!(updated, "A=1\nB=2\n");
        assert_eq!(upsert_contents("", "B", "2"), "B=2\n");
    }

    #[test]
    fn upsert_does_not_match_key_prefixes() {
        let contents = "TWITTER_OAUTH2_USER_TOKEN_OLD=x\n";
        let updated = upsert_contents(contents, "TWITTER_OAUTH2_USER_TOKEN", "y");
        assert_eq!(
            updated,
            "TWITTER_OAUTH2_USER_TOKEN_OLD=x\nTWITTER_OAUTH2_USER_TOKEN=y\n"
        );
    }

    #[test]
    fn upsert_collapses_duplicate_assignments() {
        let contents = "K=1\nX=0\nK=2\n";
        assert_eq!(upsert_contents(contents, "K", "3"), "K=3\nX=0\n");
    }

    #[tokio::test]
    async fn upsert_twice_leaves_one_line_with_latest_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "TWITTER_CLIENT_ID=cid\n").unwrap();

        upsert(&path, "TWITTER_OAUTH2_REFRESH_TOKEN", "rt_1").await.unwrap();
        upsert(&path, "TWITTER_OAUTH2_REFRESH_TOKEN", "rt_2").await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let matching: Vec<&str> = contents
            .lines()
            .filter(|l| l.starts_with("TWITTER_OAUTH2_REFRESH_TOKEN="))
            .collect();
        assert_eq!(matching, vec!["TWITTER_OAUTH2_REFRESH_TOKEN=rt_2"]);
        assert!(contents.starts_with("TWITTER_CLIENT_ID=cid\n"));

        // Writing the same pair again is a no-op on content
        upsert(&path, "TWITTER_OAUTH2_REFRESH_TOKEN", "rt_2").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);
    }

    #[tokio::test]
    async fn upsert_creates_missing_file_and_roundtrips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.env");

        upsert(&path, "TWITTER_OAUTH2_USER_TOKEN", "at_abc").await.unwrap();

        let env = EnvFile::load(path).unwrap();
        assert_eq!(env.file_value("TWITTER_OAUTH2_USER_TOKEN"), Some("at_abc"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn upserted_file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        upsert(&path, "K", "v").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "credential file must be 0600, got {mode:o}");
    }
}
