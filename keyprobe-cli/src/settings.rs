//! Settings discovery: process environment plus candidate dotenv files
//!
//! Everything is read once at startup into an immutable snapshot. Dotenv
//! files are parsed with `dotenvy::from_path_iter`, so the process
//! environment itself is never modified.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use keyprobe_core::Credential;
use tracing::{debug, warn};

/// Variable holding the credential under test
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Dotenv files consulted in order, relative to the working directory
pub const ENV_FILE_CANDIDATES: [&str; 4] = [".env.local", "../.env.local", ".env", "../.env"];

/// Where a setting was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingSource {
    Environment,
    File(PathBuf),
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingSource::Environment => write!(f, "process environment"),
            SettingSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Credential as produced by the loading step
#[derive(Debug)]
pub struct LoadedCredential {
    pub credential: Option<Credential>,
    pub source: Option<SettingSource>,
}

struct EnvFile {
    path: PathBuf,
    vars: HashMap<String, String>,
}

pub struct Settings {
    process: HashMap<String, String>,
    files: Vec<EnvFile>,
    searched: Vec<PathBuf>,
}

impl Settings {
    /// Snapshot the process environment and read the default candidate files
    pub fn discover() -> Self {
        let process = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        let candidates: Vec<PathBuf> = ENV_FILE_CANDIDATES.iter().map(PathBuf::from).collect();
        Self::from_sources(process, &candidates)
    }

    pub fn from_sources(process: HashMap<String, String>, candidates: &[PathBuf]) -> Self {
        let files = candidates
            .iter()
            .filter_map(|path| match read_env_file(path) {
                Ok(Some(vars)) => {
                    debug!("Loaded {} variables from {}", vars.len(), path.display());
                    Some(EnvFile {
                        path: path.clone(),
                        vars,
                    })
                }
                Ok(None) => None,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        Self {
            process,
            files,
            searched: candidates.to_vec(),
        }
    }

    /// Non-empty value for `name`; the process environment wins over files
    pub fn get(&self, name: &str) -> Option<(String, SettingSource)> {
        if let Some(value) = non_empty(self.process.get(name)) {
            return Some((value, SettingSource::Environment));
        }
        self.files.iter().find_map(|file| {
            non_empty(file.vars.get(name)).map(|v| (v, SettingSource::File(file.path.clone())))
        })
    }

    pub fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).map(|(value, _)| value)
    }

    /// The single configuration-loading step for the credential
    pub fn credential(&self) -> LoadedCredential {
        match self.get(API_KEY_VAR) {
            Some((token, source)) => LoadedCredential {
                credential: Some(Credential::new(token)),
                source: Some(source),
            },
            None => LoadedCredential {
                credential: None,
                source: None,
            },
        }
    }

    /// Candidate files that were considered, present or not
    pub fn searched(&self) -> &[PathBuf] {
        &self.searched
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

/// `Ok(None)` when the file does not exist. First definition of a key wins.
fn read_env_file(path: &Path) -> Result<Option<HashMap<String, String>>, dotenvy::Error> {
    if !path.is_file() {
        return Ok(None);
    }
    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        vars.entry(key).or_insert(value);
    }
    Ok(Some(vars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn process(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_process_environment_wins() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".env.local");
        fs::write(&file, "OPENAI_API_KEY=sk-from-file-0123456789\n").unwrap();

        let settings = Settings::from_sources(
            process(&[(API_KEY_VAR, "sk-from-env-0123456789")]),
            &[file],
        );
        let loaded = settings.credential();

        assert_eq!(loaded.source, Some(SettingSource::Environment));
        assert_eq!(loaded.credential.unwrap().expose(), "sk-from-env-0123456789");
    }

    #[test]
    fn test_first_candidate_defining_the_key_wins() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(".env.local");
        let plain = dir.path().join(".env");
        let missing = dir.path().join("nope.env");
        fs::write(&local, "OTHER=1\n").unwrap();
        fs::write(&plain, "# comment\nOPENAI_API_KEY=\"sk-quoted-0123456789\"\n").unwrap();

        let settings = Settings::from_sources(HashMap::new(), &[missing, local, plain.clone()]);
        let loaded = settings.credential();

        assert_eq!(loaded.source, Some(SettingSource::File(plain)));
        assert_eq!(loaded.credential.unwrap().expose(), "sk-quoted-0123456789");
        assert_eq!(settings.searched().len(), 3);
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".env");
        fs::write(&file, "OPENAI_API_KEY=\n").unwrap();

        let settings = Settings::from_sources(process(&[(API_KEY_VAR, "   ")]), &[file]);
        let loaded = settings.credential();

        assert!(loaded.credential.is_none());
        assert!(loaded.source.is_none());
    }

    #[test]
    fn test_malformed_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join(".env.local");
        let good = dir.path().join(".env");
        fs::write(&broken, "OPENAI_API_KEY='unterminated\n").unwrap();
        fs::write(&good, "OPENAI_API_KEY=sk-good-0123456789abc\n").unwrap();

        let settings = Settings::from_sources(HashMap::new(), &[broken, good.clone()]);

        assert_eq!(
            settings.get(API_KEY_VAR),
            Some(("sk-good-0123456789abc".to_string(), SettingSource::File(good)))
        );
    }

    #[test]
    fn test_lookup_feeds_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".env");
        fs::write(&file, "KEYPROBE_TTS_VOICE=nova\n").unwrap();

        let settings = Settings::from_sources(HashMap::new(), &[file]);

        assert_eq!(settings.lookup("KEYPROBE_TTS_VOICE").as_deref(), Some("nova"));
        assert_eq!(settings.lookup("KEYPROBE_CHAT_MODEL"), None);
    }
}
