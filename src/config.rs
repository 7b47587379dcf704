use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

use cross_xdg::BaseDirs;
use serde::Deserialize;

use crate::machine::{DEFAULT_TAPE_SIZE, VmConfig};

/// Errors raised while resolving settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },

    #[error("tape size must be at least 1 cell")]
    ZeroTapeSize,
}

/// `[vm]` table of `bf.toml`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VmSection {
    pub tape_size: Option<usize>,
    pub debug: Option<bool>,
    pub pause: Option<bool>,
    pub color: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    vm: VmSection,
}

/// Values given on the command line. `None`/`false` means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub debug: bool,
    pub tape_size: Option<usize>,
    pub no_pause: bool,
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tape_size: usize,
    pub debug: bool,
    pub pause: bool,
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tape_size: DEFAULT_TAPE_SIZE,
            debug: false,
            pause: true,
            color: true,
        }
    }
}

impl Settings {
    /// Resolve flags -> environment -> `bf.toml` -> defaults.
    pub fn resolve(flags: &Overrides) -> Result<Self, ConfigError> {
        let file = load_file()?;
        Self::resolve_from(flags, |name| env::var(name).ok(), &file)
    }

    /// Same as [`Settings::resolve`] with explicit environment and file inputs.
    pub fn resolve_from<E>(flags: &Overrides, env: E, file: &VmSection) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let tape_size = match flags.tape_size {
            Some(n) => n,
            None => match env("BF_TAPE_SIZE") {
                Some(raw) => raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnv {
                    name: "BF_TAPE_SIZE",
                    value: raw.clone(),
                })?,
                None => file.tape_size.unwrap_or(defaults.tape_size),
            },
        };
        if tape_size == 0 {
            return Err(ConfigError::ZeroTapeSize);
        }

        // DEBUG is a common name; anything unrecognized counts as off.
        let env_debug = env("DEBUG").map(|raw| {
            parse_switch(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "ignoring unrecognized DEBUG value");
                false
            })
        });
        let debug = flags.debug || env_debug.or(file.debug).unwrap_or(defaults.debug);

        let env_pause = match env("BF_TRACE_PAUSE") {
            Some(raw) => Some(parse_switch(&raw).ok_or(ConfigError::InvalidEnv {
                name: "BF_TRACE_PAUSE",
                value: raw.clone(),
            })?),
            None => None,
        };
        let pause = !flags.no_pause && env_pause.or(file.pause).unwrap_or(defaults.pause);

        let color = env("NO_COLOR").is_none_or(|v| v.is_empty()) && file.color.unwrap_or(defaults.color);

        Ok(Self {
            tape_size,
            debug,
            pause,
            color,
        })
    }

    pub fn vm_config(&self) -> VmConfig {
        VmConfig {
            tape_size: self.tape_size,
            debug: self.debug,
            pause: self.pause,
            color: self.color,
        }
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Location of `bf.toml`: `$BF_CONFIG`, else `<xdg config home>/bf.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os("BF_CONFIG") {
        return Some(PathBuf::from(path));
    }

    // On Linux: resolves to /home/<user>/.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bf.toml");
    Some(path)
}

/// Read the `[vm]` section; a missing file yields an empty section.
fn load_file() -> Result<VmSection, ConfigError> {
    let Some(path) = config_path() else {
        return Ok(VmSection::default());
    };

    let content = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(VmSection::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    let parsed = parse_file(&content).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(parsed)
}

fn parse_file(content: &str) -> Result<VmSection, toml::de::Error> {
    let file: FileConfig = toml::from_str(content)?;
    Ok(file.vm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let s = Settings::resolve_from(&Overrides::default(), env_of(&[]), &VmSection::default()).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.tape_size, 4096);
        assert!(!s.debug);
    }

    #[test]
    fn debug_env_enables_tracing() {
        let s = Settings::resolve_from(&Overrides::default(), env_of(&[("DEBUG", "true")]), &VmSection::default()).unwrap();
        assert!(s.debug);
    }

    #[test]
    fn unknown_debug_value_is_off() {
        let s = Settings::resolve_from(&Overrides::default(), env_of(&[("DEBUG", "*")]), &VmSection::default()).unwrap();
        assert!(!s.debug);
    }

    #[test]
    fn flags_beat_env_beat_file() {
        let file = VmSection {
            tape_size: Some(10),
            debug: Some(true),
            pause: Some(true),
            color: None,
        };
        let env = env_of(&[("BF_TAPE_SIZE", "20"), ("DEBUG", "false")]);

        let s = Settings::resolve_from(&Overrides::default(), &env, &file).unwrap();
        assert_eq!(s.tape_size, 20);
        assert!(!s.debug);

        let flags = Overrides {
            debug: true,
            tape_size: Some(30),
            no_pause: true,
        };
        let s = Settings::resolve_from(&flags, &env, &file).unwrap();
        assert_eq!(s.tape_size, 30);
        assert!(s.debug);
        assert!(!s.pause);
    }

    #[test]
    fn file_values_apply_without_env() {
        let file = parse_file("[vm]\ntape_size = 64\npause = false\n").unwrap();
        let s = Settings::resolve_from(&Overrides::default(), env_of(&[]), &file).unwrap();
        assert_eq!(s.tape_size, 64);
        assert!(!s.pause);
    }

    #[test]
    fn rejects_zero_tape() {
        let flags = Overrides {
            tape_size: Some(0),
            ..Overrides::default()
        };
        let err = Settings::resolve_from(&flags, env_of(&[]), &VmSection::default()).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTapeSize));
    }

    #[test]
    fn rejects_bad_tape_env() {
        let err = Settings::resolve_from(&Overrides::default(), env_of(&[("BF_TAPE_SIZE", "lots")]), &VmSection::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "BF_TAPE_SIZE", .. }));
    }

    #[test]
    fn no_color_env_disables_color() {
        let s = Settings::resolve_from(&Overrides::default(), env_of(&[("NO_COLOR", "1")]), &VmSection::default()).unwrap();
        assert!(!s.color);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_file("[vm]\ntape = 3\n").is_err());
        assert!(parse_file("[colors]\nred = \"#ff0000\"\n").is_err());
    }

    #[test]
    fn empty_file_is_default_section() {
        assert_eq!(parse_file("").unwrap(), VmSection::default());
    }
}
