//! Flag-file configuration.
//!
//! Config files hold ordinary command-line flags, one or more per line, with
//! `#` comments. Sources merge global < local `.jsxsandboxrc` < command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Default keystroke quiet period before a render pass.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

const APP_DIR: &str = "jsx-sandbox";
const LOCAL_FILE: &str = ".jsxsandboxrc";

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    const ALL: [Self; 3] = [Self::Auto, Self::Light, Self::Dark];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == name)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub perf: bool,
    pub theme: Option<ThemeMode>,
    pub render_debug_log: Option<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub preview: Option<PathBuf>,
    pub stylesheet: Option<String>,
}

impl ConfigFlags {
    /// Merge `other` over `self`: switches accumulate, values from `other`
    /// win when present.
    pub fn union(&self, other: &Self) -> Self {
        fn pick<T: Clone>(over: &Option<T>, under: &Option<T>) -> Option<T> {
            over.as_ref().or(under.as_ref()).cloned()
        }
        Self {
            watch: other.watch || self.watch,
            perf: other.perf || self.perf,
            theme: pick(&other.theme, &self.theme),
            render_debug_log: pick(&other.render_debug_log, &self.render_debug_log),
            debounce_ms: pick(&other.debounce_ms, &self.debounce_ms),
            preview: pick(&other.preview, &self.preview),
            stylesheet: pick(&other.stylesheet, &self.stylesheet),
        }
    }

    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    /// One config-file line per set flag, in `--flag value` form.
    fn to_lines(&self) -> Vec<String> {
        let switches = [("--watch", self.watch), ("--perf", self.perf)]
            .into_iter()
            .filter(|(_, on)| *on)
            .map(|(flag, _)| flag.to_string());
        let values = [
            ("--theme", self.theme.map(|t| t.as_str().to_string())),
            ("--debounce-ms", self.debounce_ms.map(|ms| ms.to_string())),
            ("--preview", self.preview.as_ref().map(|p| p.display().to_string())),
            ("--stylesheet", self.stylesheet.clone()),
            (
                "--render-debug-log",
                self.render_debug_log.as_ref().map(|p| p.display().to_string()),
            ),
        ]
        .into_iter()
        .filter_map(|(flag, value)| value.map(|v| format!("{flag} {v}")));
        switches.chain(values).collect()
    }
}

/// Per-user config directory for this platform, if one can be found.
fn config_home() -> Option<PathBuf> {
    let env = |key: &str| std::env::var_os(key).map(PathBuf::from);

    #[cfg(target_os = "windows")]
    let base = env("APPDATA");

    #[cfg(target_os = "macos")]
    let base = env("HOME").map(|home| home.join("Library").join("Application Support"));

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let base = env("XDG_CONFIG_HOME").or_else(|| env("HOME").map(|home| home.join(".config")));

    base
}

/// `<config home>/jsx-sandbox/config`, falling back to the local file.
pub fn global_config_path() -> PathBuf {
    config_home().map_or_else(local_override_path, |home| {
        home.join(APP_DIR).join("config")
    })
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_FILE)
}

/// Load flags from `path`; a missing file is an empty config.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ConfigFlags::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading {}", path.display()));
        }
    };
    let tokens: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .flat_map(str::split_whitespace)
        .map(String::from)
        .collect();
    Ok(parse_flag_tokens(&tokens))
}

/// # Errors
///
/// Returns an error if the config directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut body = String::from("# jsx-sandbox defaults (saved with --save)\n");
    for line in flags.to_lines() {
        body.push_str(&line);
        body.push('\n');
    }
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))
}

/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
            Err(err).with_context(|| format!("removing {}", path.display()))
        }
        _ => Ok(()),
    }
}

/// Pick the known flags out of `tokens`, ignoring everything else.
///
/// Value flags accept both `--flag value` and `--flag=value`.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut rest = tokens.iter();
    while let Some(token) = rest.next() {
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value.to_string())),
            _ => (token.as_str(), None),
        };
        let mut value = || inline.clone().or_else(|| rest.next().cloned());
        match name {
            "--watch" => flags.watch = true,
            "--perf" => flags.perf = true,
            "--theme" => flags.theme = value().and_then(|v| ThemeMode::from_name(&v)),
            "--debounce-ms" => flags.debounce_ms = value().and_then(|v| v.parse().ok()),
            "--preview" => flags.preview = value().map(PathBuf::from),
            "--stylesheet" => flags.stylesheet = value(),
            "--render-debug-log" => flags.render_debug_log = value().map(PathBuf::from),
            _ => {}
        }
    }
    flags
}
