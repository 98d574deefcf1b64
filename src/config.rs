// ============================================================================
// APP CONFIG — key=value settings file in the platform config directory
// ============================================================================
//
// On Linux:   ~/.config/grainy/grainy_settings.cfg  (XDG_CONFIG_HOME respected)
// On Windows: %APPDATA%\GrainyEditorial\grainy_settings.cfg
// On macOS:   ~/Library/Application Support/GrainyEditorial/grainy_settings.cfg
//
// Missing or corrupt files fall back to defaults.  The recipe endpoint and
// key can also come from GRAINY_RECIPE_ENDPOINT / GRAINY_RECIPE_API_KEY,
// which win over the file.

use std::path::PathBuf;

const CONFIG_FILE: &str = "grainy_settings.cfg";
pub const ENV_RECIPE_ENDPOINT: &str = "GRAINY_RECIPE_ENDPOINT";
pub const ENV_RECIPE_API_KEY: &str = "GRAINY_RECIPE_API_KEY";
pub const DEFAULT_RECIPE_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub recipe_endpoint: String,
    /// Empty = no key sent.
    pub recipe_api_key: String,
    pub recipe_timeout_secs: u64,
    /// Empty = current directory.
    pub output_dir: String,
    pub default_ppi: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recipe_endpoint: DEFAULT_RECIPE_ENDPOINT.to_string(),
            recipe_api_key: String::new(),
            recipe_timeout_secs: 20,
            output_dir: String::new(),
            default_ppi: 300,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("grainy");
            return Some(config_dir.join(CONFIG_FILE));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(PathBuf::from(appdata).join("GrainyEditorial").join(CONFIG_FILE));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("GrainyEditorial")
                    .join(CONFIG_FILE),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join(CONFIG_FILE)))
        }
    }

    /// Serialize to the on-disk `key=value` form.
    pub fn to_config_string(&self) -> String {
        format!(
            "recipe_endpoint={}\n\
             recipe_api_key={}\n\
             recipe_timeout_secs={}\n\
             output_dir={}\n\
             default_ppi={}\n",
            self.recipe_endpoint,
            self.recipe_api_key,
            self.recipe_timeout_secs,
            self.output_dir,
            self.default_ppi,
        )
    }

    /// Parse `key=value` lines.  Unknown keys and bad values are ignored.
    pub fn parse(content: &str) -> Self {
        let mut c = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "recipe_endpoint" => {
                    if !val.is_empty() {
                        c.recipe_endpoint = val.to_string();
                    }
                }
                "recipe_api_key" => c.recipe_api_key = val.to_string(),
                "recipe_timeout_secs" => {
                    c.recipe_timeout_secs = val.parse().unwrap_or(c.recipe_timeout_secs).max(1);
                }
                "output_dir" => c.output_dir = val.to_string(),
                "default_ppi" => {
                    c.default_ppi = val.parse().unwrap_or(c.default_ppi).max(1);
                }
                _ => {}
            }
        }
        c
    }

    /// Environment overrides for the recipe service.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var(ENV_RECIPE_ENDPOINT)
            && !endpoint.trim().is_empty()
        {
            self.recipe_endpoint = endpoint.trim().to_string();
        }
        if let Ok(key) = std::env::var(ENV_RECIPE_API_KEY) {
            self.recipe_api_key = key.trim().to_string();
        }
        self
    }

    /// Load from disk (defaults if missing or unreadable), then apply env overrides.
    pub fn load() -> Self {
        let from_file = Self::config_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .map(|content| Self::parse(&content))
            .unwrap_or_default();
        from_file.with_env_overrides()
    }

    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }

    pub fn output_dir(&self) -> PathBuf {
        if self.output_dir.trim().is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(self.output_dir.trim())
        }
    }
}
