// ============================================================================
// RECIPES — text prompt in, up to three suggested settings bundles out
// ============================================================================
//
// The recipe service is a Gemini-style `generateContent` endpoint asked to
// answer with a JSON array.  Whatever comes back is treated as untrusted:
// fields outside the allowed set are dropped and values are clamped.  Any
// failure (network, status, parse) becomes an empty list plus a log line, so
// callers never see an error from `fetch`.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::AppConfig;
use crate::settings::{GrainSettings, MAX_SCALE, MIN_SCALE, SettingsPatch, TextureType};

pub const MAX_RECIPES: usize = 3;
/// The only background/grain colors a recipe may set.
pub const RECIPE_COLORS: [&str; 2] = ["#FFFFFF", "#000000"];

const RECIPE_INSTRUCTIONS: &str = "You design film-grain textures for editorial layouts. \
Reply with a JSON array of at most 3 objects, each {\"name\": string, \"description\": string, \
\"settings\": {\"intensity\": 0-1, \"scale\": 1-20, \"roughness\": 0-1, \"opacity\": 0-1, \
\"randomness\": 0-1, \"seed\": integer, \"bgColor\": \"#FFFFFF\"|\"#000000\", \
\"grainColor\": \"#FFFFFF\"|\"#000000\", \"texture\": \"UNIFORM\"|\"GAUSSIAN\"|\"SPECKLE\"|\"FILM\", \
\"monochrome\": true}}. Style request: ";

/// A named, described settings fragment suggested by the service.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub settings: SettingsPatch,
}

impl Recipe {
    /// Merge this recipe over `base`.
    pub fn apply(&self, base: &GrainSettings) -> GrainSettings {
        base.merge(&self.settings)
    }
}

#[derive(Debug)]
pub enum RecipeError {
    Network(String),
    Status(u16),
    Parse(String),
}

impl std::fmt::Display for RecipeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipeError::Network(e) => write!(f, "Recipe request failed: {}", e),
            RecipeError::Status(code) => write!(f, "Recipe service returned HTTP {}", code),
            RecipeError::Parse(e) => write!(f, "Recipe response unreadable: {}", e),
        }
    }
}

impl std::error::Error for RecipeError {}

impl From<reqwest::Error> for RecipeError {
    fn from(e: reqwest::Error) -> Self {
        RecipeError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for RecipeError {
    fn from(e: serde_json::Error) -> Self {
        RecipeError::Parse(e.to_string())
    }
}

// ============================================================================
// HTTP CLIENT
// ============================================================================

pub struct RecipeClient {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl RecipeClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.recipe_endpoint.clone(),
            Some(config.recipe_api_key.clone()),
            Duration::from_secs(config.recipe_timeout_secs.max(1)),
        )
    }

    /// Ask for recipes matching `prompt`.  Never fails: errors are logged and
    /// yield an empty list.
    pub fn fetch(&self, prompt: &str) -> Vec<Recipe> {
        if prompt.trim().is_empty() {
            return Vec::new();
        }
        match self.try_fetch(prompt) {
            Ok(recipes) => {
                crate::log_info!("Recipe service returned {} recipe(s)", recipes.len());
                recipes
            }
            Err(e) => {
                crate::log_warn!("{}", e);
                Vec::new()
            }
        }
    }

    fn try_fetch(&self, prompt: &str) -> Result<Vec<Recipe>, RecipeError> {
        let client = Client::builder().timeout(self.timeout).build()?;
        let mut req = client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .body(request_body(prompt).to_string());
        if let Some(key) = &self.api_key {
            req = req.query(&[("key", key.as_str())]);
        }
        let resp = req.send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RecipeError::Status(status.as_u16()));
        }
        let text = resp.text()?;
        parse_response(&text)
    }
}

/// JSON request body for `prompt`.
pub fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": format!("{}{}", RECIPE_INSTRUCTIONS, prompt.trim()) }] }],
        "generationConfig": { "responseMimeType": "application/json" }
    })
}

// ============================================================================
// RESPONSE PARSING
// ============================================================================

/// Parse either a Gemini envelope (array as text in the first candidate) or a
/// bare JSON array of recipes.
pub fn parse_response(body: &str) -> Result<Vec<Recipe>, RecipeError> {
    let root: Value = serde_json::from_str(body.trim())?;
    let list = match &root {
        Value::Array(items) => items.clone(),
        Value::Object(_) => {
            let text = root
                .pointer("/candidates/0/content/parts/0/text")
                .and_then(Value::as_str)
                .ok_or_else(|| RecipeError::Parse("no candidate text".to_string()))?;
            match serde_json::from_str::<Value>(strip_code_fence(text))? {
                Value::Array(items) => items,
                _ => return Err(RecipeError::Parse("candidate is not an array".to_string())),
            }
        }
        _ => return Err(RecipeError::Parse("expected array or object".to_string())),
    };

    Ok(list
        .iter()
        .filter(|v| v.is_object())
        .take(MAX_RECIPES)
        .enumerate()
        .map(|(i, v)| sanitize_recipe(v, i))
        .collect())
}

/// Models sometimes wrap JSON in ```json fences.
fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(inner) = t.strip_prefix("```") else { return t };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn unit(v: &Value, key: &str) -> Option<f64> {
    v.get(key)?.as_f64().filter(|x| x.is_finite()).map(|x| x.clamp(0.0, 1.0))
}

fn recipe_color(v: &Value, key: &str) -> Option<String> {
    let s = v.get(key)?.as_str()?.trim().to_uppercase();
    RECIPE_COLORS.contains(&s.as_str()).then_some(s)
}

/// Reduce one raw recipe object to the allowed fields.
fn sanitize_recipe(raw: &Value, index: usize) -> Recipe {
    let text = |key: &str| {
        raw.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let name = text("name").unwrap_or_else(|| format!("Recipe {}", index + 1));
    let description = text("description").unwrap_or_default();

    let empty = Value::Null;
    let s = raw.get("settings").filter(|v| v.is_object()).unwrap_or(&empty);
    let settings = SettingsPatch {
        intensity: unit(s, "intensity"),
        scale: s
            .get("scale")
            .and_then(Value::as_f64)
            .filter(|x| x.is_finite())
            .map(|x| x.clamp(MIN_SCALE, MAX_SCALE)),
        roughness: unit(s, "roughness"),
        opacity: unit(s, "opacity"),
        randomness: unit(s, "randomness"),
        seed: s
            .get("seed")
            .and_then(Value::as_f64)
            .filter(|x| x.is_finite())
            .map(|x| x.trunc().clamp(i32::MIN as f64, i32::MAX as f64) as i32),
        bg_color: recipe_color(s, "bgColor"),
        grain_color: recipe_color(s, "grainColor"),
        texture: s.get("texture").and_then(Value::as_str).and_then(TextureType::parse),
        monochrome: Some(true),
        ..Default::default()
    };

    Recipe { name, description, settings }
}
