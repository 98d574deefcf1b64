// ============================================================================
// GRAIN SETTINGS — the record every render is a pure function of
// ============================================================================
//
// Producers (CLI flags, JSON files, presets, recipes) hand over a
// `GrainSettings`; the compositor never trusts it and always works on
// `sanitized()` values.  Field names serialize in camelCase so settings files
// written by other tools (`bgColor`, `grainColor`) load unchanged.

use serde::{Deserialize, Serialize};

/// Largest accepted width or height, in pixels.
pub const MAX_DIMENSION: u32 = 5000;
/// Largest accepted total pixel count.
pub const MAX_PIXELS: u64 = 25_000_000;
pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 20.0;
const MM_PER_INCH: f64 = 25.4;

// ============================================================================
// TEXTURE FAMILY
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TextureType {
    #[default]
    Uniform,
    Gaussian,
    Speckle,
    Film,
}

impl TextureType {
    pub const ALL: [TextureType; 4] = [
        TextureType::Uniform,
        TextureType::Gaussian,
        TextureType::Speckle,
        TextureType::Film,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TextureType::Uniform => "UNIFORM",
            TextureType::Gaussian => "GAUSSIAN",
            TextureType::Speckle => "SPECKLE",
            TextureType::Film => "FILM",
        }
    }

    /// Case-insensitive lookup, used for CLI flags and recipe payloads.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(name))
    }
}

// ============================================================================
// COLORS
// ============================================================================

/// Parse `#RRGGBB` into RGB bytes.  A channel that fails to parse becomes 0,
/// so a malformed string still produces a usable (darker) color.
///
/// Shorthand hex is not expanded: only whole two-digit pairs count, so
/// `#FFF` is `[0xFF, 0, 0]`, not white.
pub fn parse_hex_color(hex: &str) -> [u8; 3] {
    let digits = hex.trim().trim_start_matches('#');
    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        *channel = digits
            .get(i * 2..i * 2 + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .unwrap_or(0);
    }
    rgb
}

pub fn format_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

// ============================================================================
// UNITS
// ============================================================================

/// Physical unit for user-facing dimensions.  Pixel math never sees millimetres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Unit {
    #[default]
    Px,
    Mm,
}

impl Unit {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "px" | "pixel" | "pixels" => Some(Unit::Px),
            "mm" | "millimeter" | "millimeters" => Some(Unit::Mm),
            _ => None,
        }
    }

    /// Convert a length in this unit to whole pixels at `ppi`.
    pub fn to_px(&self, value: f64, ppi: u32) -> u32 {
        let px = match self {
            Unit::Px => value,
            Unit::Mm => value / MM_PER_INCH * ppi.max(1) as f64,
        };
        if px.is_nan() {
            return 1;
        }
        px.round().clamp(1.0, u32::MAX as f64) as u32
    }

    /// Convert whole pixels to this unit at `ppi`.
    pub fn from_px(&self, px: u32, ppi: u32) -> f64 {
        match self {
            Unit::Px => px as f64,
            Unit::Mm => px as f64 / ppi.max(1) as f64 * MM_PER_INCH,
        }
    }
}

// ============================================================================
// SETTINGS RECORD
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrainSettings {
    pub width: u32,
    pub height: u32,
    pub ppi: u32,
    /// 0..1, scales noise into alpha.
    pub intensity: f64,
    /// 1..20, output pixels per grain cell.
    pub scale: f64,
    /// 0..1, blur radius is `roughness * 10` px.
    pub roughness: f64,
    /// 0..1, global alpha of the grain layer.
    pub opacity: f64,
    /// 0..1, clumping strength; at or below 0.05 no mask is built.
    pub randomness: f64,
    pub seed: i32,
    pub bg_color: String,
    pub grain_color: String,
    pub texture: TextureType,
    pub monochrome: bool,
}

impl Default for GrainSettings {
    fn default() -> Self {
        Self {
            width: 2000,
            height: 2000,
            ppi: 300,
            intensity: 0.5,
            scale: 1.0,
            roughness: 0.0,
            opacity: 1.0,
            randomness: 0.0,
            seed: 42,
            bg_color: "#FFFFFF".to_string(),
            grain_color: "#000000".to_string(),
            texture: TextureType::Uniform,
            monochrome: true,
        }
    }
}

/// Clamp to `[lo, hi]`; NaN falls back to `fallback`.
fn clamp_or(value: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if value.is_nan() { fallback } else { value.clamp(lo, hi) }
}

impl GrainSettings {
    /// Copy with every field forced into its valid range.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let width = self.width.clamp(1, MAX_DIMENSION);
        let mut height = self.height.clamp(1, MAX_DIMENSION);
        if width as u64 * height as u64 > MAX_PIXELS {
            height = (MAX_PIXELS / width as u64).max(1) as u32;
        }
        Self {
            width,
            height,
            ppi: self.ppi.max(1),
            intensity: clamp_or(self.intensity, 0.0, 1.0, defaults.intensity),
            scale: clamp_or(self.scale, MIN_SCALE, MAX_SCALE, defaults.scale),
            roughness: clamp_or(self.roughness, 0.0, 1.0, defaults.roughness),
            opacity: clamp_or(self.opacity, 0.0, 1.0, defaults.opacity),
            randomness: clamp_or(self.randomness, 0.0, 1.0, defaults.randomness),
            seed: self.seed,
            bg_color: self.bg_color.clone(),
            grain_color: self.grain_color.clone(),
            texture: self.texture,
            monochrome: self.monochrome,
        }
    }

    /// Size of the rendered buffer after clamping.
    pub fn output_dimensions(&self) -> (u32, u32) {
        let s = self.sanitized();
        (s.width, s.height)
    }

    /// Size of the noise grid: one cell per `scale × scale` output pixels.
    pub fn noise_dimensions(&self) -> (u32, u32) {
        let s = self.sanitized();
        let scale = s.scale.max(1.0);
        let nw = (s.width as f64 / scale).ceil().max(1.0) as u32;
        let nh = (s.height as f64 / scale).ceil().max(1.0) as u32;
        (nw, nh)
    }

    pub fn bg_rgb(&self) -> [u8; 3] {
        parse_hex_color(&self.bg_color)
    }

    pub fn grain_rgb(&self) -> [u8; 3] {
        parse_hex_color(&self.grain_color)
    }

    /// Physical size of the clamped output in `unit`.
    pub fn physical_size(&self, unit: Unit) -> (f64, f64) {
        let s = self.sanitized();
        (unit.from_px(s.width, s.ppi), unit.from_px(s.height, s.ppi))
    }

    /// Overwrite only the fields present in `patch`.
    pub fn merge(&self, patch: &SettingsPatch) -> Self {
        Self {
            width: patch.width.unwrap_or(self.width),
            height: patch.height.unwrap_or(self.height),
            ppi: patch.ppi.unwrap_or(self.ppi),
            intensity: patch.intensity.unwrap_or(self.intensity),
            scale: patch.scale.unwrap_or(self.scale),
            roughness: patch.roughness.unwrap_or(self.roughness),
            opacity: patch.opacity.unwrap_or(self.opacity),
            randomness: patch.randomness.unwrap_or(self.randomness),
            seed: patch.seed.unwrap_or(self.seed),
            bg_color: patch.bg_color.clone().unwrap_or_else(|| self.bg_color.clone()),
            grain_color: patch.grain_color.clone().unwrap_or_else(|| self.grain_color.clone()),
            texture: patch.texture.unwrap_or(self.texture),
            monochrome: patch.monochrome.unwrap_or(self.monochrome),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// A partial settings record.  Absent fields leave the base untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppi: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub randomness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grain_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture: Option<TextureType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monochrome: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Error reading a settings file.
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "I/O error: {}", e),
            SettingsError::Parse(e) => write!(f, "Invalid settings JSON: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e.to_string())
    }
}

/// Load a (possibly partial) settings JSON file.
pub fn load_patch(path: &std::path::Path) -> Result<SettingsPatch, SettingsError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

// ============================================================================
// PRESETS
// ============================================================================

/// Named starting points.  Presets touch grain fields only, never dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    FineEditorial,
    CoarsePrint,
    NightSpeckle,
    SoftClouds,
    Risograph,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::FineEditorial,
        Preset::CoarsePrint,
        Preset::NightSpeckle,
        Preset::SoftClouds,
        Preset::Risograph,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::FineEditorial => "fine-editorial",
            Preset::CoarsePrint => "coarse-print",
            Preset::NightSpeckle => "night-speckle",
            Preset::SoftClouds => "soft-clouds",
            Preset::Risograph => "risograph",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn patch(&self) -> SettingsPatch {
        let base = SettingsPatch {
            roughness: Some(0.0),
            opacity: Some(1.0),
            randomness: Some(0.0),
            bg_color: Some("#FFFFFF".to_string()),
            grain_color: Some("#000000".to_string()),
            monochrome: Some(true),
            ..Default::default()
        };
        match self {
            Preset::FineEditorial => SettingsPatch {
                intensity: Some(0.35),
                scale: Some(1.0),
                texture: Some(TextureType::Film),
                ..base
            },
            Preset::CoarsePrint => SettingsPatch {
                intensity: Some(0.7),
                scale: Some(4.0),
                roughness: Some(0.2),
                texture: Some(TextureType::Uniform),
                ..base
            },
            Preset::NightSpeckle => SettingsPatch {
                intensity: Some(0.8),
                scale: Some(1.0),
                texture: Some(TextureType::Speckle),
                bg_color: Some("#000000".to_string()),
                grain_color: Some("#FFFFFF".to_string()),
                ..base
            },
            Preset::SoftClouds => SettingsPatch {
                intensity: Some(0.6),
                scale: Some(2.0),
                randomness: Some(0.7),
                texture: Some(TextureType::Gaussian),
                ..base
            },
            Preset::Risograph => SettingsPatch {
                intensity: Some(0.55),
                scale: Some(3.0),
                randomness: Some(0.4),
                opacity: Some(0.85),
                texture: Some(TextureType::Film),
                ..base
            },
        }
    }

    pub fn apply(&self, base: &GrainSettings) -> GrainSettings {
        base.merge(&self.patch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parses_valid_colors() {
        assert_eq!(parse_hex_color("#FFFFFF"), [255, 255, 255]);
        assert_eq!(parse_hex_color("#1a2B3c"), [0x1a, 0x2b, 0x3c]);
        assert_eq!(parse_hex_color("000000"), [0, 0, 0]);
    }

    #[test]
    fn hex_failed_channels_default_to_zero() {
        assert_eq!(parse_hex_color("#ZZ8040"), [0, 0x80, 0x40]);
        assert_eq!(parse_hex_color("#FF"), [255, 0, 0]);
        assert_eq!(parse_hex_color("#FFF"), [255, 0, 0]);
        assert_eq!(parse_hex_color("#FFFFF"), [255, 255, 0]);
        assert_eq!(parse_hex_color(""), [0, 0, 0]);
        assert_eq!(parse_hex_color("#é0000"), [0, 0, 0]);
    }

    #[test]
    fn hex_round_trips_through_formatter() {
        assert_eq!(format_hex_color([0xAB, 0x01, 0xFF]), "#AB01FF");
    }

    #[test]
    fn sanitized_clamps_everything() {
        let s = GrainSettings {
            width: 999_999,
            height: 0,
            ppi: 0,
            intensity: 3.0,
            scale: 0.2,
            roughness: -1.0,
            opacity: f64::NAN,
            randomness: 7.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!((s.width, s.height), (MAX_DIMENSION, 1));
        assert_eq!(s.ppi, 1);
        assert_eq!(s.intensity, 1.0);
        assert_eq!(s.scale, MIN_SCALE);
        assert_eq!(s.roughness, 0.0);
        assert_eq!(s.opacity, 1.0);
        assert_eq!(s.randomness, 1.0);
    }

    #[test]
    fn noise_dimensions_round_up() {
        let s = GrainSettings { width: 101, height: 100, scale: 10.0, ..Default::default() };
        assert_eq!(s.noise_dimensions(), (11, 10));
        let s = GrainSettings { width: 7, height: 3, scale: 20.0, ..Default::default() };
        assert_eq!(s.noise_dimensions(), (1, 1));
    }

    #[test]
    fn mm_conversion_uses_ppi() {
        assert_eq!(Unit::Mm.to_px(25.4, 300), 300);
        assert_eq!(Unit::Px.to_px(123.4, 300), 123);
        assert!((Unit::Mm.from_px(600, 300) - 50.8).abs() < 1e-9);
        assert_eq!(Unit::Mm.to_px(-5.0, 300), 1);
    }

    #[test]
    fn merge_only_touches_present_fields() {
        let base = GrainSettings::default();
        let patch = SettingsPatch {
            intensity: Some(0.9),
            texture: Some(TextureType::Speckle),
            ..Default::default()
        };
        let merged = base.merge(&patch);
        assert_eq!(merged.intensity, 0.9);
        assert_eq!(merged.texture, TextureType::Speckle);
        assert_eq!(merged.width, base.width);
        assert_eq!(merged.bg_color, base.bg_color);
    }

    #[test]
    fn merge_with_empty_and_full_patches() {
        let base = GrainSettings { seed: 9, bg_color: "#123456".into(), ..Default::default() };
        assert_eq!(base.merge(&SettingsPatch::default()), base);

        let full = SettingsPatch {
            width: Some(10),
            height: Some(20),
            ppi: Some(72),
            intensity: Some(0.1),
            scale: Some(3.0),
            roughness: Some(0.4),
            opacity: Some(0.6),
            randomness: Some(0.7),
            seed: Some(-1),
            bg_color: Some("#000000".into()),
            grain_color: Some("#FFFFFF".into()),
            texture: Some(TextureType::Film),
            monochrome: Some(false),
        };
        let merged = base.merge(&full);
        assert_eq!((merged.width, merged.height, merged.ppi), (10, 20, 72));
        assert_eq!((merged.intensity, merged.scale, merged.roughness), (0.1, 3.0, 0.4));
        assert_eq!((merged.opacity, merged.randomness, merged.seed), (0.6, 0.7, -1));
        assert_eq!((merged.bg_color.as_str(), merged.grain_color.as_str()), ("#000000", "#FFFFFF"));
        assert_eq!(merged.texture, TextureType::Film);
        assert!(!merged.monochrome);
    }

    #[test]
    fn json_uses_camel_case_and_upper_texture() {
        let json = GrainSettings::default().to_json();
        assert!(json.contains("\"bgColor\""));
        assert!(json.contains("\"UNIFORM\""));

        let parsed: GrainSettings =
            serde_json::from_str(r##"{"width": 640, "texture": "FILM", "grainColor": "#112233"}"##)
                .unwrap();
        assert_eq!(parsed.width, 640);
        assert_eq!(parsed.texture, TextureType::Film);
        assert_eq!(parsed.grain_rgb(), [0x11, 0x22, 0x33]);
        assert_eq!(parsed.height, GrainSettings::default().height);
    }

    #[test]
    fn presets_keep_dimensions() {
        let base = GrainSettings { width: 640, height: 480, ..Default::default() };
        for preset in Preset::ALL {
            let s = preset.apply(&base);
            assert_eq!((s.width, s.height), (640, 480));
            assert_eq!(Preset::parse(preset.name()), Some(preset));
        }
    }

    #[test]
    fn texture_parse_is_case_insensitive() {
        assert_eq!(TextureType::parse("speckle"), Some(TextureType::Speckle));
        assert_eq!(TextureType::parse(" Film "), Some(TextureType::Film));
        assert_eq!(TextureType::parse("perlin"), None);
    }
}
