//! Configuration vault – reads/writes `~/.geoanchor/config.toml`.

use geoanchor_runtime::SessionConfig;
use geoanchor_types::{GeoCoordinate, GeoError, Landmark, LocationOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// One landmark as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkEntry {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LandmarkEntry {
    fn new(id: &str, name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            latitude,
            longitude,
        }
    }

    /// Validate the coordinate and build a [`Landmark`].
    pub fn to_landmark(&self) -> Result<Landmark, GeoError> {
        let coordinate = GeoCoordinate::new(self.latitude, self.longitude)?;
        Ok(Landmark::new(&self.id, &self.name, coordinate))
    }
}

/// Persisted user configuration stored in `~/.geoanchor/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Minimum heading change (degrees) between compass samples.
    #[serde(default = "default_sample_rate")]
    pub compass_sample_rate_degrees: f64,

    /// Edge length of the drawn marker boxes, in meters.
    #[serde(default = "default_marker_size")]
    pub marker_size_m: f64,

    #[serde(default)]
    pub location: LocationOptions,

    #[serde(default = "default_landmarks")]
    pub landmarks: Vec<LandmarkEntry>,
}

fn default_sample_rate() -> f64 {
    geoanchor_hal::DEFAULT_SAMPLE_RATE_DEGREES
}
fn default_marker_size() -> f64 {
    50.0
}
fn default_landmarks() -> Vec<LandmarkEntry> {
    vec![
        LandmarkEntry::new("queens_hotel", "Queens Hotel", 53.796, -1.548),
        LandmarkEntry::new("town_hall", "Town Hall", 53.8, -1.55),
        LandmarkEntry::new("bank_house", "Bank House", 53.7974, -1.5494),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compass_sample_rate_degrees: default_sample_rate(),
            marker_size_m: default_marker_size(),
            location: LocationOptions::default(),
            landmarks: default_landmarks(),
        }
    }
}

impl Config {
    /// Build the landmark registry, rejecting the whole list if any entry
    /// has an out-of-range coordinate.
    pub fn landmarks(&self) -> Result<Vec<Landmark>, GeoError> {
        self.landmarks.iter().map(LandmarkEntry::to_landmark).collect()
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            compass_sample_rate_degrees: self.compass_sample_rate_degrees,
            location: self.location,
        }
    }
}

/// Return the path to `~/.geoanchor/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".geoanchor").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config = toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `GEOANCHOR_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `GEOANCHOR_COMPASS_RATE` | `compass_sample_rate_degrees` |
/// | `GEOANCHOR_MARKER_SIZE` | `marker_size_m` |
/// | `GEOANCHOR_HIGH_ACCURACY` | `location.high_accuracy` |
/// | `GEOANCHOR_LOCATION_TIMEOUT_MS` | `location.timeout_ms` |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("GEOANCHOR_COMPASS_RATE")
        && let Ok(rate) = v.parse::<f64>()
        && rate.is_finite()
        && rate >= 0.0
    {
        cfg.compass_sample_rate_degrees = rate;
    }
    if let Ok(v) = std::env::var("GEOANCHOR_MARKER_SIZE")
        && let Ok(size) = v.parse::<f64>()
        && size.is_finite()
        && size > 0.0
    {
        cfg.marker_size_m = size;
    }
    if let Ok(v) = std::env::var("GEOANCHOR_HIGH_ACCURACY")
        && let Ok(flag) = v.parse::<bool>()
    {
        cfg.location.high_accuracy = flag;
    }
    if let Ok(v) = std::env::var("GEOANCHOR_LOCATION_TIMEOUT_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.location.timeout_ms = ms;
    }
}

/// Save the config to disk, creating `~/.geoanchor/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Landmarks can reveal where the user goes; keep the directory private.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
