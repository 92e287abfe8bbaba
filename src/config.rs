//! Server configuration parsed from environment variables.

use std::path::PathBuf;

use crate::geo::LatLon;
use crate::view::{DEFAULT_CENTER, DEFAULT_ZOOM};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    /// Handed to widgets so they can load the Maps JavaScript API.
    pub api_key: String,
    /// Widget assets served as the router fallback.
    pub static_dir: Option<PathBuf>,
    /// Center for maps created without one.
    pub default_center: LatLon,
    pub default_zoom: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_key: String::new(),
            static_dir: None,
            default_center: DEFAULT_CENTER,
            default_zoom: DEFAULT_ZOOM,
        }
    }
}

impl Config {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `MAPS_API_KEY`: default empty (widget runs in development mode)
    /// - `STATIC_DIR`: no static files when absent
    /// - `DEFAULT_CENTER_LAT` / `DEFAULT_CENTER_LON`: default Greenwich
    /// - `DEFAULT_ZOOM`: default 8
    ///
    /// # Errors
    ///
    /// Returns `Invalid` when a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` when a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            port: parse_var(&lookup, "PORT", defaults.port)?,
            api_key: lookup("MAPS_API_KEY").unwrap_or_default(),
            static_dir: lookup("STATIC_DIR").filter(|v| !v.is_empty()).map(PathBuf::from),
            default_center: LatLon::new(
                parse_var(&lookup, "DEFAULT_CENTER_LAT", defaults.default_center.lat)?,
                parse_var(&lookup, "DEFAULT_CENTER_LON", defaults.default_center.lon)?,
            ),
            default_zoom: parse_var(&lookup, "DEFAULT_ZOOM", defaults.default_zoom)?,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
