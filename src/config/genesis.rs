use serde::{Deserialize, Serialize};
use std::path::Path;

/// What kind of disturbance to seed.
///
/// `Auto` decides from position: monsoon depressions in the West Pacific and North
/// Indian monsoon trough (sometimes), subtropical storms poleward of 25 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenesisKind {
    Tropical,
    Subtropical,
    Monsoon,
    Auto,
}

fn default_intensity() -> f64 {
    25.0
}

fn default_size_km() -> f64 {
    300.0
}

fn default_kind() -> GenesisKind {
    GenesisKind::Auto
}

/// Where and how a new storm forms.
/// Stored with the run for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisParams {
    pub lon: f64,
    pub lat: f64,
    #[serde(default = "default_intensity")]
    pub intensity: f64,
    #[serde(default = "default_size_km")]
    pub size_km: f64,
    #[serde(default = "default_kind")]
    pub kind: GenesisKind,
}

impl GenesisParams {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            intensity: default_intensity(),
            size_km: default_size_km(),
            kind: default_kind(),
        }
    }

    /// Load genesis parameters from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        let params: Self =
            toml::from_str(&content).map_err(|e| format!("Invalid TOML in {}: {}", path.display(), e))?;
        params.validate()?;
        Ok(params)
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(-180.0..=360.0).contains(&self.lon) {
            return Err(format!("lon must be -180 to 360, got {}", self.lon));
        }
        if !(-45.0..=45.0).contains(&self.lat) {
            return Err(format!("lat must be -45 to 45, got {}", self.lat));
        }
        if self.lat.abs() < 3.0 {
            return Err(format!(
                "lat must be at least 3 degrees from the equator, got {}",
                self.lat
            ));
        }
        if !(15.0..=60.0).contains(&self.intensity) {
            return Err(format!("intensity must be 15-60 kt, got {}", self.intensity));
        }
        if !(100.0..=1200.0).contains(&self.size_km) {
            return Err(format!("size_km must be 100-1200, got {}", self.size_km));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn valid_params() {
        assert!(GenesisParams::new(-45.0, 12.0).validate().is_ok());
    }

    #[test]
    fn equatorial_genesis_rejected() {
        let err = GenesisParams::new(140.0, 1.0).validate().unwrap_err();
        assert!(err.contains("equator"), "Error should mention equator: {}", err);
    }

    #[test]
    fn invalid_intensity() {
        let params = GenesisParams {
            intensity: 120.0,
            ..GenesisParams::new(140.0, 12.0)
        };
        let err = params.validate().unwrap_err();
        assert!(err.contains("intensity"), "Error should mention intensity: {}", err);
    }

    #[test]
    fn from_toml_string() {
        let toml_str = r#"
lon = 135.0
lat = 14.5
kind = "monsoon"
"#;
        let params: GenesisParams = toml::from_str(toml_str).unwrap();
        assert_eq!(params.kind, GenesisKind::Monsoon);
        assert_eq!(params.intensity, 25.0);
        assert_eq!(params.size_km, 300.0);
        params.validate().unwrap();
    }

    #[test]
    fn from_file_valid() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmpfile,
            r#"
lon = -60.0
lat = 31.0
intensity = 35.0
size_km = 450.0
kind = "subtropical"
"#
        )
        .unwrap();

        let params = GenesisParams::from_file(tmpfile.path()).unwrap();
        assert_eq!(params.kind, GenesisKind::Subtropical);
        assert_eq!(params.size_km, 450.0);
    }

    #[test]
    fn from_file_missing() {
        let err = GenesisParams::from_file(Path::new("/nonexistent/genesis.toml")).unwrap_err();
        assert!(err.contains("Cannot read"), "Error: {}", err);
    }

    #[test]
    fn from_file_invalid_toml() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "this is not valid toml {{{{").unwrap();

        let err = GenesisParams::from_file(tmpfile.path()).unwrap_err();
        assert!(err.contains("Invalid TOML"), "Error: {}", err);
    }

    #[test]
    fn unknown_kind_rejected() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "lon = 10.0\nlat = 12.0\nkind = \"polar\"\n").unwrap();
        assert!(GenesisParams::from_file(tmpfile.path()).is_err());
    }
}
