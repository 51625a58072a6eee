use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading or validating a viewer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level viewer configuration. Every field has a default; a YAML file
/// only needs to name what it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub scene: SceneConfig,
    pub helpers: HelperConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "earthview".into(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(10.0, 10.0, 10.0),
            target: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Directory that asset paths are resolved against.
    pub asset_root: PathBuf,
    /// Earth texture, relative to `asset_root`.
    pub texture: PathBuf,
    /// `0xRRGGBB`.
    pub clear_color: u32,
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub earth_radius: f32,
    pub earth_width_segments: u32,
    pub earth_height_segments: u32,
    /// Radians added to the Earth's Y rotation every frame.
    pub rotation_step: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("public"),
            texture: PathBuf::from("/assets/earth_day_4096.jpg"),
            clear_color: 0xffffff,
            ambient_color: 0xffffff,
            ambient_intensity: 1.0,
            earth_radius: 5.0,
            earth_width_segments: 32,
            earth_height_segments: 32,
            rotation_step: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    pub axes_size: f32,
    pub grid_size: f32,
    pub grid_divisions: u32,
    pub grid_center_color: u32,
    pub grid_color: u32,
    /// Render once more whenever the orbit controls change the view.
    pub rerender_on_change: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            axes_size: 50.0,
            grid_size: 300.0,
            grid_divisions: 300,
            grid_center_color: 0x004444,
            grid_color: 0x004444,
            rerender_on_change: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

impl ViewerConfig {
    /// Read a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Read `path` if given, otherwise use the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values that would produce a degenerate scene.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(msg.to_string()))
        };
        if self.window.width == 0 || self.window.height == 0 {
            return invalid("window size must be non-zero");
        }
        if !(positive(self.camera.fov_degrees) && self.camera.fov_degrees < 180.0) {
            return invalid("camera.fov_degrees must be in (0, 180)");
        }
        if !(positive(self.camera.near) && self.camera.far > self.camera.near) {
            return invalid("camera clip planes need 0 < near < far");
        }
        if !positive(self.scene.earth_radius) {
            return invalid("scene.earth_radius must be positive");
        }
        if !self.scene.rotation_step.is_finite() {
            return invalid("scene.rotation_step must be finite");
        }
        if !positive(self.helpers.grid_size) || self.helpers.grid_divisions == 0 {
            return invalid("grid needs a positive size and at least one division");
        }
        let h = &self.helpers;
        if !(h.rotate_speed.is_finite() && h.zoom_speed.is_finite() && h.pan_speed.is_finite()) {
            return invalid("helpers speeds must be finite");
        }
        if !(h.min_distance.is_finite() && h.min_distance >= 0.0) {
            return invalid("helpers.min_distance must be finite and non-negative");
        }
        // `max_distance` may be +inf.
        if h.max_distance.is_nan() || h.max_distance < h.min_distance {
            return invalid("helpers.max_distance must be at least helpers.min_distance");
        }
        Ok(())
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_scene() {
        let config = ViewerConfig::default();
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.camera.position, Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(config.scene.earth_radius, 5.0);
        assert_eq!(config.scene.earth_width_segments, 32);
        assert_eq!(config.scene.rotation_step, 0.01);
        assert_eq!(config.helpers.axes_size, 50.0);
        assert_eq!(config.helpers.grid_divisions, 300);
        assert_eq!(config.helpers.grid_color, 0x004444);
        assert!(config.helpers.rerender_on_change);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = ViewerConfig::from_yaml_str(
            "scene:\n  rotation_step: 0.02\nhelpers:\n  rerender_on_change: false\n",
        )
        .unwrap();
        assert_eq!(config.scene.rotation_step, 0.02);
        assert!(!config.helpers.rerender_on_change);
        assert_eq!(config.scene.earth_radius, 5.0);
        assert_eq!(config.window.title, "earthview");
    }

    #[test]
    fn vec3_fields_parse_as_sequences() {
        let config =
            ViewerConfig::from_yaml_str("camera:\n  position: [0.0, 5.0, 20.0]\n").unwrap();
        assert_eq!(config.camera.position, Vec3::new(0.0, 5.0, 20.0));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ViewerConfig::from_yaml_str("camera:\n  near: 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = ViewerConfig::from_yaml_str("helpers:\n  grid_divisions: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn nan_orbit_settings_are_rejected() {
        for yaml in [
            "helpers:\n  max_distance: .nan\n",
            "helpers:\n  min_distance: .nan\n",
            "helpers:\n  zoom_speed: .nan\n",
            "helpers:\n  pan_speed: .inf\n",
            "helpers:\n  min_distance: -1.0\n",
            "helpers:\n  min_distance: 10.0\n  max_distance: 5.0\n",
        ] {
            let err = ViewerConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{yaml:?} gave {err:?}");
        }
    }

    #[test]
    fn unbounded_max_distance_is_accepted() {
        let config = ViewerConfig::from_yaml_str("helpers:\n  max_distance: .inf\n").unwrap();
        assert_eq!(config.helpers.max_distance, f32::INFINITY);
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = ViewerConfig::from_yaml_str("scene: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.yaml");
        std::fs::write(&path, "window:\n  title: globe\n").unwrap();
        let config = ViewerConfig::load(&path).unwrap();
        assert_eq!(config.window.title, "globe");

        let missing = ViewerConfig::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(
            ViewerConfig::load_or_default(None).unwrap(),
            ViewerConfig::default()
        );
    }

    #[test]
    fn yaml_round_trip_preserves_config() {
        let config = ViewerConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(ViewerConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
