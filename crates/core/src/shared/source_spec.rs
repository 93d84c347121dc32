use std::fmt;
use std::path::{Path, PathBuf};

use super::constants::IMAGE_EXTENSIONS;

/// Where frames come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSpec {
    Camera(u32),
    File(PathBuf),
}

impl SourceSpec {
    pub fn is_image(&self) -> bool {
        match self {
            SourceSpec::Camera(_) => false,
            SourceSpec::File(path) => is_image_path(path),
        }
    }

    /// Live sources keep producing frames until stopped; files end.
    pub fn is_live(&self) -> bool {
        matches!(self, SourceSpec::Camera(_))
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::Camera(index) => write!(f, "camera {index}"),
            SourceSpec::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
