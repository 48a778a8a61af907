use std::path::{Path, PathBuf};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::{
    error::{RplError, RplResult},
    object::ObjectId,
};

/// Environment variable overriding the location of the settings file.
pub const ENV_SETTINGS_PATH: &str = "RPL_CONFIG_PATH";

/// Decimal precision tier. Each tier has a fixed number of significant digits.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumIter,
    IntoStaticStr,
)]
pub enum Precision {
    Decimal32,
    #[default]
    Decimal64,
    Decimal128,
}

impl Precision {
    /// Number of significant decimal digits kept by this tier.
    pub const fn digits(self) -> u64 {
        match self {
            Precision::Decimal32 => 7,
            Precision::Decimal64 => 16,
            Precision::Decimal128 => 34,
        }
    }

    pub const fn id(self) -> ObjectId {
        match self {
            Precision::Decimal32 => ObjectId::Decimal32,
            Precision::Decimal64 => ObjectId::Decimal64,
            Precision::Decimal128 => ObjectId::Decimal128,
        }
    }

    pub fn from_id(id: ObjectId) -> Option<Self> {
        Self::iter().find(|p| p.id() == id)
    }

    pub fn to_str(self) -> &'static str {
        self.into()
    }
}

bitflags! {
    /// Rendering options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct RenderFlags: u16 {
        /// Render commands with their long name (`sin` becomes `sine`).
        const LONG_NAMES = 1 << 0;
        const UPPERCASE = 1 << 1;
        const LOWERCASE = 1 << 2;
        /// Use `·` for multiplication.
        const MULTIPLY_DOT = 1 << 3;
        /// Use `×` for multiplication.
        const MULTIPLY_CROSS = 1 << 4;
        /// Render improper fractions as a whole part and a proper fraction.
        const MIXED_FRACTIONS = 1 << 5;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Precision tier used for decimals produced from exact operands.
    pub precision: Precision,
    /// Convert fraction results to decimals.
    pub numerical_results: bool,
    pub case_sensitive: bool,
    pub render: RenderFlags,
    pub solver_iterations: u32,
    /// Digits of the working precision the solver may lose when testing for convergence.
    pub solver_imprecision: u32,
    /// Initial heap size in bytes.
    pub heap_size: usize,
    /// The heap never grows beyond this size.
    pub heap_limit: usize,
    pub max_recursion: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            precision: Precision::Decimal64,
            numerical_results: false,
            case_sensitive: true,
            render: RenderFlags::empty(),
            solver_iterations: 1024,
            solver_imprecision: 3,
            heap_size: 16 * 1024,
            heap_limit: 16 * 1024 * 1024,
            max_recursion: 128,
        }
    }
}

impl Settings {
    /// Get the default path to the settings file.
    pub fn default_path() -> PathBuf {
        if let Ok(config_path) = std::env::var(ENV_SETTINGS_PATH) {
            return config_path.into();
        }

        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }
            path.push("rpl");
            path.push("settings.toml");
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            }
            path.push("rpl");
            path.push("settings.toml");
        }

        path
    }

    pub fn from_toml_str(source: &str, file: &str) -> RplResult<Self> {
        toml::from_str(source).map_err(|e| RplError::Config {
            message: e.to_string(),
            file: file.to_string(),
        })
    }

    /// Load settings from a TOML file. Missing keys take their default value.
    pub fn load_from_toml(path: &Path) -> RplResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str, &path.display().to_string())
    }

    /// Load the settings file at [`Settings::default_path`], or the defaults if there is none.
    pub fn load_or_default() -> RplResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from_toml(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_toml(&self, path: &Path) -> RplResult<()> {
        let toml_str = toml::to_string(self).map_err(|e| RplError::Config {
            message: e.to_string(),
            file: path.display().to_string(),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str)?;
        Ok(())
    }
}
