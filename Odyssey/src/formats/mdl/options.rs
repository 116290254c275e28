//! Encode and decode options

use serde::{Deserialize, Serialize};

use super::constants::{FunctionPointers, MODEL_FN_PTRS};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Pc,
    Xbox,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    /// Knights of the Old Republic.
    #[default]
    Kotor,
    /// The Sith Lords.
    Tsl,
}

/// The game build a model targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub edition: Edition,
    pub platform: Platform,
}

impl Target {
    pub fn new(edition: Edition, platform: Platform) -> Self {
        Self { edition, platform }
    }

    /// Identify the build from the geometry header function pointers.
    ///
    /// # Errors
    /// Returns [`Error::UnknownModelVersion`] for an unknown pair.
    pub fn detect(fn_ptr1: u32, fn_ptr2: u32) -> Result<Self> {
        let pairs = [
            Self::new(Edition::Kotor, Platform::Pc),
            Self::new(Edition::Tsl, Platform::Pc),
            Self::new(Edition::Kotor, Platform::Xbox),
            Self::new(Edition::Tsl, Platform::Xbox),
        ];
        MODEL_FN_PTRS
            .iter()
            .zip(pairs)
            .find(|(ptrs, _)| **ptrs == (fn_ptr1, fn_ptr2))
            .map(|(_, target)| target)
            .ok_or(Error::UnknownModelVersion { fn_ptr1, fn_ptr2 })
    }

    /// The pair this target uses from a function-pointer table.
    pub fn pick(self, table: &FunctionPointers) -> (u32, u32) {
        let index = match (self.edition, self.platform) {
            (Edition::Kotor, Platform::Pc) => 0,
            (Edition::Tsl, Platform::Pc) => 1,
            (Edition::Kotor, Platform::Xbox) => 2,
            (Edition::Tsl, Platform::Xbox) => 3,
        };
        table[index]
    }

    pub fn is_tsl(self) -> bool {
        self.edition == Edition::Tsl
    }

    pub fn is_xbox(self) -> bool {
        self.platform == Platform::Xbox
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdlWriteOptions {
    pub platform: Platform,
    pub edition: Edition,
    /// Store animation orientations as packed 32-bit quaternions. Lossy.
    pub compress_quaternions: bool,
}

impl MdlWriteOptions {
    pub fn target(&self) -> Target {
        Target::new(self.edition, self.platform)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdlReadOptions {
    /// Deepest node nesting accepted from a file.
    pub max_depth: usize,
}

impl Default for MdlReadOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::mdl::constants::ANIMATION_FN_PTRS;

    #[test]
    fn test_detect_round_trips_pick() {
        for edition in [Edition::Kotor, Edition::Tsl] {
            for platform in [Platform::Pc, Platform::Xbox] {
                let target = Target::new(edition, platform);
                let (a, b) = target.pick(&MODEL_FN_PTRS);
                assert_eq!(Target::detect(a, b).unwrap(), target);
            }
        }
    }

    #[test]
    fn test_detect_rejects_animation_pointers() {
        let (a, b) = ANIMATION_FN_PTRS[0];
        assert!(matches!(
            Target::detect(a, b),
            Err(Error::UnknownModelVersion { .. })
        ));
    }

    #[test]
    fn test_options_from_json() {
        let options: MdlWriteOptions =
            serde_json::from_str(r#"{"platform": "xbox", "compress_quaternions": true}"#).unwrap();
        assert_eq!(options.target(), Target::new(Edition::Kotor, Platform::Xbox));
        assert!(options.compress_quaternions);
        assert_eq!(MdlReadOptions::default().max_depth, 256);
    }
}
