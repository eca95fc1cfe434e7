//! Asset kinds understood by the authoring tool

use serde::{Deserialize, Serialize};

/// What sort of model an asset is
///
/// Only [`AssetKind::Structure`] carries two-level sphere bounds; characters
/// use bone-attached body spheres which are handled elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AssetKind {
    /// Static scenery and buildings
    #[default]
    Structure,
    /// Skinned, animated characters
    Character,
    /// Equipment worn on the head
    HeadGear,
    /// Light weapons
    EquipLight,
    /// Small arms
    EquipSmallArms,
    /// Support weapons
    EquipSupport,
}

impl AssetKind {
    /// Name written to model settings files
    pub fn settings_name(self) -> &'static str {
        match self {
            AssetKind::Structure => "Structure",
            AssetKind::Character => "Character",
            AssetKind::HeadGear => "GearHead",
            AssetKind::EquipLight => "EquipLight",
            AssetKind::EquipSmallArms => "EquipSmallArms",
            AssetKind::EquipSupport => "EquipSupport",
        }
    }

    /// Parse a settings-file name
    pub fn from_settings_name(name: &str) -> Option<Self> {
        [
            AssetKind::Structure,
            AssetKind::Character,
            AssetKind::HeadGear,
            AssetKind::EquipLight,
            AssetKind::EquipSmallArms,
            AssetKind::EquipSupport,
        ]
        .into_iter()
        .find(|kind| kind.settings_name() == name.trim())
    }

    /// True when structure bounds can be fitted to this kind
    pub fn supports_structure_bounds(self) -> bool {
        self == AssetKind::Structure
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.settings_name())
    }
}
