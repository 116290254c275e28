//! Controller type ids and labels
//!
//! Ids are only unique per node kind: 100 is a mesh's self-illumination
//! colour but a light's vertical displacement. Labels are unique globally.

use super::types::NodeKind;

pub const POSITION: u32 = 8;
pub const ORIENTATION: u32 = 20;
pub const SCALE: u32 = 36;

pub const MESH_SELF_ILLUM_COLOR: u32 = 100;
pub const MESH_ALPHA: u32 = 132;

pub const LIGHT_COLOR: u32 = 76;
pub const LIGHT_RADIUS: u32 = 88;
pub const LIGHT_SHADOW_RADIUS: u32 = 96;
pub const LIGHT_VERTICAL_DISPLACEMENT: u32 = 100;
pub const LIGHT_MULTIPLIER: u32 = 140;

/// Controller namespace a node kind draws its ids from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerSet {
    Base,
    Mesh,
    Light,
    Emitter,
}

impl ControllerSet {
    pub fn of(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Light(_) => Self::Light,
            NodeKind::Emitter(_) => Self::Emitter,
            kind if kind.mesh().is_some() => Self::Mesh,
            _ => Self::Base,
        }
    }
}

const BASE: [(u32, &str); 3] = [
    (POSITION, "position"),
    (ORIENTATION, "orientation"),
    (SCALE, "scale"),
];

const MESH: [(u32, &str); 2] = [
    (MESH_SELF_ILLUM_COLOR, "selfillumcolor"),
    (MESH_ALPHA, "alpha"),
];

const LIGHT: [(u32, &str); 5] = [
    (LIGHT_COLOR, "color"),
    (LIGHT_RADIUS, "radius"),
    (LIGHT_SHADOW_RADIUS, "shadowradius"),
    (LIGHT_VERTICAL_DISPLACEMENT, "verticaldisplacement"),
    (LIGHT_MULTIPLIER, "multiplier"),
];

const EMITTER: [(u32, &str); 48] = [
    (80, "alphaEnd"),
    (84, "alphaStart"),
    (88, "birthrate"),
    (92, "bounce_co"),
    (96, "combinetime"),
    (100, "drag"),
    (104, "fps"),
    (108, "frameEnd"),
    (112, "frameStart"),
    (116, "grav"),
    (120, "lifeExp"),
    (124, "mass"),
    (128, "p2p_bezier2"),
    (132, "p2p_bezier3"),
    (136, "particleRot"),
    (140, "randvel"),
    (144, "sizeStart"),
    (148, "sizeEnd"),
    (152, "sizeStart_y"),
    (156, "sizeEnd_y"),
    (160, "spread"),
    (164, "threshold"),
    (168, "velocity"),
    (172, "xsize"),
    (176, "ysize"),
    (180, "blurlength"),
    (184, "lightningDelay"),
    (188, "lightningRadius"),
    (192, "lightningScale"),
    (196, "lightningSubDiv"),
    (200, "lightningzigzag"),
    (216, "alphaMid"),
    (220, "percentStart"),
    (224, "percentMid"),
    (228, "percentEnd"),
    (232, "sizeMid"),
    (236, "sizeMid_y"),
    (240, "m_fRandomBirthRate"),
    (252, "targetsize"),
    (256, "numcontrolpts"),
    (260, "controlptradius"),
    (264, "controlptdelay"),
    (268, "tangentspread"),
    (272, "tangentlength"),
    (284, "colorMid"),
    (380, "colorEnd"),
    (392, "colorStart"),
    (502, "detonate"),
];

fn table(set: ControllerSet) -> &'static [(u32, &'static str)] {
    match set {
        ControllerSet::Base => &[],
        ControllerSet::Mesh => &MESH,
        ControllerSet::Light => &LIGHT,
        ControllerSet::Emitter => &EMITTER,
    }
}

/// Label of controller `id` on a node of the given set.
pub fn label_for(set: ControllerSet, id: u32) -> Option<&'static str> {
    BASE.iter()
        .chain(table(set))
        .find(|(candidate, _)| *candidate == id)
        .map(|(_, label)| *label)
}

/// Id of a labelled controller, valid on a node of the given set.
pub fn id_for(set: ControllerSet, label: &str) -> Option<u32> {
    BASE.iter()
        .chain(table(set))
        .find(|(_, candidate)| *candidate == label)
        .map(|(id, _)| *id)
}

/// Set that owns a label, regardless of node kind.
pub fn set_for_label(label: &str) -> Option<ControllerSet> {
    [
        ControllerSet::Base,
        ControllerSet::Mesh,
        ControllerSet::Light,
        ControllerSet::Emitter,
    ]
    .into_iter()
    .find(|&set| id_for(set, label).is_some())
}

/// Value columns of one key of a labelled controller.
pub fn dimension(label: &str) -> usize {
    match label {
        "position" | "color" | "selfillumcolor" | "colorStart" | "colorMid" | "colorEnd" => 3,
        "orientation" => 4,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::mdl::types::{Light, Mesh};

    #[test]
    fn test_ids_are_per_set() {
        assert_eq!(label_for(ControllerSet::Mesh, 100), Some("selfillumcolor"));
        assert_eq!(label_for(ControllerSet::Light, 100), Some("verticaldisplacement"));
        assert_eq!(label_for(ControllerSet::Emitter, 100), Some("drag"));
        assert_eq!(label_for(ControllerSet::Base, 100), None);
        assert_eq!(label_for(ControllerSet::Light, 8), Some("position"));
    }

    #[test]
    fn test_labels_are_global() {
        assert_eq!(set_for_label("birthrate"), Some(ControllerSet::Emitter));
        assert_eq!(set_for_label("alpha"), Some(ControllerSet::Mesh));
        assert_eq!(set_for_label("orientation"), Some(ControllerSet::Base));
        assert_eq!(set_for_label("nonsense"), None);
        assert_eq!(id_for(ControllerSet::Emitter, "detonate"), Some(502));
    }

    #[test]
    fn test_set_of_kind() {
        assert_eq!(ControllerSet::of(&NodeKind::Dummy), ControllerSet::Base);
        assert_eq!(ControllerSet::of(&NodeKind::Trimesh(Mesh::default())), ControllerSet::Mesh);
        assert_eq!(ControllerSet::of(&NodeKind::Light(Light::default())), ControllerSet::Light);
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(dimension("orientation"), 4);
        assert_eq!(dimension("colorStart"), 3);
        assert_eq!(dimension("birthrate"), 1);
    }
}
