use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use glam::{Vec2, Vec3};
use materia_assets::TextureHandle;
use serde::{Deserialize, Serialize};

/// Which faces of a mesh are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Optional texture inputs. Slots hold handles into the texture library;
/// a handle whose load failed renders as if the slot were empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterialMaps {
    pub map: Option<TextureHandle>,
    pub ao_map: Option<TextureHandle>,
    pub displacement_map: Option<TextureHandle>,
    pub metalness_map: Option<TextureHandle>,
    pub roughness_map: Option<TextureHandle>,
    pub normal_map: Option<TextureHandle>,
    pub alpha_map: Option<TextureHandle>,
}

impl MaterialMaps {
    /// Slots in binding order.
    pub fn slots(&self) -> [Option<TextureHandle>; 7] {
        [
            self.map,
            self.ao_map,
            self.displacement_map,
            self.metalness_map,
            self.roughness_map,
            self.normal_map,
            self.alpha_map,
        ]
    }
}

/// Physically-based material parameters (standard metal/rough model plus
/// the clearcoat, sheen, iridescence and transmission extensions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub color: Vec3,
    pub opacity: f32,
    pub transparent: bool,
    pub side: Side,

    pub metalness: f32,
    pub roughness: f32,
    pub env_map_intensity: f32,
    pub ao_map_intensity: f32,
    pub displacement_scale: f32,
    pub displacement_bias: f32,
    pub normal_scale: Vec2,

    pub clearcoat: f32,
    pub clearcoat_roughness: f32,

    pub sheen: f32,
    pub sheen_roughness: f32,
    pub sheen_color: Vec3,

    pub iridescence: f32,
    pub iridescence_ior: f32,
    /// Thin-film thickness in nanometres, `[min, max]`.
    pub iridescence_thickness_range: [f32; 2],

    pub transmission: f32,
    pub ior: f32,
    pub thickness: f32,

    #[serde(skip)]
    pub maps: MaterialMaps,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            opacity: 1.0,
            transparent: false,
            side: Side::Front,
            metalness: 0.0,
            roughness: 1.0,
            env_map_intensity: 1.0,
            ao_map_intensity: 1.0,
            displacement_scale: 1.0,
            displacement_bias: 0.0,
            normal_scale: Vec2::ONE,
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            sheen: 0.0,
            sheen_roughness: 1.0,
            sheen_color: Vec3::ZERO,
            iridescence: 0.0,
            iridescence_ior: 1.3,
            iridescence_thickness_range: [100.0, 400.0],
            transmission: 0.0,
            ior: 1.5,
            thickness: 0.0,
            maps: MaterialMaps::default(),
        }
    }
}

impl Material {
    /// Fully metallic, fully rough: the viewer's starting point.
    pub fn demo() -> Self {
        Self {
            metalness: 1.0,
            roughness: 1.0,
            ..Self::default()
        }
    }
}

/// Scalar material parameters addressable by name, used by the parameter
/// panel and the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialProperty {
    Metalness,
    Roughness,
    Opacity,
    EnvMapIntensity,
    AoMapIntensity,
    DisplacementScale,
    Clearcoat,
    ClearcoatRoughness,
    Sheen,
    SheenRoughness,
    Iridescence,
    IridescenceIor,
    Transmission,
    Ior,
    Thickness,
}

impl MaterialProperty {
    pub const ALL: [MaterialProperty; 15] = [
        Self::Metalness,
        Self::Roughness,
        Self::Opacity,
        Self::EnvMapIntensity,
        Self::AoMapIntensity,
        Self::DisplacementScale,
        Self::Clearcoat,
        Self::ClearcoatRoughness,
        Self::Sheen,
        Self::SheenRoughness,
        Self::Iridescence,
        Self::IridescenceIor,
        Self::Transmission,
        Self::Ior,
        Self::Thickness,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Metalness => "metalness",
            Self::Roughness => "roughness",
            Self::Opacity => "opacity",
            Self::EnvMapIntensity => "envMapIntensity",
            Self::AoMapIntensity => "aoMapIntensity",
            Self::DisplacementScale => "displacementScale",
            Self::Clearcoat => "clearcoat",
            Self::ClearcoatRoughness => "clearcoatRoughness",
            Self::Sheen => "sheen",
            Self::SheenRoughness => "sheenRoughness",
            Self::Iridescence => "iridescence",
            Self::IridescenceIor => "iridescenceIOR",
            Self::Transmission => "transmission",
            Self::Ior => "ior",
            Self::Thickness => "thickness",
        }
    }

    pub fn get(self, m: &Material) -> f32 {
        match self {
            Self::Metalness => m.metalness,
            Self::Roughness => m.roughness,
            Self::Opacity => m.opacity,
            Self::EnvMapIntensity => m.env_map_intensity,
            Self::AoMapIntensity => m.ao_map_intensity,
            Self::DisplacementScale => m.displacement_scale,
            Self::Clearcoat => m.clearcoat,
            Self::ClearcoatRoughness => m.clearcoat_roughness,
            Self::Sheen => m.sheen,
            Self::SheenRoughness => m.sheen_roughness,
            Self::Iridescence => m.iridescence,
            Self::IridescenceIor => m.iridescence_ior,
            Self::Transmission => m.transmission,
            Self::Ior => m.ior,
            Self::Thickness => m.thickness,
        }
    }

    pub fn set(self, m: &mut Material, value: f32) {
        let slot = match self {
            Self::Metalness => &mut m.metalness,
            Self::Roughness => &mut m.roughness,
            Self::Opacity => &mut m.opacity,
            Self::EnvMapIntensity => &mut m.env_map_intensity,
            Self::AoMapIntensity => &mut m.ao_map_intensity,
            Self::DisplacementScale => &mut m.displacement_scale,
            Self::Clearcoat => &mut m.clearcoat,
            Self::ClearcoatRoughness => &mut m.clearcoat_roughness,
            Self::Sheen => &mut m.sheen,
            Self::SheenRoughness => &mut m.sheen_roughness,
            Self::Iridescence => &mut m.iridescence,
            Self::IridescenceIor => &mut m.iridescence_ior,
            Self::Transmission => &mut m.transmission,
            Self::Ior => &mut m.ior,
            Self::Thickness => &mut m.thickness,
        };
        *slot = value;
    }
}

/// The single material instance, shared by reference between every mesh,
/// the parameter panel and the renderer.
///
/// `Rc<RefCell<_>>` keeps it on the UI thread; a multi-threaded host would
/// swap this for a single-writer lock.
#[derive(Debug, Clone, Default)]
pub struct SharedMaterial(Rc<RefCell<Material>>);

impl SharedMaterial {
    pub fn new(material: Material) -> Self {
        Self(Rc::new(RefCell::new(material)))
    }

    pub fn borrow(&self) -> Ref<'_, Material> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Material> {
        self.0.borrow_mut()
    }

    /// Copy of the current parameters.
    pub fn snapshot(&self) -> Material {
        self.0.borrow().clone()
    }

    /// Whether both references point at the same instance.
    pub fn ptr_eq(&self, other: &SharedMaterial) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live references (meshes + panel + scene).
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_material_is_metal_and_rough() {
        let m = Material::demo();
        assert_eq!(m.metalness, 1.0);
        assert_eq!(m.roughness, 1.0);
        assert_eq!(m.maps, MaterialMaps::default());
    }

    #[test]
    fn property_get_set_roundtrip() {
        let mut m = Material::default();
        for (i, p) in MaterialProperty::ALL.iter().enumerate() {
            let v = 0.01 * (i as f32 + 1.0);
            p.set(&mut m, v);
            assert_eq!(p.get(&m), v, "{}", p.label());
        }
    }

    #[test]
    fn property_serde_names() {
        let p: MaterialProperty = serde_yaml::from_str("clearcoat_roughness").unwrap();
        assert_eq!(p, MaterialProperty::ClearcoatRoughness);
        assert_eq!(MaterialProperty::Ior.label(), "ior");
    }

    #[test]
    fn shared_material_writes_are_visible_through_clones() {
        let a = SharedMaterial::new(Material::demo());
        let b = a.clone();
        a.borrow_mut().roughness = 0.25;
        assert_eq!(b.borrow().roughness, 0.25);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.ref_count(), 2);
    }

    #[test]
    fn separate_materials_are_distinct() {
        let a = SharedMaterial::new(Material::demo());
        let b = SharedMaterial::new(Material::demo());
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let m: Material = serde_yaml::from_str("metalness: 0.5\nside: double\n").unwrap();
        assert_eq!(m.metalness, 0.5);
        assert_eq!(m.side, Side::Double);
        assert_eq!(m.ior, 1.5);
        assert_eq!(m.iridescence_thickness_range, [100.0, 400.0]);
    }
}
