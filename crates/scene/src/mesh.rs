use std::rc::Rc;

use materia_common::Transform;

use crate::geometry::Geometry;
use crate::material::SharedMaterial;

/// A drawable object: immutable geometry, the shared material, and a
/// transform the frame loop rewrites every tick.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub geometry: Rc<Geometry>,
    pub material: SharedMaterial,
    pub transform: Transform,
}

impl Mesh {
    pub(crate) fn new(
        name: impl Into<String>,
        geometry: Rc<Geometry>,
        material: SharedMaterial,
        transform: Transform,
    ) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            transform,
        }
    }
}
