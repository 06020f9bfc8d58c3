//! The object model (§3.1-3.3): hierarchy/transform data (`node`,
//! `transform`, `transform_system`), per-kind payloads (`camera`,
//! `light`, `surface`, `material`), the relation template (`relations`),
//! and the `Scene` container tying them together (§3.5).

pub mod camera;
pub mod handles;
pub mod light;
pub mod material;
pub mod node;
pub mod relations;
pub mod scene;
pub mod surface;
pub mod transform;
pub mod transform_system;

pub use camera::Camera;
pub use handles::{MaterialHandle, NodeHandle};
pub use light::Light;
pub use material::Material;
pub use node::{Animator, ObjectData, ObjectKind};
pub use relations::{apply_relations, BvnodeOverrideKind, BvnodeOverrides, Relation, RelationCode};
pub use scene::Scene;
pub use surface::{bbox_from_shape, Shape, SurfaceKind};
pub use transform::Trm;
pub use transform_system::update_hierarchy;
