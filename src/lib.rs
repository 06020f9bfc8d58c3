#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod arena;
pub mod backend;
pub mod config;
pub mod errors;
pub mod geom;
pub mod list;
pub mod manager;
pub mod math;
pub mod scene;
pub mod utils;

pub use arena::{ArenaMark, FrameArena, ObjectPool};
pub use backend::{Framebuffer, SurfaceBackendView};
pub use config::{Antialiasing, OptFlags, RuntimeConfig};
pub use errors::{Result, SceneError};
pub use geom::BBox;
pub use list::{ElemArena, ElemRef};
pub use manager::{Platform, SceneManager, SceneThread};
pub use scene::{Camera, Light, Material, NodeHandle, ObjectData, ObjectKind, Scene, Shape};
