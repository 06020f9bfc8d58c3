//! The scene manager (§4.6): platform selection and the five-phase
//! per-frame pipeline.

pub mod pipeline;
pub mod platform;
pub mod thread_pool;

pub use pipeline::{SceneManager, SceneThread};
pub use platform::{Platform, RayonPlatform, SequentialPlatform};
pub use thread_pool::select_platform;
