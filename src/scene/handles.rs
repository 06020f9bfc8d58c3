//! Strongly-typed `SlotMap` keys for scene objects (§3.1, §6.2).

use slotmap::new_key_type;

new_key_type! {
    /// Handle for any object in the hierarchy (Array, Surface, Camera, Light).
    pub struct NodeHandle;

    /// Handle for a Material (§4.3.3), referenced by a Surface's outer/inner slot.
    pub struct MaterialHandle;
}
