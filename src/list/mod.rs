//! The list-construction engine (§4.5): `insert`, `filter`, `snode`,
//! `sclip`, `stile`, `ssort`, `lsort`, operating over the `ELEM` arena.

pub mod elem;
pub mod filter;
pub mod insert;
pub mod lsort;
pub mod sclip;
pub mod snode;
pub mod ssort;
pub mod stile;

pub use elem::{Elem, ElemArena, ElemPayload, ElemRef};
pub use filter::{drops_bvnodes_for_camera, filter};
pub use insert::insert;
pub use lsort::{lsort_target, LightSides};
pub use sclip::sclip;
pub use snode::{snode, ChainEntry, ChainKind, SnodeChain};
pub use ssort::{ssort_global, ssort_target, SidedList};
pub use stile::{stile, TileGrid};
