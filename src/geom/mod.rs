//! Geometry: the bounding-volume model (§4.2) and the geometry predicates
//! that operate over it (§4.1).

pub mod bounds;
pub mod predicates;

pub use bounds::{BBox, Edge, Face, Vert};
pub use predicates::{
    bbox_fuse, bbox_shad, bbox_side, bbox_sort, clip_side, edge_edge, surf_side, vert_face,
    BboxSortOrder, HitClass, ThresholdMode, ORDER_FIRST, ORDER_FIRST_OBSCURES, ORDER_INTERPENETRATE_1,
    ORDER_INTERPENETRATE_2, ORDER_NEUTRAL, ORDER_SECOND, ORDER_SECOND_OBSCURES,
};
