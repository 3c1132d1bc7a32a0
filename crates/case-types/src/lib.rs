pub mod affine;
pub mod bounds;
pub mod frame;
pub mod quality;
pub mod vec3;

pub use affine::Affine;
pub use bounds::{Aabb, Rect2};
pub use frame::{CaseVariant, Frame, MirrorPlane};
pub use quality::MeshQuality;
