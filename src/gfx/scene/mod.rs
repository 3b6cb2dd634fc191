//! Scene management: the object arena, draggable set, and mesh data.

pub mod object;
pub mod registry;
pub mod vertex;

pub use object::{Mesh, Object};
pub use registry::{ModelId, SceneRegistry};
pub use vertex::Vertex3D;
