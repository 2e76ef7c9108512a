//! CPU-side scene data: tessellated geometry and texture images.
//! Nothing here touches the GPU.

pub mod builders;
pub mod geometry;
pub mod texture;

pub use builders::{build_axes_geometry, build_globe_geometry, build_glowring_geometry};
pub use geometry::{Face, Geometry, GeometryError};
pub use texture::TextureData;
