//! Scene objects, draw gating and frame composition for the globe,
//! plus a wgpu implementation of the graphics context they draw through.

use thiserror::Error;

pub mod context;
pub mod gpu;
pub mod material;
pub mod renderer;
pub mod scene_object;
pub mod world;

pub use context::{
    BufferHandle, DrawCall, GpuVertex, GraphicsContext, Primitive, ShaderHandle, ShaderKind,
    TextureHandle,
};
pub use gpu::WgpuContext;
pub use material::Material;
pub use renderer::{DrawOutcome, RenderStats, Renderer};
pub use scene_object::{ReadyState, SceneObject};
pub use world::{FrameReport, GlobeOptions, GlobeTexture, WorldGlobe, WorldRenderer};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid geometry: {0}")]
    Geometry(#[from] asset::GeometryError),
    #[error("graphics backend: {0}")]
    Backend(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
