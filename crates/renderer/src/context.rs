//! The graphics-context capability set the scene draws through.
//!
//! Scene code never issues backend commands itself: it uploads buffers and
//! textures, obtains shader handles, and submits [`DrawCall`]s. Each backend
//! maps the symbolic [`Primitive`] and [`ShaderKind`] to its own constants.

use asset::{Geometry, TextureData};
use bytemuck::{Pod, Zeroable};

use crate::RenderResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Points,
    Lines,
    Triangles,
}

/// Shader programs a backend must provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Vertex color times the draw color.
    VertexColor,
    /// Texture sample times vertex color times the draw color.
    Textured,
}

/// Interleaved vertex: position + normal + uv + color.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl GpuVertex {
    /// Interleaves geometry attributes; absent ones get +Z normals,
    /// zero UVs and opaque white.
    pub fn interleave(geometry: &Geometry) -> Vec<GpuVertex> {
        geometry
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &pos)| GpuVertex {
                pos,
                normal: geometry.normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]),
                uv: geometry.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                color: geometry.colors.get(i).copied().unwrap_or([1.0; 4]),
            })
            .collect()
    }
}

/// One draw: matrices are column-major, `proj` in OpenGL clip convention.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub shader: ShaderHandle,
    pub primitive: Primitive,
    pub vertex_buffer: BufferHandle,
    /// Indexed draw when present; otherwise `count` vertices in order.
    pub index_buffer: Option<BufferHandle>,
    pub count: u32,
    pub texture: Option<TextureHandle>,
    pub color: [f32; 4],
    pub blending: bool,
    pub proj: [f32; 16],
    pub model_view: [f32; 16],
}

pub trait GraphicsContext {
    fn create_vertex_buffer(&mut self, label: &str, vertices: &[GpuVertex]) -> RenderResult<BufferHandle>;

    fn create_index_buffer(&mut self, label: &str, indices: &[u32]) -> RenderResult<BufferHandle>;

    /// Frees a buffer; unknown handles are ignored.
    fn release_buffer(&mut self, handle: BufferHandle);

    fn create_texture(&mut self, label: &str, texture: &TextureData) -> RenderResult<TextureHandle>;

    /// Frees a texture; unknown handles are ignored.
    fn release_texture(&mut self, handle: TextureHandle);

    fn create_shader(&mut self, kind: ShaderKind) -> RenderResult<ShaderHandle>;

    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clears color (to `color`) and depth.
    fn clear(&mut self, color: [f32; 4]);

    fn draw(&mut self, call: &DrawCall) -> RenderResult<()>;
}

/// Recording context for tests: hands out sequential handles and keeps
/// every call it receives.
#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    #[derive(Default)]
    pub struct RecordingContext {
        pub vertex_uploads: Vec<(String, usize)>,
        pub index_uploads: Vec<(String, Vec<u32>)>,
        pub released: Vec<BufferHandle>,
        pub textures: Vec<String>,
        pub released_textures: Vec<TextureHandle>,
        pub shaders: Vec<ShaderKind>,
        pub viewports: Vec<(u32, u32)>,
        pub clears: Vec<[f32; 4]>,
        pub draws: Vec<DrawCall>,
        next_buffer: u32,
    }

    impl RecordingContext {
        fn next_buffer(&mut self) -> BufferHandle {
            self.next_buffer += 1;
            BufferHandle(self.next_buffer)
        }
    }

    impl GraphicsContext for RecordingContext {
        fn create_vertex_buffer(&mut self, label: &str, vertices: &[GpuVertex]) -> RenderResult<BufferHandle> {
            self.vertex_uploads.push((label.to_string(), vertices.len()));
            Ok(self.next_buffer())
        }

        fn create_index_buffer(&mut self, label: &str, indices: &[u32]) -> RenderResult<BufferHandle> {
            self.index_uploads.push((label.to_string(), indices.to_vec()));
            Ok(self.next_buffer())
        }

        fn release_buffer(&mut self, handle: BufferHandle) {
            self.released.push(handle);
        }

        fn create_texture(&mut self, label: &str, _texture: &TextureData) -> RenderResult<TextureHandle> {
            self.textures.push(label.to_string());
            Ok(TextureHandle(self.textures.len() as u32))
        }

        fn release_texture(&mut self, handle: TextureHandle) {
            self.released_textures.push(handle);
        }

        fn create_shader(&mut self, kind: ShaderKind) -> RenderResult<ShaderHandle> {
            self.shaders.push(kind);
            Ok(ShaderHandle(self.shaders.len() as u32))
        }

        fn set_viewport(&mut self, width: u32, height: u32) {
            self.viewports.push((width, height));
        }

        fn clear(&mut self, color: [f32; 4]) {
            self.clears.push(color);
        }

        fn draw(&mut self, call: &DrawCall) -> RenderResult<()> {
            self.draws.push(call.clone());
            Ok(())
        }
    }
}
