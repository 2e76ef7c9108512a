//! A drawable: geometry plus what it can be drawn with, and the GPU buffers
//! realized from it on first use.
//!
//! Readiness moves `NoData → DataReady` when the geometry gets vertices and
//! `DataReady → BufferReady` when [`SceneObject::build_buffers`] uploads them.
//! Replacing the geometry drops back to `DataReady` (or `NoData`).

use std::sync::Arc;

use asset::{Geometry, TextureData};

use crate::context::{BufferHandle, GpuVertex, GraphicsContext, ShaderHandle, TextureHandle};
use crate::material::Material;
use crate::RenderResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    NoData,
    DataReady,
    BufferReady,
}

/// Index buffer and how many indices it holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexRange {
    pub buffer: BufferHandle,
    pub count: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct GpuBuffers {
    pub vertex: BufferHandle,
    pub vertex_count: u32,
    pub triangles: Option<IndexRange>,
    pub lines: Option<IndexRange>,
}

#[derive(Debug)]
pub struct SceneObject {
    name: String,
    geometry: Geometry,
    material: Option<Material>,
    line_shader: Option<ShaderHandle>,
    face_shader: Option<ShaderHandle>,
    use_blending: bool,
    buffers: Option<GpuBuffers>,
    retired: Vec<BufferHandle>,
    retired_texture: Option<TextureHandle>,
    /// Uploaded material texture, keyed by the CPU texture it came from.
    texture: Option<(Arc<TextureData>, TextureHandle)>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: Geometry::new(),
            material: None,
            line_shader: None,
            face_shader: None,
            use_blending: false,
            buffers: None,
            retired: Vec::new(),
            retired_texture: None,
            texture: None,
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.set_geometry(geometry);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    /// Draw edges with this shader.
    pub fn with_line_shader(mut self, shader: ShaderHandle) -> Self {
        self.line_shader = Some(shader);
        self
    }

    /// Draw faces with this shader.
    pub fn with_face_shader(mut self, shader: ShaderHandle) -> Self {
        self.face_shader = Some(shader);
        self
    }

    pub fn with_blending(mut self, use_blending: bool) -> Self {
        self.use_blending = use_blending;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    #[inline]
    pub fn line_shader(&self) -> Option<ShaderHandle> {
        self.line_shader
    }

    #[inline]
    pub fn face_shader(&self) -> Option<ShaderHandle> {
        self.face_shader
    }

    #[inline]
    pub fn use_blending(&self) -> bool {
        self.use_blending
    }

    pub fn state(&self) -> ReadyState {
        if self.buffers.is_some() {
            ReadyState::BufferReady
        } else if self.geometry.has_data() {
            ReadyState::DataReady
        } else {
            ReadyState::NoData
        }
    }

    /// Swaps the material; the old texture is freed on the next draw.
    pub fn set_material(&mut self, material: Option<Material>) {
        self.material = material;
        if let Some((_, handle)) = self.texture.take() {
            self.retired_texture = Some(handle);
        }
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.update_geometry(|g| *g = geometry);
    }

    /// Edits the geometry in place; GPU buffers are rebuilt on the next draw.
    pub fn update_geometry(&mut self, edit: impl FnOnce(&mut Geometry)) {
        edit(&mut self.geometry);
        if let Some(old) = self.buffers.take() {
            self.retired.push(old.vertex);
            self.retired.extend(old.triangles.map(|r| r.buffer));
            self.retired.extend(old.lines.map(|r| r.buffer));
        }
    }

    /// Uploads vertex and index buffers if not done yet.
    /// Returns `true` when this call performed the upload.
    pub fn build_buffers(&mut self, ctx: &mut dyn GraphicsContext) -> RenderResult<bool> {
        for handle in self.retired.drain(..) {
            ctx.release_buffer(handle);
        }
        if self.buffers.is_some() || !self.geometry.has_data() {
            return Ok(false);
        }
        self.geometry.validate()?;

        let vertices = GpuVertex::interleave(&self.geometry);
        let vertex = ctx.create_vertex_buffer(&format!("{} VB", self.name), &vertices)?;

        let triangles = match self.face_shader {
            Some(_) if !self.geometry.faces.is_empty() => {
                let indices = self.geometry.triangle_indices();
                let buffer = ctx.create_index_buffer(&format!("{} faces IB", self.name), &indices)?;
                Some(IndexRange {
                    buffer,
                    count: indices.len() as u32,
                })
            }
            _ => None,
        };
        let lines = match self.line_shader {
            Some(_) if !self.geometry.edges.is_empty() => {
                let indices = self.geometry.line_indices();
                let buffer = ctx.create_index_buffer(&format!("{} edges IB", self.name), &indices)?;
                Some(IndexRange {
                    buffer,
                    count: indices.len() as u32,
                })
            }
            _ => None,
        };

        log::debug!(
            "'{}': uploaded {} vertices, {} triangle indices, {} line indices",
            self.name,
            vertices.len(),
            triangles.map_or(0, |r| r.count),
            lines.map_or(0, |r| r.count)
        );
        self.buffers = Some(GpuBuffers {
            vertex,
            vertex_count: vertices.len() as u32,
            triangles,
            lines,
        });
        Ok(true)
    }

    pub(crate) fn buffers(&self) -> Option<&GpuBuffers> {
        self.buffers.as_ref()
    }

    /// GPU texture for the material, uploaded the first time it is available.
    pub(crate) fn realize_texture(&mut self, ctx: &mut dyn GraphicsContext) -> RenderResult<Option<TextureHandle>> {
        if let Some(handle) = self.retired_texture.take() {
            ctx.release_texture(handle);
        }
        let Some(tex) = self.material.as_ref().and_then(Material::texture) else {
            return Ok(None);
        };
        if let Some((uploaded, handle)) = &self.texture {
            if Arc::ptr_eq(uploaded, &tex) {
                return Ok(Some(*handle));
            }
        }
        let handle = ctx.create_texture(&format!("{} texture", self.name), &tex)?;
        if let Some((_, old)) = self.texture.replace((tex, handle)) {
            ctx.release_texture(old);
        }
        Ok(Some(handle))
    }
}
