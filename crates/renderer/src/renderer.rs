//! Draw submission for a single [`SceneObject`].

use corelib::Matrix4;

use crate::context::{DrawCall, GraphicsContext, Primitive};
use crate::scene_object::SceneObject;
use crate::RenderResult;

/// What happened to a draw request this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    /// At least one draw call was issued.
    Drawn,
    /// The material is still loading; try again next frame.
    Deferred,
    /// Nothing to draw: no vertex data, or no shader matching the geometry.
    Empty,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub draw_calls: u64,
    pub deferred: u64,
}

#[derive(Debug, Default)]
pub struct Renderer {
    stats: RenderStats,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Draws `object` with the given projection and model-view matrices.
    ///
    /// Buffers are realized on the first call. A loading material defers the
    /// object without error; faces and edges are drawn with their own shaders.
    pub fn render(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        object: &mut SceneObject,
        proj: &Matrix4,
        model_view: &Matrix4,
    ) -> RenderResult<DrawOutcome> {
        if object.material().is_some_and(|m| m.is_loading()) {
            log::trace!("'{}': material still loading, deferred", object.name());
            self.stats.deferred += 1;
            return Ok(DrawOutcome::Deferred);
        }

        object.build_buffers(ctx)?;
        let texture = object.realize_texture(ctx)?;
        let Some(buffers) = object.buffers().cloned() else {
            return Ok(DrawOutcome::Empty);
        };

        let color = object.material().map_or([1.0; 4], |m| m.color());
        let proj = proj.to_gpu_array();
        let model_view = model_view.to_gpu_array();
        let passes = [
            (object.face_shader(), Primitive::Triangles, buffers.triangles),
            (object.line_shader(), Primitive::Lines, buffers.lines),
        ];

        let mut drawn = false;
        for (shader, primitive, range) in passes {
            let (Some(shader), Some(range)) = (shader, range) else {
                continue;
            };
            ctx.draw(&DrawCall {
                shader,
                primitive,
                vertex_buffer: buffers.vertex,
                index_buffer: Some(range.buffer),
                count: range.count,
                texture,
                color,
                blending: object.use_blending(),
                proj,
                model_view,
            })?;
            self.stats.draw_calls += 1;
            drawn = true;
        }

        Ok(if drawn {
            DrawOutcome::Drawn
        } else {
            DrawOutcome::Empty
        })
    }
}
