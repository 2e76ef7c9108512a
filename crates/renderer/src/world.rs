//! The globe scene: a textured sphere with a glow halo, optional reference
//! axes, and the per-frame matrix composition for each part.

use std::path::PathBuf;

use asset::{build_axes_geometry, build_globe_geometry, build_glowring_geometry, TextureData};
use corelib::{DVec3, Matrix4, Transform, WorldCamera};

use crate::context::{GraphicsContext, ShaderKind};
use crate::material::Material;
use crate::renderer::{DrawOutcome, Renderer};
use crate::scene_object::SceneObject;
use crate::RenderResult;

/// Where the sphere's surface image comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum GlobeTexture {
    /// Procedural lon/lat grid, available immediately.
    Graticule,
    /// Equirectangular PNG, loaded in the background.
    File(PathBuf),
}

#[derive(Clone, Debug)]
pub struct GlobeOptions {
    pub radius: f32,
    pub lon_segments: u32,
    pub lat_segments: u32,
    pub texture: GlobeTexture,
    pub background: [f32; 3],
    pub glow_color: [f32; 4],
    pub glow_inner_radius: f32,
    pub glow_outer_radius: f32,
    pub glow_segments: u32,
}

impl Default for GlobeOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            lon_segments: 72,
            lat_segments: 36,
            texture: GlobeTexture::Graticule,
            background: [0.0, 0.0, 0.0],
            glow_color: [0.45, 0.65, 1.0, 0.8],
            glow_inner_radius: 1.0,
            glow_outer_radius: 1.25,
            glow_segments: 128,
        }
    }
}

pub struct WorldGlobe {
    sphere: SceneObject,
    glow_ring: SceneObject,
    background: [f32; 3],
    model: Matrix4,
}

impl WorldGlobe {
    pub fn new(ctx: &mut dyn GraphicsContext, options: GlobeOptions) -> RenderResult<Self> {
        let textured = ctx.create_shader(ShaderKind::Textured)?;

        let surface = surface_material(&options.texture);
        let sphere = SceneObject::new("globe")
            .with_geometry(build_globe_geometry(
                options.radius,
                options.lon_segments,
                options.lat_segments,
                true,
            ))
            .with_material(surface)
            .with_face_shader(textured);

        let glow_ring = SceneObject::new("glow ring")
            .with_geometry(build_glowring_geometry(
                options.glow_inner_radius * options.radius,
                options.glow_outer_radius * options.radius,
                options.glow_segments,
            ))
            .with_material(Material::from_texture("glow", TextureData::glow_fade(64, options.glow_color)))
            .with_face_shader(textured)
            .with_blending(true);

        log::info!(
            "globe: {}x{} segments, texture {:?}",
            options.lon_segments,
            options.lat_segments,
            options.texture
        );
        Ok(Self {
            sphere,
            glow_ring,
            background: options.background,
            model: Matrix4::identity(),
        })
    }

    /// Replaces the model matrix with `T ∘ R ∘ S` of `transform`.
    pub fn set_transformation(&mut self, transform: &Transform) {
        self.model = transform.matrix();
    }

    /// Translates in world space, after any existing transformation.
    pub fn translate(&mut self, offset: DVec3) {
        self.model
            .set_multiply_to_the_left(&Matrix4::translation(offset.x, offset.y, offset.z));
    }

    pub fn rotate(&mut self, axis: DVec3, angle_deg: f64) {
        self.model
            .set_multiply_to_the_left(&Matrix4::rotation(axis, angle_deg));
    }

    pub fn scale(&mut self, factor: DVec3) {
        self.model
            .set_multiply_to_the_left(&Matrix4::scaling(factor.x, factor.y, factor.z));
    }

    #[inline]
    pub fn model_matrix(&self) -> &Matrix4 {
        &self.model
    }

    #[inline]
    pub fn background(&self) -> [f32; 3] {
        self.background
    }

    pub fn set_background(&mut self, background: [f32; 3]) {
        self.background = background;
    }

    /// Replaces the surface image; the previous GPU texture is freed on the next frame.
    pub fn set_surface(&mut self, texture: &GlobeTexture) {
        log::info!("globe: surface texture {texture:?}");
        self.sphere.set_material(Some(surface_material(texture)));
    }

    /// Why the surface texture could not be loaded, if it failed.
    pub fn texture_error(&self) -> Option<String> {
        self.sphere.material().and_then(Material::load_error)
    }

    pub fn sphere(&self) -> &SceneObject {
        &self.sphere
    }

    pub fn glow_ring(&self) -> &SceneObject {
        &self.glow_ring
    }
}

fn surface_material(texture: &GlobeTexture) -> Material {
    match texture {
        GlobeTexture::Graticule => Material::from_texture("globe", TextureData::graticule(1024, 512, 15.0)),
        GlobeTexture::File(path) => Material::load_texture("globe", path.clone()),
    }
}

/// Outcome of each part of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    pub axes: Option<DrawOutcome>,
    pub globe: DrawOutcome,
    pub glow_ring: DrawOutcome,
}

pub struct WorldRenderer {
    globe: WorldGlobe,
    axes: SceneObject,
    show_axes: bool,
    renderer: Renderer,
}

impl WorldRenderer {
    pub fn new(ctx: &mut dyn GraphicsContext, globe: WorldGlobe, show_axes: bool) -> RenderResult<Self> {
        let vertex_color = ctx.create_shader(ShaderKind::VertexColor)?;
        let axes = SceneObject::new("axes")
            .with_geometry(build_axes_geometry(2.0))
            .with_line_shader(vertex_color);
        Ok(Self {
            globe,
            axes,
            show_axes,
            renderer: Renderer::new(),
        })
    }

    #[inline]
    pub fn globe(&self) -> &WorldGlobe {
        &self.globe
    }

    #[inline]
    pub fn globe_mut(&mut self) -> &mut WorldGlobe {
        &mut self.globe
    }

    #[inline]
    pub fn show_axes(&self) -> bool {
        self.show_axes
    }

    pub fn set_show_axes(&mut self, show: bool) {
        self.show_axes = show;
    }

    #[inline]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Records one frame.
    ///
    /// Axes use the view matrix alone, the sphere uses `view ∘ model`, and the
    /// glow ring is pinned in camera space at the eye's distance from the globe
    /// center so it always faces the viewer.
    pub fn render(&mut self, ctx: &mut dyn GraphicsContext, camera: &WorldCamera) -> RenderResult<FrameReport> {
        let cam = camera.camera();
        let internal = cam.internal();
        ctx.set_viewport(internal.width, internal.height);
        let [r, g, b] = self.globe.background;
        ctx.clear([r, g, b, 1.0]);

        let proj = cam.proj_matrix();
        let view = cam.view_matrix();

        let axes = if self.show_axes {
            Some(self.renderer.render(ctx, &mut self.axes, proj, view)?)
        } else {
            None
        };

        let globe_mv = view.multiply_to_the_right(&self.globe.model);
        let globe = self.renderer.render(ctx, &mut self.globe.sphere, proj, &globe_mv)?;

        let ring_mv = Matrix4::translation(0.0, 0.0, -cam.center().length());
        let glow_ring = self.renderer.render(ctx, &mut self.globe.glow_ring, proj, &ring_mv)?;

        Ok(FrameReport { axes, globe, glow_ring })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::recording::RecordingContext;
    use crate::context::Primitive;

    fn assert_mat_eq(a: &[f32; 16], b: &Matrix4) {
        let b = b.to_gpu_array();
        for i in 0..16 {
            assert!((a[i] - b[i]).abs() < 1e-5, "element {i}: {} vs {}", a[i], b[i]);
        }
    }

    fn small_options() -> GlobeOptions {
        GlobeOptions {
            lon_segments: 8,
            lat_segments: 4,
            glow_segments: 16,
            background: [0.1, 0.2, 0.3],
            ..Default::default()
        }
    }

    #[test]
    fn transformation_is_translation_rotation_scale() {
        let mut ctx = RecordingContext::default();
        let mut globe = WorldGlobe::new(&mut ctx, small_options()).unwrap();
        let t = Transform::from_trs(DVec3::new(1.0, 2.0, 3.0), DVec3::Z, 90.0, DVec3::splat(2.0));
        globe.set_transformation(&t);

        let p = globe.model_matrix().multiply_vector3(DVec3::X);
        // scale to (2,0,0), rotate to (0,2,0), translate
        assert!((p - DVec3::new(1.0, 4.0, 3.0)).length() < 1e-12);
    }

    #[test]
    fn incremental_operations_apply_after_existing_ones() {
        let mut ctx = RecordingContext::default();
        let mut globe = WorldGlobe::new(&mut ctx, small_options()).unwrap();
        globe.scale(DVec3::splat(3.0));
        globe.translate(DVec3::new(0.0, 0.0, 1.0));
        globe.rotate(DVec3::X, 90.0);

        // (1,0,0) -> (3,0,0) -> (3,0,1) -> (3,-1,0)
        let p = globe.model_matrix().multiply_vector3(DVec3::X);
        assert!((p - DVec3::new(3.0, -1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn frame_composes_matrices_per_part() {
        let mut ctx = RecordingContext::default();
        let mut globe = WorldGlobe::new(&mut ctx, small_options()).unwrap();
        globe.rotate(DVec3::Z, 30.0);
        let mut world = WorldRenderer::new(&mut ctx, globe, true).unwrap();

        let mut camera = WorldCamera::new(800, 600);
        camera.set_pose_by_lon_lat(40.0, 25.0, 6.0);
        let report = world.render(&mut ctx, &camera).unwrap();
        assert_eq!(
            report,
            FrameReport {
                axes: Some(DrawOutcome::Drawn),
                globe: DrawOutcome::Drawn,
                glow_ring: DrawOutcome::Drawn,
            }
        );

        assert_eq!(ctx.viewports, vec![(800, 600)]);
        assert_eq!(ctx.clears, vec![[0.1, 0.2, 0.3, 1.0]]);
        assert_eq!(ctx.draws.len(), 3);

        let cam = camera.camera();
        let (axes, sphere, ring) = (&ctx.draws[0], &ctx.draws[1], &ctx.draws[2]);
        assert_eq!(axes.primitive, Primitive::Lines);
        assert_mat_eq(&axes.proj, cam.proj_matrix());
        assert_mat_eq(&axes.model_view, cam.view_matrix());

        let globe_mv = cam.view_matrix().multiply_to_the_right(world.globe().model_matrix());
        assert_eq!(sphere.primitive, Primitive::Triangles);
        assert!(!sphere.blending);
        assert_mat_eq(&sphere.model_view, &globe_mv);

        assert!(ring.blending);
        assert_mat_eq(&ring.model_view, &Matrix4::translation(0.0, 0.0, -6.0));
    }

    #[test]
    fn hidden_axes_are_not_drawn() {
        let mut ctx = RecordingContext::default();
        let globe = WorldGlobe::new(&mut ctx, small_options()).unwrap();
        let mut world = WorldRenderer::new(&mut ctx, globe, false).unwrap();
        let camera = WorldCamera::new(640, 480);

        let report = world.render(&mut ctx, &camera).unwrap();
        assert_eq!(report.axes, None);
        assert_eq!(ctx.draws.len(), 2);
        assert!(ctx.draws.iter().all(|d| d.primitive == Primitive::Triangles));

        world.set_show_axes(true);
        world.render(&mut ctx, &camera).unwrap();
        assert_eq!(ctx.draws.len(), 5);
    }

    #[test]
    fn buffers_are_uploaded_on_first_frame_only() {
        let mut ctx = RecordingContext::default();
        let globe = WorldGlobe::new(&mut ctx, small_options()).unwrap();
        let mut world = WorldRenderer::new(&mut ctx, globe, true).unwrap();
        let camera = WorldCamera::new(640, 480);
        for _ in 0..4 {
            world.render(&mut ctx, &camera).unwrap();
        }
        assert_eq!(ctx.vertex_uploads.len(), 3);
        assert_eq!(ctx.textures.len(), 2);
        assert_eq!(ctx.draws.len(), 12);
    }

    #[test]
    fn missing_texture_file_still_draws_the_globe() {
        let mut ctx = RecordingContext::default();
        let options = GlobeOptions {
            texture: GlobeTexture::File(PathBuf::from("/no/such/earth.png")),
            ..small_options()
        };
        let globe = WorldGlobe::new(&mut ctx, options).unwrap();
        crate::material::tests::wait_until_loaded(globe.sphere().material().unwrap());
        let mut world = WorldRenderer::new(&mut ctx, globe, false).unwrap();

        assert!(world.globe().texture_error().is_some());
        let report = world.render(&mut ctx, &WorldCamera::new(640, 480)).unwrap();
        assert_eq!(report.globe, DrawOutcome::Drawn);
        assert_eq!(ctx.draws[0].texture, None);
    }

    #[test]
    fn switching_surface_frees_the_previous_texture() {
        let mut ctx = RecordingContext::default();
        let globe = WorldGlobe::new(&mut ctx, small_options()).unwrap();
        let mut world = WorldRenderer::new(&mut ctx, globe, false).unwrap();
        let camera = WorldCamera::new(640, 480);
        world.render(&mut ctx, &camera).unwrap();
        let first = ctx.draws[0].texture.unwrap();

        world.globe_mut().set_surface(&GlobeTexture::Graticule);
        world.render(&mut ctx, &camera).unwrap();
        assert_eq!(ctx.released_textures, vec![first]);
        assert_eq!(ctx.textures.len(), 3);
        assert!(ctx.released.is_empty());
    }
}
