use crate::matrix::{Matrix3, Matrix4};
use crate::DVec3;

/// Lens and viewport parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraInternalParams {
    pub width: u32,
    pub height: u32,
    /// Vertical field of view in degrees.
    pub fov_deg: f64,
    /// Divides the frustum half-height; 2.0 shows half the extent.
    pub zoom: f64,
    pub near: f64,
    pub far: f64,
}

impl CameraInternalParams {
    #[inline]
    pub fn aspect(&self) -> f64 {
        self.width.max(1) as f64 / self.height.max(1) as f64
    }
}

/// Camera placement in world space: right (`cam_x`), up (`cam_y`) and
/// backward (`cam_z`) unit axes plus the eye position.
///
/// The axes must stay orthonormal; nothing checks this at runtime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub cam_x: DVec3,
    pub cam_y: DVec3,
    pub cam_z: DVec3,
    pub center: DVec3,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            cam_x: DVec3::X,
            cam_y: DVec3::Y,
            cam_z: DVec3::Z,
            center: DVec3::new(0.0, 0.0, 10.0),
        }
    }
}

/// Perspective camera (right-handed, OpenGL clip space z ∈ [-1, 1]).
/// Projection and view matrices are recomputed whenever their inputs change.
#[derive(Clone, Debug)]
pub struct Camera {
    internal: CameraInternalParams,
    pose: CameraPose,
    proj: Matrix4,
    view: Matrix4,
}

impl Camera {
    pub fn new(width: u32, height: u32, fov_deg: f64, near: f64, far: f64) -> Self {
        let mut cam = Self {
            internal: CameraInternalParams {
                width,
                height,
                fov_deg,
                zoom: 1.0,
                near,
                far,
            },
            pose: CameraPose::default(),
            proj: Matrix4::IDENTITY,
            view: Matrix4::IDENTITY,
        };
        cam.update_proj();
        cam.update_view();
        cam
    }

    #[inline]
    pub fn internal(&self) -> &CameraInternalParams {
        &self.internal
    }

    #[inline]
    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    #[inline]
    pub fn center(&self) -> DVec3 {
        self.pose.center
    }

    #[inline]
    pub fn zoom(&self) -> f64 {
        self.internal.zoom
    }

    #[inline]
    pub fn proj_matrix(&self) -> &Matrix4 {
        &self.proj
    }

    #[inline]
    pub fn view_matrix(&self) -> &Matrix4 {
        &self.view
    }

    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        self.internal.width = width;
        self.internal.height = height;
        self.update_proj();
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.internal.zoom = zoom;
        self.update_proj();
    }

    pub fn set_pose_with_camera_axes(&mut self, cam_x: DVec3, cam_y: DVec3, cam_z: DVec3, center: DVec3) {
        self.pose = CameraPose {
            cam_x,
            cam_y,
            cam_z,
            center,
        };
        self.update_view();
    }

    /// Orbits the eye around the world origin at `distance`.
    /// Positive `horizontal_deg` moves the eye toward its right axis,
    /// positive `vertical_deg` toward its up axis. Roll is not corrected here.
    pub fn rotate_around_point(&mut self, distance: f64, horizontal_deg: f64, vertical_deg: f64) {
        let CameraPose {
            mut cam_x,
            mut cam_y,
            mut cam_z,
            ..
        } = self.pose;

        let yaw = Matrix3::rotation(cam_y, horizontal_deg);
        cam_x = yaw.multiply_vector3(cam_x);
        cam_z = yaw.multiply_vector3(cam_z);

        let pitch = Matrix3::rotation(cam_x, -vertical_deg);
        cam_y = pitch.multiply_vector3(cam_y);
        cam_z = pitch.multiply_vector3(cam_z);

        // re-orthonormalize against accumulated drift
        let cam_z = cam_z.normalize();
        let cam_x = cam_y.cross(cam_z).normalize();
        let cam_y = cam_z.cross(cam_x);
        self.set_pose_with_camera_axes(cam_x, cam_y, cam_z, cam_z * distance);
    }

    /// Rotates the right/up axes about the viewing axis: `cam_x` turns toward `cam_y`.
    pub fn rotate_by_roll(&mut self, angle_deg: f64) {
        let roll = Matrix3::rotation(self.pose.cam_z, angle_deg);
        let pose = self.pose;
        self.set_pose_with_camera_axes(
            roll.multiply_vector3(pose.cam_x),
            roll.multiply_vector3(pose.cam_y),
            pose.cam_z,
            pose.center,
        );
    }

    fn update_proj(&mut self) {
        let p = &self.internal;
        let top = p.near * (p.fov_deg.to_radians() * 0.5).tan() / p.zoom;
        let right = top * p.aspect();
        let depth = p.far - p.near;

        let mut e = [0.0; 16];
        e[0] = p.near / right;
        e[5] = p.near / top;
        e[10] = -(p.far + p.near) / depth;
        e[11] = -1.0;
        e[14] = -2.0 * p.far * p.near / depth;
        self.proj = Matrix4::from_cols_array(e);
    }

    /// Inverse of the pose: rows are the axes, translation is the rotated, negated eye.
    fn update_view(&mut self) {
        let CameraPose {
            cam_x: x,
            cam_y: y,
            cam_z: z,
            center: c,
        } = self.pose;
        self.view = Matrix4::from_cols_array([
            x.x, y.x, z.x, 0.0, //
            x.y, y.y, z.y, 0.0, //
            x.z, y.z, z.z, 0.0, //
            -x.dot(c), -y.dot(c), -z.dot(c), 1.0,
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DMat4;

    fn camera() -> Camera {
        Camera::new(1600, 900, 30.0, 0.1, 100.0)
    }

    fn assert_orthonormal(pose: &CameraPose) {
        for v in [pose.cam_x, pose.cam_y, pose.cam_z] {
            assert!((v.length() - 1.0).abs() < 1e-9, "not unit: {v}");
        }
        assert!(pose.cam_x.dot(pose.cam_y).abs() < 1e-9);
        assert!(pose.cam_y.dot(pose.cam_z).abs() < 1e-9);
        assert!(pose.cam_z.dot(pose.cam_x).abs() < 1e-9);
    }

    #[test]
    fn projection_matches_gl_perspective() {
        let cam = camera();
        let expected = DMat4::perspective_rh_gl(30f64.to_radians(), 1600.0 / 900.0, 0.1, 100.0);
        for (a, b) in cam.proj_matrix().to_cols_array().iter().zip(expected.to_cols_array()) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn zoom_scales_the_frustum() {
        let mut cam = camera();
        let base = *cam.proj_matrix();
        cam.set_zoom(2.0);
        assert!((cam.proj_matrix().element(0, 0) - 2.0 * base.element(0, 0)).abs() < 1e-9);
        assert!((cam.proj_matrix().element(1, 1) - 2.0 * base.element(1, 1)).abs() < 1e-9);
        assert_eq!(cam.zoom(), 2.0);
    }

    #[test]
    fn aspect_ratio_updates_projection() {
        let mut cam = camera();
        cam.set_aspect_ratio(800, 800);
        let m = cam.proj_matrix();
        assert!((m.element(0, 0) - m.element(1, 1)).abs() < 1e-12);
    }

    #[test]
    fn view_is_inverse_of_pose() {
        let mut cam = camera();
        let z = DVec3::new(1.0, 2.0, 2.0).normalize();
        let x = DVec3::Z.cross(z).normalize();
        let y = z.cross(x);
        let center = z * 7.0;
        cam.set_pose_with_camera_axes(x, y, z, center);

        let pose_matrix = DMat4::from_cols(
            x.extend(0.0),
            y.extend(0.0),
            z.extend(0.0),
            center.extend(1.0),
        );
        let product = DMat4::from_cols_array(&cam.view_matrix().to_cols_array()) * pose_matrix;
        assert!(product.abs_diff_eq(DMat4::IDENTITY, 1e-9));

        let origin = cam.view_matrix().multiply_vector3(DVec3::ZERO);
        assert!((origin - DVec3::new(0.0, 0.0, -7.0)).length() < 1e-9);
    }

    #[test]
    fn orbit_keeps_distance_and_orthonormal_axes() {
        let mut cam = camera();
        for step in 0..50 {
            cam.rotate_around_point(10.0, 7.0 + step as f64, -3.5);
            assert!((cam.center().length() - 10.0).abs() < 1e-9);
            assert_orthonormal(cam.pose());
        }
    }

    #[test]
    fn orbit_moves_toward_right_and_up() {
        let mut cam = camera();
        cam.rotate_around_point(10.0, 90.0, 0.0);
        assert!((cam.center() - DVec3::new(10.0, 0.0, 0.0)).length() < 1e-9);

        let mut cam = camera();
        cam.rotate_around_point(10.0, 0.0, 90.0);
        assert!((cam.center() - DVec3::new(0.0, 10.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn roll_turns_right_axis_toward_up() {
        let mut cam = camera();
        cam.rotate_by_roll(90.0);
        let pose = cam.pose();
        assert!((pose.cam_x - DVec3::Y).length() < 1e-9);
        assert!((pose.cam_y + DVec3::X).length() < 1e-9);
        assert_eq!(pose.cam_z, DVec3::Z);
        assert_orthonormal(pose);
    }
}
