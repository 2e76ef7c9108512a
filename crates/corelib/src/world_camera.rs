//! Globe-facing camera: geographic poses and north-up orbiting.
//!
//! The globe is centered at the origin with the polar axis along +Z.
//! Longitude is measured from +X toward +Y, latitude from the equator toward +Z.

use crate::camera::Camera;
use crate::DVec3;

/// Distance from the globe center kept by [`WorldCamera::rotate_around_globe`],
/// in globe radii.
pub const ORBIT_RADIUS: f64 = 10.0;

/// Squared length of north's projection onto the view plane below which the
/// roll correction is skipped (camera looking along the polar axis).
pub const NORTH_ALIGN_THRESHOLD_SQ: f64 = 0.01;

pub const DEFAULT_FOV_DEG: f64 = 30.0;
pub const DEFAULT_NEAR: f64 = 0.1;
pub const DEFAULT_FAR: f64 = 100.0;

#[derive(Clone, Debug)]
pub struct WorldCamera {
    camera: Camera,
}

impl WorldCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_fov(width, height, DEFAULT_FOV_DEG)
    }

    pub fn with_fov(width: u32, height: u32, fov_deg: f64) -> Self {
        let mut wc = Self {
            camera: Camera::new(width, height, fov_deg, DEFAULT_NEAR, DEFAULT_FAR),
        };
        wc.set_pose_by_lon_lat(0.0, 0.0, ORBIT_RADIUS);
        wc
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        self.camera.set_aspect_ratio(width, height);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.camera.set_zoom(zoom);
    }

    /// Places the eye above (`lon_deg`, `lat_deg`) at `dist` from the globe center,
    /// looking at the center with north up.
    ///
    /// The right axis is the tangent of the latitude circle, `(-sin lon, cos lon, 0)`,
    /// which stays defined at the poles where an `up × forward` construction degenerates.
    pub fn set_pose_by_lon_lat(&mut self, lon_deg: f64, lat_deg: f64, dist: f64) {
        let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();
        let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();

        let center = DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat) * dist;
        let cam_x = DVec3::new(-sin_lon, cos_lon, 0.0);
        let cam_z = center.normalize();
        let cam_y = cam_z.cross(cam_x);

        log::debug!("camera pose lon={lon_deg:.3} lat={lat_deg:.3} dist={dist:.3}");
        self.camera.set_pose_with_camera_axes(cam_x, cam_y, cam_z, center);
    }

    /// Orbits at [`ORBIT_RADIUS`] and then restores north-up roll.
    pub fn rotate_around_globe(&mut self, horizontal_deg: f64, vertical_deg: f64) {
        self.camera
            .rotate_around_point(ORBIT_RADIUS, horizontal_deg, vertical_deg);
        self.rotate_by_roll_to_head_up_north();
    }

    /// Rolls the camera so world north (+Z) points along camera-space +Y.
    ///
    /// View elements 8 and 9 are north expressed in camera X and Y. When their
    /// squared length is at most [`NORTH_ALIGN_THRESHOLD_SQ`] the camera looks
    /// along the polar axis, roll is undefined and nothing happens.
    pub fn rotate_by_roll_to_head_up_north(&mut self) {
        let e = self.camera.view_matrix().to_cols_array();
        let (north_x, north_y) = (e[8], e[9]);
        if north_x * north_x + north_y * north_y <= NORTH_ALIGN_THRESHOLD_SQ {
            return;
        }
        let angle = north_y.atan2(north_x).to_degrees();
        self.camera.rotate_by_roll(angle - 90.0);
    }

    /// Geographic position of the eye: (longitude°, latitude°, distance).
    pub fn lon_lat_dist(&self) -> (f64, f64, f64) {
        let c = self.camera.center();
        let dist = c.length();
        if dist == 0.0 {
            return (0.0, 0.0, 0.0);
        }
        let lat = (c.z / dist).clamp(-1.0, 1.0).asin().to_degrees();
        let lon = c.y.atan2(c.x).to_degrees();
        (lon, lat, dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraPose;

    fn assert_orthonormal(pose: &CameraPose) {
        for v in [pose.cam_x, pose.cam_y, pose.cam_z] {
            assert!(v.is_finite(), "non-finite axis {v}");
            assert!((v.length() - 1.0).abs() < 1e-9, "not unit: {v}");
        }
        assert!(pose.cam_x.dot(pose.cam_y).abs() < 1e-9);
        assert!(pose.cam_y.dot(pose.cam_z).abs() < 1e-9);
        assert!(pose.cam_z.dot(pose.cam_x).abs() < 1e-9);
    }

    /// North's projection on the view plane: either negligible or straight up.
    fn assert_north_up(wc: &WorldCamera) {
        let e = wc.camera().view_matrix().to_cols_array();
        let (nx, ny) = (e[8], e[9]);
        if nx * nx + ny * ny > NORTH_ALIGN_THRESHOLD_SQ {
            assert!(nx.abs() < 1e-9, "residual roll: north_x = {nx}");
            assert!(ny > 0.0, "north points down: north_y = {ny}");
        }
    }

    #[test]
    fn lon_lat_poses_are_orthonormal() {
        let mut wc = WorldCamera::new(800, 600);
        let mut lon = -180.0;
        while lon <= 180.0 {
            let mut lat = -89.5;
            while lat < 90.0 {
                wc.set_pose_by_lon_lat(lon, lat, 10.0);
                assert_orthonormal(wc.camera().pose());
                assert_north_up(&wc);
                lat += 7.9;
            }
            lon += 15.0;
        }
    }

    #[test]
    fn poles_do_not_degenerate() {
        let mut wc = WorldCamera::new(800, 600);
        for lon in [0.0, 180.0] {
            wc.set_pose_by_lon_lat(lon, 90.0, 10.0);
            assert_orthonormal(wc.camera().pose());
            assert!((wc.camera().center() - DVec3::new(0.0, 0.0, 10.0)).length() < 1e-9);
            let view = wc.camera().view_matrix().to_cols_array();
            assert!(view.iter().all(|v| v.is_finite()));
        }
        wc.set_pose_by_lon_lat(45.0, -90.0, 10.0);
        assert_orthonormal(wc.camera().pose());
    }

    #[test]
    fn pose_looks_at_globe_center() {
        let mut wc = WorldCamera::new(800, 600);
        wc.set_pose_by_lon_lat(40.0, 25.0, 6.0);
        let origin = wc.camera().view_matrix().multiply_vector3(DVec3::ZERO);
        assert!((origin - DVec3::new(0.0, 0.0, -6.0)).length() < 1e-9);
        let (lon, lat, dist) = wc.lon_lat_dist();
        assert!((lon - 40.0).abs() < 1e-9);
        assert!((lat - 25.0).abs() < 1e-9);
        assert!((dist - 6.0).abs() < 1e-9);
    }

    #[test]
    fn horizontal_orbit_follows_the_equator() {
        let mut wc = WorldCamera::new(800, 600);
        wc.rotate_around_globe(30.0, 0.0);
        let (lon, lat, dist) = wc.lon_lat_dist();
        assert!((lon - 30.0).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
        assert!((dist - ORBIT_RADIUS).abs() < 1e-9);
    }

    #[test]
    fn vertical_orbit_moves_north() {
        let mut wc = WorldCamera::new(800, 600);
        wc.rotate_around_globe(0.0, 20.0);
        let (_, lat, _) = wc.lon_lat_dist();
        assert!((lat - 20.0).abs() < 1e-9);
        assert_north_up(&wc);
    }

    #[test]
    fn roll_correction_holds_over_many_orbits() {
        let mut wc = WorldCamera::new(800, 600);
        wc.set_pose_by_lon_lat(10.0, 5.0, ORBIT_RADIUS);
        let steps = [
            (12.0, 7.0),
            (-25.0, 13.0),
            (3.0, 31.0),
            (40.0, -8.0),
            (-5.0, 22.0),
            (17.0, 17.0),
            (-60.0, -45.0),
            (9.0, 3.0),
        ];
        for _ in 0..10 {
            for &(h, v) in &steps {
                wc.rotate_around_globe(h, v);
                assert_orthonormal(wc.camera().pose());
                assert_north_up(&wc);
            }
        }
    }

    #[test]
    fn explicit_roll_is_undone() {
        let mut wc = WorldCamera::new(800, 600);
        wc.set_pose_by_lon_lat(-70.0, 33.0, 8.0);
        let before = *wc.camera().pose();
        let mut cam = wc.camera().clone();
        cam.rotate_by_roll(37.0);
        wc.camera = cam;
        wc.rotate_by_roll_to_head_up_north();
        let after = wc.camera().pose();
        assert!((after.cam_x - before.cam_x).length() < 1e-9);
        assert!((after.cam_y - before.cam_y).length() < 1e-9);
    }

    #[test]
    fn roll_correction_skips_polar_view() {
        let mut wc = WorldCamera::new(800, 600);
        wc.set_pose_by_lon_lat(0.0, 90.0, 10.0);
        let mut cam = wc.camera().clone();
        cam.rotate_by_roll(50.0);
        let rolled = *cam.pose();
        wc.camera = cam;
        wc.rotate_by_roll_to_head_up_north();
        assert_eq!(*wc.camera().pose(), rolled);
    }
}
