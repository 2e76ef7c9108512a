//! Tessellation of the globe scene parts.

use std::f64::consts::TAU;

use crate::geometry::{Face, Geometry};

/// UV sphere centered at the origin, polar axis +Z.
///
/// Produces a `(w + 1) × (h + 1)` grid over longitude [-180°, 180°] and
/// latitude [-90°, 90°]. The seam column and the pole rows are duplicated
/// so every copy can carry its own UV. Vertex `(i, j)` (longitude index `i`,
/// latitude index `j`) is stored at `j * (w + 1) + i`.
///
/// Interior bands are quads; the southernmost and northernmost bands are
/// triangles fanning into the poles, so there are `w * (h - 2)` quads and
/// `2 * w` triangles. UV `v` is 0 at the north pole (image rows run top-down).
pub fn build_globe_geometry(radius: f32, w: u32, h: u32, with_normals: bool) -> Geometry {
    let cols = w as usize + 1;
    let rows = h as usize + 1;
    let mut g = Geometry::new();
    g.vertices.reserve(cols * rows);
    g.uvs.reserve(cols * rows);
    if with_normals {
        g.normals.reserve(cols * rows);
    }

    for j in 0..=h {
        let lat = (-90.0 + 180.0 * j as f64 / h as f64).to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        for i in 0..=w {
            let lon = (-180.0 + 360.0 * i as f64 / w as f64).to_radians();
            let (sin_lon, cos_lon) = lon.sin_cos();
            let dir = [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat];

            g.vertices.push(dir.map(|c| (c * radius as f64) as f32));
            g.uvs.push([i as f32 / w as f32, 1.0 - j as f32 / h as f32]);
            if with_normals {
                let len = (dir[0] * dir[0] + dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
                g.normals.push(dir.map(|c| (c / len) as f32));
            }
        }
    }

    let stride = w + 1;
    for j in 0..h {
        for i in 0..w {
            let a = j * stride + i; // south-west
            let b = a + 1; // south-east
            let c = b + stride; // north-east
            let d = a + stride; // north-west
            let face = if j == 0 {
                // a and b are both the south pole
                Face::Triangle([a, c, d])
            } else if j == h - 1 {
                // c and d are both the north pole
                Face::Triangle([a, b, c])
            } else {
                Face::Quad([a, b, c, d])
            };
            g.faces.push(face);
        }
    }

    log::debug!(
        "globe geometry: r={radius} {w}x{h}, {} vertices, {} faces",
        g.vertices.len(),
        g.faces.len()
    );
    g
}

/// Flat annulus in the XY plane facing +Z, for the glow halo.
///
/// Segment `k` owns vertices `2k` (inner) and `2k + 1` (outer); UV `u` is 0 on
/// the inner rim and 1 on the outer rim. Face `k` joins segment `k` to
/// `(k + 1) % segments`, closing the ring.
pub fn build_glowring_geometry(inner_radius: f32, outer_radius: f32, segments: u32) -> Geometry {
    let mut g = Geometry::new();
    for k in 0..segments {
        let angle = TAU * k as f64 / segments as f64;
        let (s, c) = angle.sin_cos();
        let v = k as f32 / segments as f32;
        for (radius, u) in [(inner_radius, 0.0), (outer_radius, 1.0)] {
            let r = radius as f64;
            g.vertices.push([(c * r) as f32, (s * r) as f32, 0.0]);
            g.normals.push([0.0, 0.0, 1.0]);
            g.uvs.push([u, v]);
        }
    }
    for k in 0..segments {
        let next = (k + 1) % segments;
        g.faces
            .push(Face::Quad([2 * k, 2 * k + 1, 2 * next + 1, 2 * next]));
    }
    log::debug!("glow ring geometry: {segments} segments, {} vertices", g.vertices.len());
    g
}

/// Three colored reference axes from the origin: X red, Y green, Z blue.
pub fn build_axes_geometry(length: f32) -> Geometry {
    let axes = [
        ([length, 0.0, 0.0], [1.0, 0.0, 0.0, 1.0]),
        ([0.0, length, 0.0], [0.0, 1.0, 0.0, 1.0]),
        ([0.0, 0.0, length], [0.0, 0.0, 1.0, 1.0]),
    ];
    let mut g = Geometry::new();
    for (tip, color) in axes {
        let base = g.vertices.len() as u32;
        g.vertices.extend_from_slice(&[[0.0, 0.0, 0.0], tip]);
        g.colors.extend_from_slice(&[color, color]);
        g.edges.push([base, base + 1]);
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;

    fn len3(v: [f32; 3]) -> f32 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    #[test]
    fn globe_topology() {
        let (w, h) = (36u32, 18u32);
        let g = build_globe_geometry(1.0, w, h, true);
        assert_eq!(g.vertices.len(), ((w + 1) * (h + 1)) as usize);
        assert_eq!(g.normals.len(), g.vertices.len());
        assert_eq!(g.uvs.len(), g.vertices.len());

        let quads = g.faces.iter().filter(|f| matches!(f, Face::Quad(_))).count();
        let tris = g.faces.iter().filter(|f| matches!(f, Face::Triangle(_))).count();
        assert_eq!(quads, (w * (h - 2)) as usize);
        assert_eq!(tris, (2 * w) as usize);
        assert_eq!(g.faces.len(), (w * h) as usize);
        assert!(g.validate().is_ok());

        for n in &g.normals {
            assert!((len3(*n) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn globe_normals_are_optional() {
        let g = build_globe_geometry(2.0, 8, 4, false);
        assert!(g.normals.is_empty());
        assert!(g.validate().is_ok());
        for v in &g.vertices {
            assert!((len3(*v) - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn globe_seam_and_poles_are_duplicated_with_own_uvs() {
        let (w, h) = (8u32, 4u32);
        let g = build_globe_geometry(1.0, w, h, true);
        let stride = (w + 1) as usize;
        for j in 0..=h as usize {
            let west = j * stride;
            let east = west + w as usize;
            for c in 0..3 {
                assert!((g.vertices[west][c] - g.vertices[east][c]).abs() < 1e-6);
            }
            assert_eq!(g.uvs[west][0], 0.0);
            assert_eq!(g.uvs[east][0], 1.0);
        }
        // bottom row is the south pole with v = 1, top row the north pole with v = 0
        assert!((g.vertices[0][2] + 1.0).abs() < 1e-6);
        assert_eq!(g.uvs[0][1], 1.0);
        let top = h as usize * stride;
        assert!((g.vertices[top + 3][2] - 1.0).abs() < 1e-6);
        assert_eq!(g.uvs[top + 3][1], 0.0);
    }

    #[test]
    fn pole_triangles_skip_the_degenerate_edge() {
        let (w, h) = (4u32, 3u32);
        let g = build_globe_geometry(1.0, w, h, false);
        // first face touches the south pole once, last face the north pole once
        assert_eq!(g.faces[0], Face::Triangle([0, 6, 5]));
        let last = g.faces.last().copied();
        assert_eq!(last, Some(Face::Triangle([13, 14, 19])));
    }

    #[test]
    fn glow_ring_wraps_around() {
        let n = 16u32;
        let g = build_glowring_geometry(1.0, 1.3, n);
        assert_eq!(g.vertices.len(), (2 * n) as usize);
        assert_eq!(g.faces.len(), n as usize);
        assert!(g.validate().is_ok());
        assert_eq!(g.faces[0], Face::Quad([0, 1, 3, 2]));
        assert_eq!(
            g.faces[(n - 1) as usize],
            Face::Quad([2 * (n - 1), 2 * (n - 1) + 1, 1, 0])
        );
        for (k, uv) in g.uvs.iter().enumerate() {
            assert_eq!(uv[0], (k % 2) as f32);
        }
        assert!((len3(g.vertices[1]) - 1.3).abs() < 1e-6);
    }

    #[test]
    fn axes_are_three_colored_edges() {
        let g = build_axes_geometry(2.0);
        assert_eq!(g.vertices.len(), 6);
        assert_eq!(g.edges, vec![[0, 1], [2, 3], [4, 5]]);
        assert_eq!(g.colors[5], [0.0, 0.0, 1.0, 1.0]);
        assert!(g.faces.is_empty());
        assert!(g.validate().is_ok());
    }
}
