//! Core types: column-major matrices, Camera, WorldCamera, Transform, colors.

pub use glam::{DVec3, DVec4, dvec3};

pub mod camera;
pub mod color;
pub mod error;
pub mod matrix;
pub mod transform;
pub mod world_camera;

pub use camera::{Camera, CameraInternalParams, CameraPose};
pub use color::parse_hex_color;
pub use error::{ColorError, CoreError, CoreResult, TransformError};
pub use matrix::{Matrix3, Matrix4};
pub use transform::Transform;
pub use world_camera::WorldCamera;
