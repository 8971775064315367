use miette::Diagnostic;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Shader used when no `--shader` path is configured.
pub const BUILTIN_SHADER: &str = include_str!("../assets/spin.glsl");

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    #[diagnostic(code(spin_demo::config_io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    #[diagnostic(code(spin_demo::config_parse))]
    Parse(#[from] toml::de::Error),

    #[error("{field} must be > 0")]
    #[diagnostic(code(spin_demo::invalid_size))]
    InvalidSize { field: &'static str },

    #[error("fov must be in range [1, 179], got {0}")]
    #[diagnostic(code(spin_demo::invalid_fov))]
    InvalidFov(f32),
}

pub type Result<T> = core::result::Result<T, ConfigError>;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    pub width: u32,
    pub height: u32,
    pub fov_deg: f32,
    /// Radians per second around the Y axis.
    pub spin_rate: f32,
    pub camera_distance: f32,
    /// Combined shader file; the built-in shader is used when absent.
    pub shader: Option<PathBuf>,
    pub clear_color: [f32; 4],
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fov_deg: 60.0,
            spin_rate: 0.8,
            camera_distance: 4.0,
            shader: None,
            clear_color: [0.06, 0.08, 0.12, 1.0],
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct Overrides {
    /// Combined shader file with `#shader <stage>` markers
    #[arg(long, value_name = "PATH")]
    pub shader: Option<PathBuf>,
    /// Window width
    #[arg(long)]
    pub width: Option<u32>,
    /// Window height
    #[arg(long)]
    pub height: Option<u32>,
    /// Vertical field of view in degrees
    #[arg(long = "fov")]
    pub fov_deg: Option<f32>,
    /// Rotation speed in radians per second
    #[arg(long)]
    pub spin_rate: Option<f32>,
}

impl DemoConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(path) = &overrides.shader {
            self.shader = Some(path.clone());
        }
        if let Some(width) = overrides.width {
            self.width = width;
        }
        if let Some(height) = overrides.height {
            self.height = height;
        }
        if let Some(fov) = overrides.fov_deg {
            self.fov_deg = fov;
        }
        if let Some(rate) = overrides.spin_rate {
            self.spin_rate = rate;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(ConfigError::InvalidSize { field: "width" });
        }
        if self.height == 0 {
            return Err(ConfigError::InvalidSize { field: "height" });
        }
        if !(1.0..=179.0).contains(&self.fov_deg) {
            return Err(ConfigError::InvalidFov(self.fov_deg));
        }
        Ok(())
    }
}

/// Interleaved position + colour, 6 floats per vertex.
pub const VERTEX_STRIDE: usize = 6;

#[derive(Clone, Debug)]
pub struct CubeMesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl CubeMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }
}

/// Unit cube centred at the origin, one flat colour per face.
pub fn cube_mesh() -> CubeMesh {
    // (normal axis, sign, colour)
    let faces: [(usize, f32, [f32; 3]); 6] = [
        (0, 1.0, [0.90, 0.30, 0.30]),
        (0, -1.0, [0.30, 0.90, 0.30]),
        (1, 1.0, [0.30, 0.30, 0.90]),
        (1, -1.0, [0.90, 0.90, 0.30]),
        (2, 1.0, [0.30, 0.90, 0.90]),
        (2, -1.0, [0.90, 0.30, 0.90]),
    ];
    let corners = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];

    let mut vertices = Vec::with_capacity(faces.len() * corners.len() * VERTEX_STRIDE);
    let mut indices = Vec::with_capacity(faces.len() * 6);
    for (face, (axis, sign, color)) in faces.into_iter().enumerate() {
        let u_axis = (axis + 1) % 3;
        let v_axis = (axis + 2) % 3;
        for (u, v) in corners {
            let mut pos = [0.0f32; 3];
            pos[axis] = 0.5 * sign;
            // keep counter-clockwise winding when viewed from outside
            pos[u_axis] = u * sign;
            pos[v_axis] = v;
            vertices.extend_from_slice(&pos);
            vertices.extend_from_slice(&color);
        }
        let base = (face * 4) as u16;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    CubeMesh { vertices, indices }
}

pub fn compute_mvp(
    width: u32,
    height: u32,
    fov_deg: f32,
    camera_distance: f32,
    angle_rad: f32,
) -> [f32; 16] {
    let aspect = (width as f32 / (height.max(1) as f32)).max(0.01);
    let proj = mat4_perspective(fov_deg.to_radians(), aspect, 0.01, camera_distance * 10.0);
    let view = mat4_translation(0.0, 0.0, -camera_distance);
    let model = mat4_mul(&mat4_rotation_y(angle_rad), &mat4_rotation_x(angle_rad * 0.5));
    mat4_mul(&proj, &mat4_mul(&view, &model))
}

pub fn f32_slice_to_ne_bytes(slice: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(slice.len().saturating_mul(std::mem::size_of::<f32>()));
    for &value in slice {
        out.extend_from_slice(&value.to_ne_bytes());
    }
    out
}

pub fn u16_slice_to_ne_bytes(slice: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(slice.len().saturating_mul(std::mem::size_of::<u16>()));
    for &value in slice {
        out.extend_from_slice(&value.to_ne_bytes());
    }
    out
}

pub fn mat4_identity() -> [f32; 16] {
    [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, //
    ]
}

pub fn mat4_translation(x: f32, y: f32, z: f32) -> [f32; 16] {
    let mut m = mat4_identity();
    m[12] = x;
    m[13] = y;
    m[14] = z;
    m
}

pub fn mat4_rotation_x(rad: f32) -> [f32; 16] {
    let c = rad.cos();
    let s = rad.sin();
    [
        1.0, 0.0, 0.0, 0.0, //
        0.0, c, s, 0.0, //
        0.0, -s, c, 0.0, //
        0.0, 0.0, 0.0, 1.0, //
    ]
}

pub fn mat4_rotation_y(rad: f32) -> [f32; 16] {
    let c = rad.cos();
    let s = rad.sin();
    [
        c, 0.0, -s, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        s, 0.0, c, 0.0, //
        0.0, 0.0, 0.0, 1.0, //
    ]
}

pub fn mat4_perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> [f32; 16] {
    let f = 1.0 / (0.5 * fovy).tan();
    let nf = 1.0 / (near - far);
    let mut m = [0.0f32; 16];
    m[0] = f / aspect;
    m[5] = f;
    m[10] = (far + near) * nf;
    m[11] = -1.0;
    m[14] = (2.0 * far * near) * nf;
    m
}

/// Column-major product `a * b`.
pub fn mat4_mul(a: &[f32; 16], b: &[f32; 16]) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    for c in 0..4 {
        for r in 0..4 {
            let mut acc = 0.0f32;
            for k in 0..4 {
                acc += a[k * 4 + r] * b[c * 4 + k];
            }
            out[c * 4 + r] = acc;
        }
    }
    out
}

pub fn mat4_transform_point(m: &[f32; 16], p: [f32; 3]) -> [f32; 4] {
    let mut out = [0.0f32; 4];
    for (r, value) in out.iter_mut().enumerate() {
        *value = m[r] * p[0] + m[4 + r] * p[1] + m[8 + r] * p[2] + m[12 + r];
    }
    out
}
