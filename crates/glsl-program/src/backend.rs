use core::fmt;

use crate::{Location, ShaderStage, MISSING_LOCATION};

/// GL entry points used by [`crate::ShaderProgram`].
///
/// Every call is issued against an explicit context handle; implementations
/// must only be used on the thread that owns that context.
pub trait GlBackend {
    type Shader: Copy + fmt::Debug + PartialEq;
    type Program: Copy + fmt::Debug + PartialEq;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn use_program(&self, program: Option<Self::Program>);
    fn delete_program(&self, program: Self::Program);

    /// Returns [`MISSING_LOCATION`] when `name` is not an active attribute.
    fn attrib_location(&self, program: Self::Program, name: &str) -> Location;
    /// Returns [`MISSING_LOCATION`] when `name` is not an active uniform.
    fn uniform_location(&self, program: Self::Program, name: &str) -> Location;
    /// Uploads a column-major 4x4 matrix. A negative location is ignored.
    fn uniform_matrix4(&self, location: Location, transpose: bool, data: &[f32; 16]);
}

impl ShaderStage {
    pub fn gl_enum(self) -> u32 {
        // GL_VERTEX_SHADER, GL_FRAGMENT_SHADER, GL_GEOMETRY_SHADER
        match self {
            Self::Vertex => 0x8B31,
            Self::Fragment => 0x8B30,
            Self::Geometry => 0x8DD9,
        }
    }
}

#[cfg_attr(not(feature = "glow"), allow(dead_code))]
fn location_from_index(index: Option<u32>) -> Location {
    index
        .and_then(|value| Location::try_from(value).ok())
        .unwrap_or(MISSING_LOCATION)
}

#[cfg(feature = "glow")]
mod glow_impl {
    use glow::HasContext as _;

    use super::{location_from_index, GlBackend};
    use crate::{Location, ShaderStage};

    /// [`GlBackend`] over a loaded `glow` context.
    pub struct GlowBackend {
        gl: glow::Context,
    }

    impl GlowBackend {
        pub fn new(gl: glow::Context) -> Self {
            Self { gl }
        }

        /// # Safety
        ///
        /// A GL context must be current on this thread and `loader` must
        /// return valid entry points for it.
        pub unsafe fn from_loader_function<F>(loader: F) -> Self
        where
            F: FnMut(&str) -> *const std::os::raw::c_void,
        {
            Self::new(glow::Context::from_loader_function(loader))
        }

        pub fn context(&self) -> &glow::Context {
            &self.gl
        }
    }

    impl GlBackend for GlowBackend {
        type Shader = glow::NativeShader;
        type Program = glow::NativeProgram;

        fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
            unsafe { self.gl.create_shader(stage.gl_enum()) }
        }

        fn shader_source(&self, shader: Self::Shader, source: &str) {
            unsafe { self.gl.shader_source(shader, source) }
        }

        fn compile_shader(&self, shader: Self::Shader) {
            unsafe { self.gl.compile_shader(shader) }
        }

        fn shader_compile_status(&self, shader: Self::Shader) -> bool {
            unsafe { self.gl.get_shader_compile_status(shader) }
        }

        fn shader_info_log(&self, shader: Self::Shader) -> String {
            unsafe { self.gl.get_shader_info_log(shader) }
        }

        fn delete_shader(&self, shader: Self::Shader) {
            unsafe { self.gl.delete_shader(shader) }
        }

        fn create_program(&self) -> Result<Self::Program, String> {
            unsafe { self.gl.create_program() }
        }

        fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
            unsafe { self.gl.attach_shader(program, shader) }
        }

        fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
            unsafe { self.gl.detach_shader(program, shader) }
        }

        fn link_program(&self, program: Self::Program) {
            unsafe { self.gl.link_program(program) }
        }

        fn program_link_status(&self, program: Self::Program) -> bool {
            unsafe { self.gl.get_program_link_status(program) }
        }

        fn program_info_log(&self, program: Self::Program) -> String {
            unsafe { self.gl.get_program_info_log(program) }
        }

        fn use_program(&self, program: Option<Self::Program>) {
            unsafe { self.gl.use_program(program) }
        }

        fn delete_program(&self, program: Self::Program) {
            unsafe { self.gl.delete_program(program) }
        }

        fn attrib_location(&self, program: Self::Program, name: &str) -> Location {
            location_from_index(unsafe { self.gl.get_attrib_location(program, name) })
        }

        fn uniform_location(&self, program: Self::Program, name: &str) -> Location {
            location_from_index(
                unsafe { self.gl.get_uniform_location(program, name) }.map(|loc| loc.0),
            )
        }

        fn uniform_matrix4(&self, location: Location, transpose: bool, data: &[f32; 16]) {
            let Ok(index) = u32::try_from(location) else {
                return;
            };
            let location = glow::NativeUniformLocation(index);
            unsafe {
                self.gl
                    .uniform_matrix_4_f32_slice(Some(&location), transpose, data)
            }
        }
    }
}

#[cfg(feature = "glow")]
pub use glow_impl::GlowBackend;
