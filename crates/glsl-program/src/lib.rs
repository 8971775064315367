pub mod backend;
pub mod combined;
pub mod error;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

pub use crate::backend::GlBackend;
#[cfg(feature = "glow")]
pub use crate::backend::GlowBackend;
pub use crate::combined::{split_combined_source, split_combined_str, CombinedSource};
pub use crate::error::{Error, LookupError};

pub type Result<T> = core::result::Result<T, Error>;

/// Attribute or uniform location as reported by the driver.
pub type Location = i32;
/// Location reported for names that are not active in a program.
pub const MISSING_LOCATION: Location = -1;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
}

impl ShaderStage {
    pub const COUNT: usize = 3;
    pub const ALL: [Self; Self::COUNT] = [Self::Vertex, Self::Fragment, Self::Geometry];

    pub fn index(self) -> usize {
        match self {
            Self::Vertex => 0,
            Self::Fragment => 1,
            Self::Geometry => 2,
        }
    }

    /// Keyword recognised on a combined-file marker line.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Geometry => "geometry",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LinkStatus {
    #[default]
    Unlinked,
    Linked,
    Failed,
}

/// Compiles GLSL stages, links them and caches attribute/uniform locations.
///
/// Fallible operations come in two flavours: `try_*` returns the error, the
/// plain form logs it and carries on with the object in a degraded state.
pub struct ShaderProgram<'gl, B: GlBackend> {
    gl: &'gl B,
    stages: [Option<B::Shader>; ShaderStage::COUNT],
    program: Option<B::Program>,
    status: LinkStatus,
    attributes: HashMap<String, Location>,
    uniforms: HashMap<String, Location>,
}

impl<'gl, B: GlBackend> ShaderProgram<'gl, B> {
    pub fn new(gl: &'gl B) -> Self {
        Self {
            gl,
            stages: [None; ShaderStage::COUNT],
            program: None,
            status: LinkStatus::Unlinked,
            attributes: HashMap::new(),
            uniforms: HashMap::new(),
        }
    }

    /// Creates a program and compiles every stage found in `path`.
    pub fn from_combined_file(gl: &'gl B, path: impl AsRef<Path>) -> Self {
        let mut program = Self::new(gl);
        program.compile_combined_file(path);
        program
    }

    pub fn try_compile_source(&mut self, stage: ShaderStage, source: &str) -> Result<()> {
        let shader = self
            .gl
            .create_shader(stage)
            .map_err(|reason| Error::CreateShader { stage, reason })?;
        self.gl.shader_source(shader, source);
        self.gl.compile_shader(shader);

        if let Some(previous) = self.stages[stage.index()].replace(shader) {
            log::debug!("releasing previous {stage} shader {previous:?}");
            self.gl.delete_shader(previous);
        }

        if !self.gl.shader_compile_status(shader) {
            return Err(Error::Compile {
                stage,
                log: self.gl.shader_info_log(shader),
            });
        }
        log::debug!("compiled {stage} shader {shader:?}");
        Ok(())
    }

    pub fn compile_source(&mut self, stage: ShaderStage, source: &str) {
        if let Err(err) = self.try_compile_source(stage, source) {
            log::error!("{err}");
        }
    }

    pub fn try_compile_file(&mut self, stage: ShaderStage, path: impl AsRef<Path>) -> Result<()> {
        let source = combined::read_source_file(path.as_ref())?;
        self.try_compile_source(stage, &source)
    }

    pub fn compile_file(&mut self, stage: ShaderStage, path: impl AsRef<Path>) {
        if let Err(err) = self.try_compile_file(stage, path) {
            log::error!("{err}");
        }
    }

    /// Compiles every stage present in an annotated file.
    ///
    /// All present stages are attempted; the first compile error is returned
    /// after the last one. An unannotated file compiles nothing and yields an
    /// empty list.
    pub fn try_compile_combined_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<ShaderStage>> {
        let sources = combined::read_combined_file(path.as_ref())?;
        let mut compiled = Vec::new();
        let mut first_error = None;
        for (stage, source) in sources.iter() {
            match self.try_compile_source(stage, source) {
                Ok(()) => compiled.push(stage),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(compiled),
        }
    }

    pub fn compile_combined_file(&mut self, path: impl AsRef<Path>) {
        let sources = match combined::read_combined_file(path.as_ref()) {
            Ok(sources) => sources,
            Err(err) => {
                log::error!("{err}");
                return;
            }
        };
        for (stage, source) in sources.iter() {
            self.compile_source(stage, source);
        }
    }

    /// Links the compiled stages into a new program object.
    ///
    /// Stage objects are released afterwards whatever the outcome, so a
    /// second call without recompiling links an empty program.
    pub fn try_create_and_link_program(&mut self) -> Result<()> {
        if let Some(previous) = self.program.take() {
            log::debug!("releasing previous program {previous:?}");
            self.gl.delete_program(previous);
        }
        self.status = LinkStatus::Unlinked;

        let program = match self.gl.create_program() {
            Ok(program) => program,
            Err(reason) => {
                self.release_stages(None);
                return Err(Error::CreateProgram { reason });
            }
        };
        self.program = Some(program);

        for shader in self.stages.iter().flatten() {
            self.gl.attach_shader(program, *shader);
        }
        self.gl.link_program(program);
        let linked = self.gl.program_link_status(program);
        self.release_stages(Some(program));

        if !linked {
            self.status = LinkStatus::Failed;
            return Err(Error::Link {
                log: self.gl.program_info_log(program),
            });
        }
        self.status = LinkStatus::Linked;
        log::debug!("linked program {program:?}");
        Ok(())
    }

    pub fn create_and_link_program(&mut self) {
        if let Err(err) = self.try_create_and_link_program() {
            log::error!("{err}");
        }
    }

    fn release_stages(&mut self, program: Option<B::Program>) {
        for slot in &mut self.stages {
            let Some(shader) = slot.take() else {
                continue;
            };
            if let Some(program) = program {
                self.gl.detach_shader(program, shader);
            }
            self.gl.delete_shader(shader);
        }
    }

    pub fn bind(&self) {
        self.gl.use_program(self.program);
    }

    pub fn unbind(&self) {
        self.gl.use_program(None);
    }

    fn query_location(&self, name: &str, query: fn(&B, B::Program, &str) -> Location) -> Location {
        match self.program {
            Some(program) => query(self.gl, program, name),
            None => MISSING_LOCATION,
        }
    }

    /// Caches the location of attribute `name`; unknown names cache the sentinel.
    pub fn register_attribute(&mut self, name: &str) -> Location {
        let location = self.query_location(name, B::attrib_location);
        self.attributes.insert(name.to_string(), location);
        location
    }

    /// Caches the location of uniform `name`; unknown names cache the sentinel.
    pub fn register_uniform(&mut self, name: &str) -> Location {
        let location = self.query_location(name, B::uniform_location);
        self.uniforms.insert(name.to_string(), location);
        location
    }

    pub fn attribute_location(&self, name: &str) -> Location {
        self.attributes.get(name).copied().unwrap_or(MISSING_LOCATION)
    }

    pub fn uniform_location(&self, name: &str) -> Location {
        self.uniforms.get(name).copied().unwrap_or(MISSING_LOCATION)
    }

    fn checked_lookup(
        &self,
        map: &HashMap<String, Location>,
        name: &str,
    ) -> core::result::Result<Location, LookupError> {
        if self.status != LinkStatus::Linked {
            return Err(LookupError::NotLinked);
        }
        match map.get(name).copied() {
            Some(location) if location != MISSING_LOCATION => Ok(location),
            _ => Err(LookupError::NotFound),
        }
    }

    pub fn lookup_attribute(&self, name: &str) -> core::result::Result<Location, LookupError> {
        self.checked_lookup(&self.attributes, name)
    }

    pub fn lookup_uniform(&self, name: &str) -> core::result::Result<Location, LookupError> {
        self.checked_lookup(&self.uniforms, name)
    }

    /// Uploads a column-major 4x4 matrix to the registered uniform `name`.
    ///
    /// The program is bound for the upload and unbound afterwards.
    pub fn set_uniform_matrix4(&self, name: &str, data: &[f32; 16], transpose: bool) {
        self.bind();
        self.gl
            .uniform_matrix4(self.uniform_location(name), transpose, data);
        self.unbind();
    }

    pub fn program_handle(&self) -> Option<B::Program> {
        self.program
    }

    pub fn stage_handle(&self, stage: ShaderStage) -> Option<B::Shader> {
        self.stages[stage.index()]
    }

    pub fn link_status(&self) -> LinkStatus {
        self.status
    }

    pub fn is_linked(&self) -> bool {
        self.status == LinkStatus::Linked
    }

    pub fn delete_program(&mut self) {
        if let Some(program) = self.program.take() {
            self.gl.delete_program(program);
        }
        self.status = LinkStatus::Unlinked;
    }
}
