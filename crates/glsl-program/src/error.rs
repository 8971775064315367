use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::ShaderStage;

#[derive(Error, Diagnostic, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("error loading the shader: {}: {source}", path.display())]
    #[diagnostic(code(glsl_program::file_open))]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create {stage} shader object: {reason}")]
    #[diagnostic(code(glsl_program::create_shader))]
    CreateShader { stage: ShaderStage, reason: String },

    #[error("failed to create program object: {reason}")]
    #[diagnostic(code(glsl_program::create_program))]
    CreateProgram { reason: String },

    #[error("{stage} shader compile log: {log}")]
    #[diagnostic(code(glsl_program::compile))]
    Compile { stage: ShaderStage, log: String },

    #[error("link log: {log}")]
    #[diagnostic(code(glsl_program::link))]
    Link { log: String },
}

/// Outcome of a checked location lookup.
#[derive(Error, Diagnostic, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LookupError {
    #[error("program is not linked")]
    #[diagnostic(code(glsl_program::not_linked))]
    NotLinked,

    #[error("name is not registered or not present in the program")]
    #[diagnostic(code(glsl_program::not_found))]
    NotFound,
}
