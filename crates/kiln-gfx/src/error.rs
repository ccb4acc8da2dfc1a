use std::fmt;

/// Stage of a shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Failure to build a shader program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The backend has no programmable pipeline at all.
    Unsupported,
    /// A stage failed to compile.
    Compile { stage: ShaderStage, log: String },
    /// The stages compiled but could not be linked.
    Link { log: String },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "Shaders are not supported by this backend"),
            Self::Compile { stage, log } => write!(f, "Failed to compile {:?} shader: {}", stage, log),
            Self::Link { log } => write!(f, "Failed to link shader program: {}", log),
        }
    }
}

impl std::error::Error for ShaderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_error_display() {
        let err = ShaderError::Compile {
            stage: ShaderStage::Fragment,
            log: "0:12: syntax error".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to compile Fragment shader: 0:12: syntax error");
        assert!(format!("{:?}", ShaderError::Unsupported).contains("Unsupported"));
    }
}
