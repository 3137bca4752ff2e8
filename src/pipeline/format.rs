use crate::config::FormatStyle;
use crate::errors::PreprocessError;
use crate::toolchain::{Invocation, Tool, Toolchain};

/// Enforces the code style with clang-format.
pub struct Formatter<'a, T: Toolchain + ?Sized> {
    toolchain: &'a T,
    style: &'a FormatStyle,
}

impl<'a, T: Toolchain + ?Sized> Formatter<'a, T> {
    pub fn new(toolchain: &'a T, style: &'a FormatStyle) -> Self {
        Self { toolchain, style }
    }

    /// Format `src`. A non-zero exit means the formatter itself is broken.
    pub fn format(&self, src: &str) -> Result<String, PreprocessError> {
        let invocation = Invocation::new(Tool::ClangFormat)
            .arg(self.style.to_style_arg())
            .stdin(src.as_bytes());

        let output = self.toolchain.run(&invocation)?;
        let stderr = output.stderr_text();
        if !stderr.trim().is_empty() {
            log::error!("clang-format: {}", stderr.trim());
        }
        if !output.success() {
            return Err(PreprocessError::Format { stderr });
        }
        Ok(output.stdout_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorClass;
    use crate::testkit::MockToolchain;
    use crate::toolchain::ToolOutput;

    #[test]
    fn test_format_passes_style_as_single_argument() {
        let toolchain = MockToolchain::new();
        let style = FormatStyle::default();
        let formatted = Formatter::new(&toolchain, &style)
            .format("kernel void A() {}")
            .unwrap();

        assert_eq!(formatted, "kernel void A() {}");
        let call = &toolchain.calls()[0];
        assert_eq!(call.args.len(), 1);
        assert!(call.args[0].starts_with("-style={"));
    }

    #[test]
    fn test_format_failure_is_tool_error() {
        let toolchain = MockToolchain::new()
            .with_format(|_| ToolOutput::exit(1, "Invalid value for ColumnLimit"));
        let style = FormatStyle::default();
        let err = Formatter::new(&toolchain, &style)
            .format("kernel void A() {}")
            .unwrap_err();

        assert_eq!(err.class(), ErrorClass::Tool);
    }
}
