use serde::{Deserialize, Serialize};

fn default_based_on_style() -> String {
    "Google".to_string()
}

fn default_column_limit() -> u32 {
    500
}

fn default_indent_width() -> u32 {
    2
}

fn default_pointer_alignment() -> String {
    "Left".to_string()
}

/// clang-format style options.
///
/// Field names serialize to clang-format's own option names, and the whole
/// struct is passed as a single `-style={...}` JSON argument.
/// See <http://clang.llvm.org/docs/ClangFormatStyleOptions.html>.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct FormatStyle {
    #[serde(default = "default_based_on_style")]
    pub based_on_style: String,
    #[serde(default = "default_column_limit")]
    pub column_limit: u32,
    #[serde(default = "default_indent_width")]
    pub indent_width: u32,
    #[serde(default)]
    pub allow_short_blocks_on_a_single_line: bool,
    #[serde(default)]
    pub allow_short_case_labels_on_a_single_line: bool,
    #[serde(default)]
    pub allow_short_functions_on_a_single_line: bool,
    #[serde(default)]
    pub allow_short_loops_on_a_single_line: bool,
    #[serde(default)]
    pub allow_short_if_statements_on_a_single_line: bool,
    #[serde(default)]
    pub derive_pointer_alignment: bool,
    #[serde(default = "default_pointer_alignment")]
    pub pointer_alignment: String,
}

impl Default for FormatStyle {
    fn default() -> Self {
        Self {
            based_on_style: default_based_on_style(),
            column_limit: default_column_limit(),
            indent_width: default_indent_width(),
            allow_short_blocks_on_a_single_line: false,
            allow_short_case_labels_on_a_single_line: false,
            allow_short_functions_on_a_single_line: false,
            allow_short_loops_on_a_single_line: false,
            allow_short_if_statements_on_a_single_line: false,
            derive_pointer_alignment: false,
            pointer_alignment: default_pointer_alignment(),
        }
    }
}

impl FormatStyle {
    /// The `-style=` argument for clang-format.
    pub fn to_style_arg(&self) -> String {
        // Serializing a struct of strings, integers and booleans cannot fail.
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!("-style={json}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_arg_uses_clang_format_option_names() {
        let arg = FormatStyle::default().to_style_arg();
        assert!(arg.starts_with("-style={\"BasedOnStyle\":\"Google\""));
        assert!(arg.contains("\"ColumnLimit\":500"));
        assert!(arg.contains("\"AllowShortIfStatementsOnASingleLine\":false"));
        assert!(arg.ends_with("\"PointerAlignment\":\"Left\"}"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let style: FormatStyle = toml::from_str("ColumnLimit = 80").unwrap();
        assert_eq!(style.column_limit, 80);
        assert_eq!(style.based_on_style, "Google");
        assert_eq!(style.indent_width, 2);
    }
}
