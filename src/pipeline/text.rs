//! Pure text transforms applied after rewriting.

const ATTRIBUTE_KEYWORD: &str = "__attribute";

/// Remove `__attribute__((...))` qualifiers.
///
/// Both `__attribute__` and `__attribute` spellings are recognised. The
/// keyword is removed together with its parenthesised argument list; an
/// occurrence without a balanced list is left untouched.
pub fn strip_attributes(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;

    while let Some(start) = rest.find(ATTRIBUTE_KEYWORD) {
        let after = &rest[start + ATTRIBUTE_KEYWORD.len()..];
        let after = after.strip_prefix("__").unwrap_or(after);
        let keyword_end = rest.len() - after.len();

        let args = after.trim_start();
        let args_start = rest.len() - args.len();

        match matching_paren(args) {
            Some(close) => {
                out.push_str(&rest[..start]);
                rest = &rest[args_start + close + 1..];
            }
            None => {
                out.push_str(&rest[..keyword_end]);
                rest = &rest[keyword_end..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Byte index of the `)` closing the `(` that `s` starts with.
fn matching_paren(s: &str) -> Option<usize> {
    if !s.starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    for (idx, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Collapse the first function prototype onto a single line.
///
/// Whitespace up to and including the first `{` is squeezed to single spaces;
/// the body is untouched. Text without a `{` is returned unchanged.
pub fn sanitize_prototype(src: &str) -> String {
    match src.find('{') {
        Some(idx) => {
            let (prototype, body) = src.split_at(idx + 1);
            let mut out = prototype.split_whitespace().collect::<Vec<_>>().join(" ");
            out.push_str(body);
            out
        }
        None => src.to_string(),
    }
}
