/// Extension appended to every output file
pub const OUTPUT_EXTENSION: &str = ".mp4";

/// Suffix inserted before the extension of the jump-cut variant
pub const JUMP_CUT_SUFFIX: &str = "_jc";

const ILLEGAL_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

fn is_illegal(c: char) -> bool {
    // 0x00-0x20 covers the control characters and the plain space
    c <= '\u{20}' || ILLEGAL_CHARS.contains(&c)
}

/// Map a display name to the file name of its output.
///
/// Every character that is illegal on common filesystems (the set
/// `\ / : * ? " < > |` plus 0x00-0x20) becomes `_`, then
/// [`OUTPUT_EXTENSION`] is appended. Total and deterministic: the empty
/// name yields `".mp4"`.
pub fn sanitize(display_name: &str) -> String {
    let mut file_name = sanitize_component(display_name);
    file_name.push_str(OUTPUT_EXTENSION);
    file_name
}

/// Same replacement as [`sanitize`] without the extension, for folder names
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| if is_illegal(c) { '_' } else { c })
        .collect()
}

/// Insert [`JUMP_CUT_SUFFIX`] before the last `.` of a file name.
///
/// `"a.b.mp4"` becomes `"a.b_jc.mp4"`; a name without a dot just gets the
/// suffix appended.
pub fn jump_cut_name(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) => format!(
            "{}{}{}",
            &file_name[..idx],
            JUMP_CUT_SUFFIX,
            &file_name[idx..]
        ),
        None => format!("{}{}", file_name, JUMP_CUT_SUFFIX),
    }
}
