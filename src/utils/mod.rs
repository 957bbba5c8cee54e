use std::path::{Path, PathBuf};

/// Replace characters that are invalid in Windows/Unix filenames with `_`.
///
/// The replacement is one-for-one, so the output has the same character count.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect()
}

/// `~/Downloads/CBSE_Papers`, falling back to the working directory when no
/// home directory can be determined.
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("CBSE_Papers")
}

/// Sibling path used while a download is in flight.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test/file.pdf"), "test_file.pdf");
        assert_eq!(sanitize_filename("normal-name.pdf"), "normal-name.pdf");
        assert_eq!(sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_sanitize_keeps_everything_else() {
        let name = " sample paper_hindi-b_2014_15.pdf ";
        assert_eq!(sanitize_filename(name), name);

        let out = sanitize_filename("<<>>**??");
        assert_eq!(out, "________");
        assert!(!out.contains(['<', '>', ':', '"', '/', '\\', '|', '?', '*']));
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/a/b/paper.pdf")),
            PathBuf::from("/a/b/paper.pdf.part")
        );
    }
}
