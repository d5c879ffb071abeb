use std::path::{Path, PathBuf};

const FALLBACK: &str = r#"<!DOCTYPE html><html><head><meta charset="UTF-8"><title>Detektor Gambar: AI vs Manusia</title></head><body><p>Static files not found. Set STATIC_DIR or place index.html in ./static/</p></body></html>"#;

/// Loads `index.html` from the configured static directory, then from
/// `./static`, and falls back to a stub page.
pub fn render(static_dir: Option<&Path>) -> String {
    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Some(d) = static_dir {
        dirs.push(d.to_path_buf());
    }
    dirs.push(PathBuf::from("./static"));

    for dir in dirs {
        if let Ok(contents) = std::fs::read_to_string(dir.join("index.html")) {
            return contents;
        }
    }
    FALLBACK.to_string()
}
