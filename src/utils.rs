use std::io;
use std::path::{Path, PathBuf};

use opencv::{core::Mat, highgui, Result};

/// Extensions accepted when scanning an input directory.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

const ESC_KEY: i32 = 27;

/// Shows `image` and waits `delay_ms` for a key (0 waits forever). Returns the
/// pressed key code, or -1 when none was pressed.
pub fn show_image(title: &str, image: &Mat, delay_ms: i32) -> Result<i32> {
    highgui::imshow(title, image)?;
    highgui::wait_key(delay_ms)
}

pub fn is_escape(key: i32) -> bool {
    key >= 0 && key & 0xFF == ESC_KEY
}

pub fn close_windows() -> Result<()> {
    highgui::destroy_all_windows()
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Image files directly inside `dir`, in the order the filesystem yields them.
pub fn list_image_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    Ok(std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_file(path))
        .collect())
}

/// `<output_dir>/<prefix><file name of source>`.
pub fn output_path(output_dir: &Path, prefix: &str, source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{}{}", prefix, name))
}
