//! Object naming helpers for image uploads.

use std::path::Path;

use uuid::Uuid;

/// Generates a collision-free object name that keeps the file's extension.
///
/// `"fachada.JPG"` becomes something like `"9b1d…e4.jpg"`. Files without an
/// extension get a bare random name.
pub fn random_object_name(file_name: &str) -> String {
    let stem = Uuid::new_v4().simple().to_string();
    match extension(file_name) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

/// MIME type for an uploaded file, guessed from its extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    match extension(file_name).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
}
