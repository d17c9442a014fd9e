use reqwest::Url;

use crate::domain::models::MediaKind;

pub const GENERIC_BINARY: &str = "application/octet-stream";

/// Hosts that serve images without a file extension in the path.
const IMAGE_HOSTS: &[&str] = &[
    "images.unsplash.com",
    "i.imgur.com",
    "res.cloudinary.com",
    "googleusercontent.com",
];

/// Best-effort MIME type for an attachment URL. The extension wins. Without
/// one, host and path keywords are trusted only when they agree with the
/// declared kind, which otherwise picks its usual type. Documents of unknown
/// type go out as generic binary.
pub fn infer_mime(url: &str, declared: MediaKind) -> &'static str {
    let (host, path) = match Url::parse(url) {
        Ok(parsed) => (
            parsed.host_str().unwrap_or_default().to_ascii_lowercase(),
            parsed.path().to_ascii_lowercase(),
        ),
        Err(_) => (String::new(), url.to_ascii_lowercase()),
    };

    if let Some(mime) = extension(&path).and_then(mime_for_extension) {
        return mime;
    }

    location_guess(&host, &path)
        .filter(|mime| declared == MediaKind::Document || mime.starts_with(declared.as_str()))
        .unwrap_or(match declared {
            MediaKind::Image => "image/jpeg",
            MediaKind::Video => "video/mp4",
            MediaKind::Document => GENERIC_BINARY,
        })
}

fn location_guess(host: &str, path: &str) -> Option<&'static str> {
    if IMAGE_HOSTS
        .iter()
        .any(|known| host == *known || host.ends_with(&format!(".{known}")))
    {
        return Some("image/jpeg");
    }
    if path.contains("video") {
        return Some("video/mp4");
    }
    if path.contains("image") || path.contains("photo") {
        return Some("image/jpeg");
    }
    None
}

/// File extension used for the uploaded part name.
pub fn extension_for(mime: &str) -> &str {
    match mime {
        GENERIC_BINARY => "bin",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "audio/mpeg" => "mp3",
        "video/3gpp" => "3gp",
        "text/plain" => "txt",
        other => other.split('/').nth(1).unwrap_or("bin"),
    }
}

fn extension(path: &str) -> Option<&str> {
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    (!ext.is_empty()).then_some(ext)
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "3gp" => "video/3gpp",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        _ => return None,
    };
    Some(mime)
}
