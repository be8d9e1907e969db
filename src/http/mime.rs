//! Content-type lookup by file extension.
//!
//! The extension is whatever follows the last `.` of the path, matched
//! case-sensitively: `INDEX.HTML` is served as `application/octet-stream`.

/// Fallback for unknown or missing extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Resolve the content type of a resource path.
pub fn mime_type(path: &str) -> &'static str {
    let extension = match path.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => return OCTET_STREAM,
    };

    match extension {
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(mime_type("static/index.html"), "text/html");
        assert_eq!(mime_type("styles.css"), "text/css");
        assert_eq!(mime_type("static/code.js"), "application/javascript");
        assert_eq!(mime_type("logo.png"), "image/png");
        assert_eq!(mime_type("james.jpg"), "image/jpeg");
        assert_eq!(mime_type("james.jpeg"), "image/jpeg");
    }

    #[test]
    fn unknown_or_missing_extension_falls_back() {
        assert_eq!(mime_type("eci.com"), OCTET_STREAM);
        assert_eq!(mime_type("static/README"), OCTET_STREAM);
        assert_eq!(mime_type("archive.tar.gz"), OCTET_STREAM);
        assert_eq!(mime_type("trailing."), OCTET_STREAM);
    }

    #[test]
    fn only_the_last_dot_counts() {
        assert_eq!(mime_type("v1.2/app.min.js"), "application/javascript");
        assert_eq!(mime_type("dir.html/file"), OCTET_STREAM);
    }

    #[test]
    fn match_is_case_sensitive() {
        assert_eq!(mime_type("INDEX.HTML"), OCTET_STREAM);
        assert_eq!(mime_type("photo.JPG"), OCTET_STREAM);
    }
}
