//! Classification of request paths that name bundled static assets.

/// Path prefixes served as static assets.
const STATIC_PREFIXES: &[&str] = &[
    "/css/",
    "/js/",
    "/images/",
    "/public/",
    "/pdfjs/",
    "/api/v1/info/status",
];

/// File extensions served as static assets wherever they live.
const STATIC_SUFFIXES: &[&str] = &[".svg"];

/// True if `path` names a static asset.
///
/// Matching is anchored: prefixes must start the path and suffixes must end
/// it, so `/image/svg.png` is not static.
pub fn is_static_resource(path: &str) -> bool {
    STATIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
        || STATIC_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}
