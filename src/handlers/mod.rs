pub mod delete_handler;
pub mod get_handler;
pub mod upload_handler;

pub use delete_handler::handle_delete;
pub use get_handler::handle_get_or_head;
pub use upload_handler::handle_upload;

use crate::prelude::*;

/// Joins `route.root` with the request path past the location prefix and
/// rejects anything that would escape the root — upload and CGI targets
/// must never escape their configured roots either. `..` segments are
/// rejected outright; the nearest existing ancestor of the joined path must
/// canonicalize under `root`.
pub(crate) fn resolve_under_root(route: &RouteConfig, request_path: &str) -> std::result::Result<PathBuf, u16> {
    if request_path.split('/').any(|seg| seg == "..") {
        return Err(HTTP_BAD_REQUEST);
    }

    let relative = request_path.strip_prefix(&route.path).unwrap_or(request_path);
    let mut path = PathBuf::from(&route.root);
    path.push(relative.trim_start_matches('/'));

    let root_canon = Path::new(&route.root).canonicalize().map_err(|_| HTTP_NOT_FOUND)?;

    let mut probe = path.clone();
    let nearest_existing = loop {
        if probe.exists() {
            break probe.canonicalize().map_err(|_| HTTP_NOT_FOUND)?;
        }
        if !probe.pop() {
            return Err(HTTP_NOT_FOUND);
        }
    };

    if !nearest_existing.starts_with(&root_canon) {
        return Err(HTTP_FORBIDDEN);
    }

    Ok(path)
}
