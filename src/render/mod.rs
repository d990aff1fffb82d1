//! Renderer module: trait-based format dispatch for dispatch-table fragments.

pub mod cpp;
pub mod json;

use crate::error::{Error, Result};
use crate::model::RouteRecord;

/// Renders a set of route records into one fragment.
pub trait Renderer {
    fn render(&self, routes: &[RouteRecord]) -> Result<String>;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "cpp" | "c++" => Ok(Box::new(cpp::CppRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(Error::UnknownFormat(format.to_string())),
    }
}

/// Name of the per-method registration table (`GET` → `getMappings`).
pub fn table_name(http_method: &str) -> String {
    format!("{}Mappings", http_method.to_lowercase())
}

/// Fail when two routes claim the same method and URL.
pub fn check_duplicates(routes: &[RouteRecord]) -> Result<()> {
    for (i, route) in routes.iter().enumerate() {
        if let Some(earlier) = routes[..i]
            .iter()
            .find(|r| r.http_method == route.http_method && r.url == route.url)
        {
            return Err(Error::DuplicateRoute {
                method: route.http_method.clone(),
                url: route.url.clone(),
                first: format!("{}::{}", earlier.handler_class, earlier.handler_method),
                second: format!("{}::{}", route.handler_class, route.handler_method),
            });
        }
    }
    Ok(())
}
