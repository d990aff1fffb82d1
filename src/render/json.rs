//! JSON renderer: the dispatch table as structured data for tooling.

use serde::Serialize;

use crate::error::Result;
use crate::model::RouteRecord;
use crate::render::{table_name, Renderer};

pub struct JsonRenderer;

#[derive(Serialize)]
struct Entry<'a> {
    table: String,
    #[serde(flatten)]
    route: &'a RouteRecord,
}

impl Renderer for JsonRenderer {
    fn render(&self, routes: &[RouteRecord]) -> Result<String> {
        let entries: Vec<Entry<'_>> = routes
            .iter()
            .map(|route| Entry {
                table: table_name(&route.http_method),
                route,
            })
            .collect();
        let mut out = serde_json::to_string_pretty(&entries)?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
