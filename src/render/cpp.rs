//! C++ renderer: one lambda registration per route, grouped by method table.

use crate::error::Result;
use crate::model::RouteRecord;
use crate::render::{table_name, Renderer};

const SERIALIZER: &str = "nayan::serializer::SerializationUtility";

pub struct CppRenderer;

impl Renderer for CppRenderer {
    fn render(&self, routes: &[RouteRecord]) -> Result<String> {
        let mut out = String::new();

        let mut headers: Vec<String> = routes
            .iter()
            .filter_map(|r| r.interface_header.as_ref())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        headers.sort();
        headers.dedup();
        for header in &headers {
            out.push_str(&format!("#include \"{}\"\n", header));
        }
        if !headers.is_empty() {
            out.push('\n');
        }

        for (i, route) in routes.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&render_entry(route));
        }
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "cpp"
    }
}

/// A single dispatch entry for `route`.
pub fn render_entry(route: &RouteRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}[\"{}\"] = [](CStdString arg) -> StdString {{\n",
        table_name(&route.http_method),
        route.url
    ));
    out.push_str("    AUTOWIRED\n");
    out.push_str(&format!("    {}Ptr controller;\n", route.handler_interface));
    if route.param_type.is_empty() {
        out.push_str(&format!(
            "    Val returnValue = controller->{}();\n",
            route.handler_method
        ));
    } else {
        out.push_str(&format!(
            "    Val returnValue = controller->{}({}::Deserialize<{}>(arg));\n",
            route.handler_method, SERIALIZER, route.param_type
        ));
    }
    out.push_str(&format!(
        "    return {}::Serialize(returnValue);\n",
        SERIALIZER
    ));
    out.push_str("};\n");
    out
}
