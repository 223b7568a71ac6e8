//! The `routes` command: list synthesized routes without starting anything.

use pagebridge_core::{collect_exports, handler_files, synthesize, RouteDescriptor};

use crate::cli::RoutesArgs;
use crate::error::Result;
use crate::ui;

/// Print the routes that `dev` would install, one per line.
pub fn execute(args: &RoutesArgs) -> Result<()> {
    let files = handler_files(&args.functions_dir);

    let mut descriptors = Vec::new();
    for path in files {
        let exports = collect_exports(&path)?;
        let relative = path.strip_prefix(&args.functions_dir).unwrap_or(&path);
        if let Some(descriptor) = synthesize(relative, &exports) {
            descriptors.push(descriptor);
        }
    }

    if descriptors.is_empty() {
        ui::warning(&format!(
            "No function routes found under {}",
            args.functions_dir.display()
        ));
        return Ok(());
    }

    for descriptor in &descriptors {
        println!("{}", format_route(descriptor));
    }
    Ok(())
}

fn format_route(descriptor: &RouteDescriptor) -> String {
    let methods = if descriptor.match_all {
        "ALL".to_string()
    } else {
        descriptor
            .allowed_methods
            .iter()
            .map(http::Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("{:<24} {}", descriptor.route_path, methods)
}
