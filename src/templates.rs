//! Template loading and rendering using Tera.
//!
//! Tool output that lists several records is rendered from templates. The
//! defaults are embedded in the binary; a templates directory can override any
//! of them by providing a file with the same relative name.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use tera::{Context, Tera};

/// Embedded default templates.
static EMBEDDED_TEMPLATES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // Tasks and notes
    m.insert("tasks/list.tera", include_str!("../templates/tasks/list.tera"));
    m.insert("tasks/search.tera", include_str!("../templates/tasks/search.tera"));
    m.insert("notes/list.tera", include_str!("../templates/notes/list.tera"));

    // Files
    m.insert("files/listing.tera", include_str!("../templates/files/listing.tera"));
    m.insert("files/info.tera", include_str!("../templates/files/info.tera"));

    // Connections
    m.insert("connections/list.tera", include_str!("../templates/connections/list.tera"));
    m.insert("connections/stats.tera", include_str!("../templates/connections/stats.tera"));
    m.insert("connections/details.tera", include_str!("../templates/connections/details.tera"));

    m
});

/// Global template engine with caching.
static TERA: Lazy<RwLock<Option<Tera>>> = Lazy::new(|| RwLock::new(None));

/// Initialize the template engine.
///
/// Templates found under `templates_dir` take precedence; anything missing is
/// filled in from the embedded defaults. With `None`, or a directory that does
/// not exist, only the embedded defaults are used.
///
/// # Errors
///
/// Returns an error if the templates directory exists but contains invalid
/// templates.
pub fn init_templates(templates_dir: Option<&Path>) -> Result<()> {
    let mut tera = Tera::default();

    if let Some(dir) = templates_dir.filter(|d| d.exists()) {
        let glob_pattern = format!("{}/**/*.tera", dir.display());
        tera = Tera::new(&glob_pattern).map_err(|e| {
            Error::Template(format!("Failed to load templates from {}: {e}", dir.display()))
        })?;
        tracing::debug!(dir = %dir.display(), "loaded template overrides");
    }

    for (name, content) in EMBEDDED_TEMPLATES.iter() {
        if tera.get_template(name).is_err() {
            tera.add_raw_template(name, content)
                .map_err(|e| Error::Template(format!("Invalid embedded template {name}: {e}")))?;
        }
    }

    *TERA.write().map_err(|e| Error::Template(e.to_string()))? = Some(tera);

    Ok(())
}

/// Render a template with the given context.
///
/// Initializes the engine with the embedded defaults on first use.
///
/// # Errors
///
/// Returns an error if the template doesn't exist or rendering fails.
pub fn render(name: &str, context: &Context) -> Result<String> {
    let needs_init = TERA.read().map_err(|e| Error::Template(e.to_string()))?.is_none();

    if needs_init {
        init_templates(None)?;
    }

    let guard = TERA.read().map_err(|e| Error::Template(e.to_string()))?;
    let tera = guard.as_ref().ok_or_else(|| Error::Template("Templates not initialized".into()))?;
    let rendered = tera
        .render(name, context)
        .map_err(|e| Error::Template(format!("Failed to render template {name}: {e}")))?;
    drop(guard);

    Ok(rendered)
}

/// Reset the template cache, forcing re-initialization on next use.
///
/// # Errors
///
/// Returns an error if the write lock cannot be acquired.
pub fn reset_cache() -> Result<()> {
    *TERA.write().map_err(|e| Error::Template(e.to_string()))? = None;
    Ok(())
}
