//! Template and assets compiled into the binary
//!
//! Used whenever the configuration names no resources directory, so an
//! installed binary needs nothing from the source tree. The paths are relative
//! to this file and must stay in sync with `resources/`.

/// Contents of `template_preview.mustache`
pub const TEMPLATE: &str = include_str!("../../resources/template_preview.mustache");

/// Files under `assets/`, as (relative path, contents)
pub const ASSETS: &[(&str, &str)] = &[(
    "preamble.tex",
    include_str!("../../resources/assets/preamble.tex"),
)];
