//! Page rendering with handlebars.
//!
//! One template per stage, all sharing the `header`/`footer` partials. The
//! templates are compiled into the binary.

use crate::session::Session;
use crate::view::{self, SheetView};
use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;
use serde_json::json;

/// Stylesheet served at `/static/portal.css`
pub const PORTAL_CSS: &str = include_str!("./static/portal.css");

#[derive(Serialize)]
struct Tab<'a> {
    index: usize,
    name: &'a str,
    active: bool,
}

/// Registered page templates
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    /// Compile all templates
    ///
    /// # Errors
    /// * `TemplateError` if a bundled template does not parse
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_partial("header", include_str!("./static/header.hbs"))?;
        registry.register_partial("footer", include_str!("./static/footer.hbs"))?;
        registry.register_template_string("login", include_str!("./static/login.hbs"))?;
        registry.register_template_string("files", include_str!("./static/files.hbs"))?;
        registry.register_template_string("filters", include_str!("./static/filters.hbs"))?;
        registry.register_template_string("data", include_str!("./static/data.hbs"))?;
        Ok(Pages { registry })
    }

    /// Login page, optionally refilled with what the user typed
    pub fn login(&self, domain: &str, email: &str, error: Option<String>) -> Result<String, RenderError> {
        self.registry.render(
            "login",
            &json!({
                "domain": domain,
                "email": email,
                "error": error,
            }),
        )
    }

    /// File selection page; an empty catalog shows `warning` instead of the picker
    pub fn files(
        &self,
        session: &Session,
        files: &[String],
        warning: Option<String>,
        error: Option<String>,
    ) -> Result<String, RenderError> {
        self.registry.render(
            "files",
            &json!({
                "user": session.user,
                "files": files,
                "warning": warning,
                "error": error,
            }),
        )
    }

    /// Filter setup page
    pub fn filters(&self, session: &Session, error: Option<String>) -> Result<String, RenderError> {
        self.registry.render(
            "filters",
            &json!({
                "user": session.user,
                "file": session.selected_file,
                "configure": !session.filter_columns.is_empty(),
                "sheets": view::setup_sheets(session),
                "error": error,
            }),
        )
    }

    /// Data view: one tab per sheet of the workbook, with the table of `sheet`
    pub fn data(
        &self,
        session: &Session,
        sheet: Option<&SheetView>,
        error: Option<String>,
    ) -> Result<String, RenderError> {
        let active = sheet.map(|v| v.index);
        let tabs: Vec<Tab> = session
            .workbook
            .as_deref()
            .map(|wb| wb.sheet_names())
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, name)| Tab {
                index,
                name,
                active: Some(index) == active,
            })
            .collect();

        self.registry.render(
            "data",
            &json!({
                "user": session.user,
                "file": session.selected_file,
                "tabs": tabs,
                "sheet": sheet,
                "error": error,
            }),
        )
    }
}
