// tollgate-core/src/infrastructure/report/jinja.rs

// Renders the HTML batch report. The template only sees JSON-shaped data.

use minijinja::Environment;

use crate::application::ports::TemplateEngine;
use crate::error::TollgateError;
use crate::infrastructure::error::InfrastructureError;

pub struct JinjaRenderer<'a> {
    env: Environment<'a>,
}

impl<'a> JinjaRenderer<'a> {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| minijinja::AutoEscape::Html);

        // Montants à deux décimales
        env.add_filter("money", |value: f64| format!("{:.2}", value));
        env.add_filter("upper", |value: &str| value.to_uppercase());

        Self { env }
    }
}

impl<'a> Default for JinjaRenderer<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TemplateEngine for JinjaRenderer<'a> {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, TollgateError> {
        self.env
            .render_str(template, context)
            .map_err(|e| TollgateError::Infrastructure(InfrastructureError::TemplateError(e)))
    }
}
