//! Tera template engine wrapper.
//!
//! Views build a `tera::Context` from a serializable struct; `render_html`
//! turns it into a `text/html` response.

use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;
use tera::{Context, Tera};
use tracing::info;

use crate::error::Result;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Load every template matching `glob` (e.g. `templates/**/*.html`).
    pub fn load(glob: &str) -> Result<Self> {
        let mut tera = Tera::new(glob)?;
        tera.autoescape_on(vec![".html"]);
        info!(
            templates = tera.get_template_names().count(),
            %glob,
            "Templates loaded"
        );
        Ok(Self { tera })
    }

    pub fn from_tera(tera: Tera) -> Self {
        Self { tera }
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }

    pub fn render<C: Serialize>(&self, name: &str, context: &C) -> Result<String> {
        let context = Context::from_serialize(context)?;
        Ok(self.tera.render(name, &context)?)
    }

    pub fn render_html<C: Serialize>(&self, name: &str, context: &C) -> Result<HttpResponse> {
        self.render_with_status(name, context, StatusCode::OK)
    }

    pub fn render_with_status<C: Serialize>(
        &self,
        name: &str,
        context: &C,
        status: StatusCode,
    ) -> Result<HttpResponse> {
        let body = self.render(name, context)?;
        Ok(HttpResponse::build(status)
            .content_type(HTML_CONTENT_TYPE)
            .body(body))
    }
}
