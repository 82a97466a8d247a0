//! HTML views rendered with Tera.
//!
//! Templates are embedded at compile time so the binary runs from any
//! working directory.

use tera::{Context, Tera};
use thiserror::Error;
use tracing::debug;

const TEMPLATES: [(&str, &str); 5] = [
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("analysis.html", include_str!("../templates/analysis.html")),
    ("generate.html", include_str!("../templates/generate.html")),
    ("error.html", include_str!("../templates/error.html")),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering failed: {0}")]
    Render(String),

    #[error("Template compilation failed: {0}")]
    Compile(String),
}

impl From<tera::Error> for TemplateError {
    fn from(e: tera::Error) -> Self {
        match e.kind {
            tera::ErrorKind::TemplateNotFound(name) => Self::NotFound(name),
            _ => Self::Render(e.to_string()),
        }
    }
}

#[derive(Debug)]
pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)
            .map_err(|e| TemplateError::Compile(e.to_string()))?;
        debug!(count = TEMPLATES.len(), "Loaded embedded templates");
        Ok(Self { tera })
    }

    pub fn index(&self) -> Result<String, TemplateError> {
        self.render("index.html", &Context::new())
    }

    pub fn analysis(&self, summary: &str) -> Result<String, TemplateError> {
        let mut ctx = Context::new();
        ctx.insert("result", summary);
        self.render("analysis.html", &ctx)
    }

    pub fn post(&self, post: &str) -> Result<String, TemplateError> {
        let mut ctx = Context::new();
        ctx.insert("post", post);
        self.render("generate.html", &ctx)
    }

    pub fn error(&self, message: &str) -> Result<String, TemplateError> {
        let mut ctx = Context::new();
        ctx.insert("message", message);
        self.render("error.html", &ctx)
    }

    fn render(&self, name: &str, ctx: &Context) -> Result<String, TemplateError> {
        Ok(self.tera.render(name, ctx)?)
    }
}
