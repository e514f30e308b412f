//! Customer document rendering through embedded Tera templates

use chrono::Utc;
use rust_embed::Embed;
use serde::Serialize;
use tera::Tera;
use thiserror::Error;

use crate::engine::totals::DocumentTotals;
use crate::entities::document::{Document, DocumentKind, DocumentPayload};

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),
}

#[derive(Debug, Serialize)]
struct ScheduleRow {
    name: String,
    amount: String,
}

/// Renders the customer-facing document from its resolved payload
pub struct DocumentRenderer {
    tera: Tera,
}

impl DocumentRenderer {
    /// Create a renderer with the embedded templates loaded
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| RenderError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    /// Render the document as markdown
    ///
    /// The payment schedule rows carry the resolved per-milestone amounts;
    /// the scope section mirrors the document's scope list verbatim.
    pub fn render(
        &self,
        document: &Document,
        payload: &DocumentPayload,
        totals: &DocumentTotals,
    ) -> Result<String, RenderError> {
        if !self
            .tera
            .get_template_names()
            .any(|n| n == "document.md.tera")
        {
            return Err(RenderError::NotFound("document.md.tera".to_string()));
        }

        let schedule: Vec<ScheduleRow> = payload
            .milestones
            .iter()
            .map(|m| ScheduleRow {
                name: m.name.clone(),
                amount: money(m.customer_price),
            })
            .collect();

        let mut context = tera::Context::new();
        context.insert("kind_label", kind_label(document.kind));
        context.insert("title", &document.title);
        context.insert("date", &Utc::now().format("%Y-%m-%d").to_string());
        context.insert("scope", &payload.scope);
        context.insert("schedule", &schedule);
        context.insert("total", &money(totals.customer_total));

        self.tera
            .render("document.md.tera", &context)
            .map_err(|e| RenderError::RenderError(e.to_string()))
    }
}

fn kind_label(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Contract => "Contract",
        DocumentKind::Proposal => "Proposal",
        DocumentKind::ChangeOrder => "Change Order",
    }
}

fn money(value: f64) -> String {
    format!("${:.2}", value)
}
