//! Email body rendering with Tera

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

pub const CONTACT_TEXT: &str = "contact_seller.txt";
pub const CONTACT_HTML: &str = "contact_seller.html";

/// Template renderer
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Create a new template renderer with embedded templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_template(CONTACT_TEXT, include_str!("../templates/contact_seller.txt"))?;
        tera.add_raw_template(CONTACT_HTML, include_str!("../templates/contact_seller.html"))?;

        Ok(Self { tera })
    }

    /// Render a template with context
    pub fn render(&self, template: &str, context: &impl Serialize) -> Result<String> {
        let ctx = Context::from_serialize(context)?;
        Ok(self.tera.render(template, &ctx)?)
    }
}
