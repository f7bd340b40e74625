//! Persona landing pages rendered with minijinja.

use minijinja::{context, path_loader, Environment};

#[derive(Debug)]
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    /// Load templates lazily from `dir`; `{id}/index.html` per persona.
    pub fn from_dir(dir: &str) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(dir));
        Self { env }
    }

    pub fn render_persona(&self, artifact_id: &str) -> Result<String, minijinja::Error> {
        let template = self.env.get_template(&format!("{artifact_id}/index.html"))?;
        template.render(context! { artifact_id => artifact_id })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
