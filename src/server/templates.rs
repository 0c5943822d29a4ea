//! Embedded tera templates for the page family.

use axum::response::Html;
use once_cell::sync::Lazy;
use tera::{Context, Tera};

use crate::error::Result;

static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../../templates/base.html")),
        ("index.html", include_str!("../../templates/index.html")),
        ("form.html", include_str!("../../templates/form.html")),
        ("thankyou.html", include_str!("../../templates/thankyou.html")),
        ("register.html", include_str!("../../templates/register.html")),
        ("login.html", include_str!("../../templates/login.html")),
        ("dashboard.html", include_str!("../../templates/dashboard.html")),
    ])
    .expect("embedded templates parse");
    tera
});

pub fn render(name: &str, context: &Context) -> Result<Html<String>> {
    Ok(Html(TEMPLATES.render(name, context)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_templates_parse() {
        let names: Vec<&str> = TEMPLATES.get_template_names().collect();
        for expected in ["index.html", "form.html", "thankyou.html", "dashboard.html"] {
            assert!(names.contains(&expected), "missing template {expected}");
        }
    }

    #[test]
    fn form_renders_with_empty_context_maps() {
        let mut ctx = Context::new();
        ctx.insert("errors", &std::collections::HashMap::<&str, String>::new());
        ctx.insert("values", &std::collections::HashMap::<&str, String>::new());
        let html = render("form.html", &ctx).unwrap();
        assert!(html.0.contains("demoForm"));
    }
}
