use std::fmt::Write;

use crate::form::{Banner, FormField, FormView, SubmissionPhase};

const LABEL_WIDTH: usize = 11;

/// Plain-text rendering of the form, one control per block.
pub fn render(view: &FormView) -> String {
    let mut out = String::new();
    let indent = " ".repeat(LABEL_WIDTH);

    let _ = writeln!(
        out,
        "{:<width$}[{}]",
        "Full name:",
        view.full_name,
        width = LABEL_WIDTH
    );
    render_error(&mut out, view, FormField::FullName, &indent);

    let sizes: Vec<String> = view
        .size_options
        .iter()
        .map(|o| format!("({}) {}", if o.selected { "x" } else { " " }, o.label))
        .collect();
    let _ = writeln!(
        out,
        "{:<width$}{}",
        "Size:",
        sizes.join("  "),
        width = LABEL_WIDTH
    );
    render_error(&mut out, view, FormField::Size, &indent);

    for (i, topping) in view.toppings.iter().enumerate() {
        let label = if i == 0 { "Toppings:" } else { "" };
        let _ = writeln!(
            out,
            "{:<width$}[{}] {} {}",
            label,
            if topping.checked { "x" } else { " " },
            topping.id,
            topping.label,
            width = LABEL_WIDTH
        );
    }
    render_error(&mut out, view, FormField::Toppings, &indent);

    let submit = match (view.phase, view.submit_enabled) {
        (SubmissionPhase::Submitting, _) => "< Submitting... >",
        (_, true) => "< Submit >",
        (_, false) => "< Submit > (disabled)",
    };
    let _ = writeln!(out, "{indent}{submit}");

    if let Some(banner) = &view.banner {
        let _ = writeln!(out, "{}", render_banner(banner));
    }
    out
}

pub fn render_banner(banner: &Banner) -> String {
    match banner {
        Banner::Success(msg) => format!("*** {msg} ***"),
        Banner::Failure(msg) => format!("!!! {msg} !!!"),
    }
}

fn render_error(out: &mut String, view: &FormView, field: FormField, indent: &str) {
    if let Some(message) = view.error(field) {
        let _ = writeln!(out, "{indent}! {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{OrderForm, Receipt, Schema, ToppingCatalog};

    fn form() -> OrderForm {
        OrderForm::new(ToppingCatalog::default(), Schema::default())
    }

    #[test]
    fn test_render_pristine_form() {
        let text = render(&form().view());
        assert!(text.contains("Full name: []"));
        assert!(text.contains("(x) Select a size"));
        assert!(text.contains("[ ] 1 Pepperoni"));
        assert!(text.contains("< Submit > (disabled)"));
        assert!(!text.contains('!'));
    }

    #[test]
    fn test_render_errors_and_selection() {
        let mut form = form();
        form.set_full_name("Al");
        form.set_size("M");
        form.toggle_topping("3").unwrap();
        let text = render(&form.view());
        assert!(text.contains("Full name: [Al]"));
        assert!(text.contains("! Full name must be at least 3 characters"));
        assert!(text.contains("(x) Medium"));
        assert!(text.contains("[x] 3 Pineapple"));
    }

    #[test]
    fn test_render_banner() {
        let mut form = form();
        form.set_full_name("Alice");
        form.set_size("L");
        let pending = form.begin_submit().unwrap();
        assert!(render(&form.view()).contains("< Submitting... >"));

        form.complete_submission(pending.ticket, Ok(Receipt::for_order(&pending.order)));
        let text = render(&form.view());
        assert!(text.contains("*** Thank you for your order, Alice! Your large pizza with no toppings"));
    }

    #[test]
    fn test_render_failure_banner() {
        let banner = Banner::Failure("Something went wrong".to_string());
        assert_eq!(render_banner(&banner), "!!! Something went wrong !!!");
    }
}
