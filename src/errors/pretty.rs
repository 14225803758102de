use crate::errors::FrontendError;
use crate::typechecker::Diagnostic;

pub fn format_frontend_error(source_label: &str, source: &str, err: &FrontendError) -> String {
    with_excerpt(
        err.to_string(),
        source_label,
        source,
        err.line(),
        err.column(),
    )
}

pub fn format_diagnostic(source_label: &str, source: &str, diagnostic: &Diagnostic) -> String {
    with_excerpt(
        diagnostic.to_string(),
        source_label,
        source,
        diagnostic.line,
        diagnostic.column,
    )
}

pub fn format_diagnostics(
    source_label: &str,
    source: &str,
    diagnostics: &[Diagnostic],
) -> Vec<String> {
    diagnostics
        .iter()
        .map(|diagnostic| format_diagnostic(source_label, source, diagnostic))
        .collect()
}

fn with_excerpt(
    headline: String,
    source_label: &str,
    source: &str,
    line: usize,
    column: usize,
) -> String {
    let mut out = format!("{}\n--> {}:{}:{}", headline, source_label, line, column);
    if let Some(text) = source.lines().nth(line.saturating_sub(1)) {
        out.push('\n');
        out.push_str(&underline(text, column));
    }
    out
}

pub fn underline(line: &str, column: usize) -> String {
    let mut marker = String::new();
    for _ in 1..column {
        marker.push(' ');
    }
    marker.push('^');
    format!("{}\n{}", line, marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_points_at_its_column() {
        let diagnostic = Diagnostic::new(2, 5, "something is off");
        let rendered = format_diagnostic("shader.frag", "{\n  x = 1;\n}", &diagnostic);
        assert_eq!(
            rendered,
            "Semantic Error (line 2, column 5): something is off\n--> shader.frag:2:5\n  x = 1;\n    ^"
        );
    }
}
