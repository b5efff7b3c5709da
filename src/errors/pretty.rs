use super::Diagnostic;

pub fn underline(line: &str, column: usize, width: usize) -> String {
    let mut marker = String::new();
    for _ in 1..column {
        marker.push(' ');
    }
    for _ in 0..width.max(1) {
        marker.push('^');
    }
    format!("{}\n{}", line, marker)
}

pub fn format_diagnostic<D: Diagnostic>(source_label: &str, source: &str, diagnostic: &D) -> String {
    let line_no = diagnostic.line();
    let mut rendered = format!(
        "{}: {}\n --> {}:{}",
        diagnostic.severity(),
        diagnostic.message(),
        source_label,
        line_no
    );
    if let Some(column) = diagnostic.column() {
        rendered.push_str(&format!(":{}", column));
    }

    let Some(text) = source.lines().nth(line_no.saturating_sub(1)) else {
        return rendered;
    };
    rendered.push('\n');
    match diagnostic.column() {
        Some(column) => rendered.push_str(&underline(text, column, diagnostic.width())),
        None => rendered.push_str(text),
    }
    rendered
}

pub fn format_all<D: Diagnostic>(source_label: &str, source: &str, diagnostics: &[D]) -> Vec<String> {
    diagnostics
        .iter()
        .map(|diagnostic| format_diagnostic(source_label, source, diagnostic))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{LexicalError, SemanticError};

    #[test]
    fn underlines_the_narrowed_span() {
        let err = LexicalError {
            message: "second decimal point in number".to_string(),
            line: 1,
            column: 6,
            length: 1,
        };
        let rendered = format_diagnostic("demo.cn", "34.34.34", &err);
        assert!(rendered.ends_with("34.34.34\n     ^"), "{}", rendered);
        assert!(rendered.contains("demo.cn:1:6"));
    }

    #[test]
    fn semantic_errors_without_column_print_the_line() {
        let err = SemanticError::new("variable 'a' already declared in this scope", 2, None);
        let rendered = format_diagnostic("demo.cn", "main {\n int a;\n}", &err);
        assert!(rendered.ends_with(" int a;"));
    }
}
