use serde::Serialize;

use super::types::Type;

/// Type-annotated copy of the syntax tree handed to hosts. Built while the
/// analyzer walks the program; the parser's tree is never touched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedNode {
    pub kind: &'static str,
    pub value: Option<String>,
    pub line: usize,
    pub ty: Option<Type>,
    pub children: Vec<AnnotatedNode>,
}

impl AnnotatedNode {
    pub fn new(kind: &'static str, line: usize) -> Self {
        Self {
            kind,
            value: None,
            line,
            ty: None,
            children: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_type(mut self, ty: Type) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn with_children(mut self, children: Vec<AnnotatedNode>) -> Self {
        self.children = children;
        self
    }

    pub fn push(&mut self, child: AnnotatedNode) {
        self.children.push(child);
    }

    /// Depth-first search for the first node of `kind`.
    pub fn find(&self, kind: &str) -> Option<&AnnotatedNode> {
        if self.kind == kind {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(kind))
    }

    /// Indented outline, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.kind);
        if let Some(value) = &self.value {
            out.push_str(&format!(" {}", value));
        }
        if let Some(ty) = self.ty {
            out.push_str(&format!(" : {}", ty));
        }
        out.push_str(&format!(" (line {})\n", self.line));
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}
