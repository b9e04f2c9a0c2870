//! Indented C++ text emission.

/// Accumulates lines of C++ at a tracked indentation level. Braces go on
/// their own lines.
#[derive(Debug, Clone)]
pub struct CodeWriter {
    out: String,
    width: usize,
    level: usize,
}

impl CodeWriter {
    pub fn new(width: usize) -> Self {
        Self {
            out: String::new(),
            width,
            level: 0,
        }
    }

    /// Write one line at the current level. Empty text writes a bare newline.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            self.out.push_str(&" ".repeat(self.width * self.level));
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// `header` then `{`, and indent.
    pub fn open(&mut self, header: impl AsRef<str>) {
        self.line(header);
        self.line("{");
        self.indent();
    }

    /// Dedent, then `}` followed by `trailer` (`;` for class bodies).
    pub fn close(&mut self, trailer: &str) {
        self.dedent();
        self.line(format!("}}{trailer}"));
    }

    /// Write a short function on one line per statement:
    /// `header`, `{`, each statement, `}`.
    pub fn function(&mut self, header: impl AsRef<str>, body: &[String]) {
        self.open(header);
        for statement in body {
            self.line(statement);
        }
        self.close("");
    }

    /// Open `namespace a { namespace b {` without indenting their bodies.
    pub fn open_namespaces(&mut self, scope: &[String]) {
        for name in scope {
            self.line(format!("namespace {name}"));
            self.line("{");
        }
    }

    pub fn close_namespaces(&mut self, scope: &[String]) {
        for _ in scope {
            self.line("}");
        }
    }

    /// Append pre-rendered text verbatim.
    pub fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_blocks_indent() {
        let mut w = CodeWriter::new(2);
        w.open("class A");
        w.line("public:");
        w.indent();
        w.function("void f()", &["g();".to_string()]);
        w.dedent();
        w.close(";");
        assert_eq!(
            w.finish(),
            "class A\n{\n  public:\n    void f()\n    {\n      g();\n    }\n};\n"
        );
    }

    #[test]
    fn namespaces_do_not_indent() {
        let mut w = CodeWriter::new(4);
        let scope = vec!["a".to_string(), "b".to_string()];
        w.open_namespaces(&scope);
        w.line("class X;");
        w.close_namespaces(&scope);
        assert_eq!(w.finish(), "namespace a\n{\nnamespace b\n{\nclass X;\n}\n}\n");
    }
}
