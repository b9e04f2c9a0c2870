//! Notices about what generation skipped and why.
//!
//! Nothing is dropped silently: every rejected class, function, member or
//! parent produces a [`Notice`], which is both logged through `tracing` and
//! kept for the run summary.

use std::fmt;

use serde::Serialize;

/// What a notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeKind {
    ClassNotLoadable,
    FunctionNotLoadable,
    MemberFunctionIgnored,
    MemberVariableIgnored,
    ParentClassIgnored,
    NoFactoryFunctions,
    NoPointerCopyAndAssignment,
    NoInsertionPoint,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoticeKind::ClassNotLoadable => "class not loadable",
            NoticeKind::FunctionNotLoadable => "function not loadable",
            NoticeKind::MemberFunctionIgnored => "member function ignored",
            NoticeKind::MemberVariableIgnored => "member variable ignored",
            NoticeKind::ParentClassIgnored => "parent class ignored",
            NoticeKind::NoFactoryFunctions => "no factory functions",
            NoticeKind::NoPointerCopyAndAssignment => "no pointer copy and assignment",
            NoticeKind::NoInsertionPoint => "no insertion point",
        };
        f.write_str(text)
    }
}

/// One skipped item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    /// Qualified name of the class, function or member concerned.
    pub subject: String,
    pub reason: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind, self.subject, self.reason)
    }
}

/// Notices collected over one generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    notices: Vec<Notice>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a notice.
    pub fn record(&mut self, kind: NoticeKind, subject: impl Into<String>, reason: impl Into<String>) {
        let notice = Notice {
            kind,
            subject: subject.into(),
            reason: reason.into(),
        };
        if kind == NoticeKind::NoPointerCopyAndAssignment {
            tracing::warn!(
                kind = %notice.kind,
                subject = %notice.subject,
                reason = %notice.reason,
                "Skipped"
            );
        } else {
            tracing::info!(
                kind = %notice.kind,
                subject = %notice.subject,
                reason = %notice.reason,
                "Skipped"
            );
        }
        self.notices.push(notice);
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn of_kind(&self, kind: NoticeKind) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(move |n| n.kind == kind)
    }

    /// Whether a notice of `kind` was recorded for `subject`.
    pub fn contains(&self, kind: NoticeKind, subject: &str) -> bool {
        self.of_kind(kind).any(|n| n.subject == subject)
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn into_notices(self) -> Vec<Notice> {
        self.notices
    }
}
