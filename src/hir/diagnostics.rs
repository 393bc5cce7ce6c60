//! Diagnostics - overlay merge issues.
//!
//! Every issue the builder raises is non-fatal: it is attached to the span
//! of the responsible fragment and processing continues.

use std::sync::Arc;

use crate::base::{FileId, Location};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }
}

/// Rendering hints for editors (strikethrough, faded).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticTag {
    Unnecessary,
    Deprecated,
}

/// The closed set of issues the graph builder reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Two children of one body share name and address.
    DuplicateNodeName,
    /// A property is assigned twice inside one body.
    DuplicatePropertyName,
    /// `/delete-node/` names a node that is not live.
    NodeDoesNotExist,
    /// `/delete-property/` names a property that is not live.
    PropertyDoesNotExist,
    /// `&label` or `&{/path}` does not resolve to a node.
    UnableToResolveChildNode,
    /// A label names two different nodes.
    LabelAlreadyInUse,
    /// A label is declared again on the node it already names.
    LabelReassigned,
    /// A phandle value is held by more than one live node.
    DuplicatePhandle,
    /// Definition removed by a later delete directive.
    DeletedByDirective,
}

impl IssueKind {
    /// Stable code shown to users.
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::DuplicateNodeName => "DUPLICATE_NODE_NAME",
            IssueKind::DuplicatePropertyName => "DUPLICATE_PROPERTY_NAME",
            IssueKind::NodeDoesNotExist => "NODE_DOES_NOT_EXIST",
            IssueKind::PropertyDoesNotExist => "PROPERTY_DOES_NOT_EXIST",
            IssueKind::UnableToResolveChildNode => "UNABLE_TO_RESOLVE_CHILD_NODE",
            IssueKind::LabelAlreadyInUse => "LABEL_ALREADY_IN_USE",
            IssueKind::LabelReassigned => "LABEL_REASSIGNED",
            IssueKind::DuplicatePhandle => "DUPLICATE_PHANDLE",
            IssueKind::DeletedByDirective => "DELETED_BY_DIRECTIVE",
        }
    }

    /// Default severity for this kind.
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::DuplicateNodeName
            | IssueKind::NodeDoesNotExist
            | IssueKind::PropertyDoesNotExist
            | IssueKind::UnableToResolveChildNode
            | IssueKind::LabelAlreadyInUse => Severity::Error,
            IssueKind::DuplicatePropertyName | IssueKind::DuplicatePhandle => Severity::Warning,
            IssueKind::LabelReassigned | IssueKind::DeletedByDirective => Severity::Hint,
        }
    }
}

/// An issue raised while merging fragments.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    /// Span of the responsible fragment.
    pub location: Location,
    pub message: Arc<str>,
    pub tags: Vec<DiagnosticTag>,
    /// The directive that caused a deletion-originated issue.
    pub linked_to: Option<Location>,
}

impl OverlayIssue {
    /// Create an issue with the kind's default severity.
    pub fn new(kind: IssueKind, location: Location, message: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            location,
            message: message.into(),
            tags: Vec::new(),
            linked_to: None,
        }
    }

    pub fn with_tag(mut self, tag: DiagnosticTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn linked_to(mut self, location: Location) -> Self {
        self.linked_to = Some(location);
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

// ============================================================================
// ISSUE COLLECTOR
// ============================================================================

/// Collects issues during a build.
#[derive(Clone, Debug, Default)]
pub struct IssueCollector {
    issues: Vec<OverlayIssue>,
}

impl IssueCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: OverlayIssue) {
        tracing::trace!(code = issue.code(), message = %issue.message, "overlay issue");
        self.issues.push(issue);
    }

    pub fn report(&mut self, kind: IssueKind, location: Location, message: impl Into<Arc<str>>) {
        self.add(OverlayIssue::new(kind, location, message));
    }

    /// Deprecated-tagged hint for an entity removed by `directive`.
    pub fn deleted(&mut self, location: Location, directive: Location, what: &str) {
        self.add(
            OverlayIssue::new(
                IssueKind::DeletedByDirective,
                location,
                format!("{what} is deleted by a later directive"),
            )
            .with_tag(DiagnosticTag::Deprecated)
            .linked_to(directive),
        );
    }

    pub fn issues(&self) -> &[OverlayIssue] {
        &self.issues
    }

    pub fn issues_for_file(&self, file: FileId) -> Vec<&OverlayIssue> {
        self.issues
            .iter()
            .filter(|i| i.location.file == file)
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Take all issues, leaving the collector empty.
    pub fn take(&mut self) -> Vec<OverlayIssue> {
        std::mem::take(&mut self.issues)
    }
}
