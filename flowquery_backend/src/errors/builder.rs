use annotate_snippets::{
    display_list::{DisplayList, FormatOptions},
    snippet::{Annotation, AnnotationType, Slice, Snippet, SourceAnnotation},
};

use super::{span::Span, DiagnosticsContext, Level};

impl From<Level> for AnnotationType {
    fn from(level: Level) -> Self {
        match level {
            Level::ICE | Level::Error => AnnotationType::Error,
            Level::Help => AnnotationType::Help,
            Level::Note => AnnotationType::Note,
        }
    }
}

struct Label {
    contents: Option<String>,
    level: Level,
    span: Span,
}

impl<'label> From<&'label Label> for Annotation<'label> {
    fn from(label: &'label Label) -> Self {
        Annotation {
            label: Some(label.contents.as_deref().unwrap_or("")),
            id: None,
            annotation_type: label.level.into(),
        }
    }
}

impl<'label> From<&'label Label> for SourceAnnotation<'label> {
    fn from(label: &'label Label) -> Self {
        SourceAnnotation {
            label: label.contents.as_deref().unwrap_or(""),
            range: (label.span.start, label.span.end()),
            annotation_type: label.level.into(),
        }
    }
}

/// A diagnostic under construction. Nothing is printed until
/// [`emit`](DiagnosticBuilder::emit) is called.
#[must_use = "must emit the diagnostic for it to be seen"]
pub struct DiagnosticBuilder<'ctx, 'src> {
    title: String,
    level: Level,
    labels: Vec<Label>,
    footers: Vec<Label>,
    context: &'ctx DiagnosticsContext<'src>,
}

impl<'ctx, 'src> DiagnosticBuilder<'ctx, 'src> {
    pub(super) fn new(
        title: String,
        level: Level,
        context: &'ctx DiagnosticsContext<'src>,
    ) -> Self {
        Self {
            title,
            level,
            labels: Vec::new(),
            footers: Vec::new(),
            context,
        }
    }

    /// Add a label to a highlighted span with the current error level.
    /// Spans the source can't show (empty or out of range) are skipped.
    pub fn span_label(mut self, span: Span, message: impl ToString) -> Self {
        if self.context.can_show(span) {
            self.labels.push(Label {
                contents: Some(message.to_string()),
                level: self.level,
                span,
            });
        }

        self
    }

    /// Adds a `help: ...` footer.
    pub fn help(mut self, message: impl ToString) -> Self {
        self.footers.push(Label {
            contents: Some(message.to_string()),
            level: Level::Help,
            span: Span::empty(),
        });
        self
    }

    /// Adds a `note: ...` footer.
    pub fn note(mut self, message: impl ToString) -> Self {
        self.footers.push(Label {
            contents: Some(message.to_string()),
            level: Level::Note,
            span: Span::empty(),
        });
        self
    }

    /// Formats the diagnostic without printing it.
    pub fn render(self) -> String {
        let snippet = Snippet {
            title: Some(Annotation {
                label: Some(&self.title),
                id: None,
                annotation_type: self.level.into(),
            }),

            footer: self.footers.iter().map(Annotation::from).collect(),

            slices: vec![Slice {
                source: self.context.source,
                line_start: 1,
                origin: self.context.origin.as_deref(),
                fold: true,
                annotations: self.labels.iter().map(SourceAnnotation::from).collect(),
            }],

            opt: FormatOptions {
                color: self.context.color,
                ..Default::default()
            },
        };

        DisplayList::from(snippet).to_string()
    }

    pub fn emit(self) {
        eprintln!("{}", self.render());
    }
}
