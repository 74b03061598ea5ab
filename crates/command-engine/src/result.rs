//! Uniform invocation results.

/// Outcome of one dispatch cycle, ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    Success {
        text: Option<String>,
        rich: Option<RichPayload>,
    },
    Error {
        title: String,
        description: String,
    },
}

/// Structured reply body (title, description, fields).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<RichField>,
}

/// One named field of a rich payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RichField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl RichPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(RichField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }

    pub fn inline_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(RichField {
            name: name.into(),
            value: value.into(),
            inline: true,
        });
        self
    }
}

impl InvocationResult {
    /// Success with no content. Nothing is delivered.
    pub fn empty() -> Self {
        InvocationResult::Success {
            text: None,
            rich: None,
        }
    }

    /// Success carrying plain text.
    pub fn text(text: impl Into<String>) -> Self {
        InvocationResult::Success {
            text: Some(text.into()),
            rich: None,
        }
    }

    /// Success carrying a rich payload.
    pub fn rich(payload: RichPayload) -> Self {
        InvocationResult::Success {
            text: None,
            rich: Some(payload),
        }
    }

    /// Error with the default title.
    pub fn error(description: impl Into<String>) -> Self {
        Self::error_titled("Error", description)
    }

    pub fn error_titled(title: impl Into<String>, description: impl Into<String>) -> Self {
        InvocationResult::Error {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success { .. })
    }

    /// Whether delivering this result would produce no output.
    pub fn is_empty(&self) -> bool {
        matches!(
            self,
            InvocationResult::Success {
                text: None,
                rich: None
            }
        )
    }

    /// Plain text of a successful result, if any.
    pub fn text_content(&self) -> Option<&str> {
        match self {
            InvocationResult::Success { text, .. } => text.as_deref(),
            InvocationResult::Error { .. } => None,
        }
    }
}
