//! Row-level and table-level actions.

use super::column::FieldOption;
use super::context::RequestContext;
use super::value::Value;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: data.into(),
        }
    }
}

pub type ActionHandler = Arc<dyn Fn(&RequestContext) -> ActionResponse + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionScope {
    /// Rendered once per row; the row's primary key arrives as the `id` parameter.
    Row,
    Table,
}

#[derive(Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Plain navigation.
    Jump { url: String },
    /// Asynchronous callback; the response is shown as a toast.
    Ajax {
        url: String,
        #[serde(skip)]
        handler: ActionHandler,
    },
    /// Callback whose `data` fills a modal.
    PopUp {
        url: String,
        title: String,
        #[serde(skip)]
        handler: ActionHandler,
    },
    /// Modal wrapping another admin page.
    PopUpIframe {
        url: String,
        title: String,
        src: String,
        width: String,
        height: String,
    },
    /// Select box that filters the list by one field.
    FieldFilter {
        field: String,
        options: Vec<FieldOption>,
    },
}

impl fmt::Debug for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jump { url } => f.debug_struct("Jump").field("url", url).finish(),
            Self::Ajax { url, .. } => f.debug_struct("Ajax").field("url", url).finish(),
            Self::PopUp { url, title, .. } => f
                .debug_struct("PopUp")
                .field("url", url)
                .field("title", title)
                .finish(),
            Self::PopUpIframe { url, src, .. } => f
                .debug_struct("PopUpIframe")
                .field("url", url)
                .field("src", src)
                .finish(),
            Self::FieldFilter { field, .. } => {
                f.debug_struct("FieldFilter").field("field", field).finish()
            }
        }
    }
}

impl ActionKind {
    pub fn jump(url: impl Into<String>) -> Self {
        Self::Jump { url: url.into() }
    }

    pub fn ajax<F>(url: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&RequestContext) -> ActionResponse + Send + Sync + 'static,
    {
        Self::Ajax {
            url: url.into(),
            handler: Arc::new(handler),
        }
    }

    pub fn popup<F>(url: impl Into<String>, title: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&RequestContext) -> ActionResponse + Send + Sync + 'static,
    {
        Self::PopUp {
            url: url.into(),
            title: title.into(),
            handler: Arc::new(handler),
        }
    }

    pub fn iframe(
        url: impl Into<String>,
        title: impl Into<String>,
        src: impl Into<String>,
        width: impl Into<String>,
        height: impl Into<String>,
    ) -> Self {
        Self::PopUpIframe {
            url: url.into(),
            title: title.into(),
            src: src.into(),
            width: width.into(),
            height: height.into(),
        }
    }

    pub fn field_filter(field: impl Into<String>, options: Vec<FieldOption>) -> Self {
        Self::FieldFilter {
            field: field.into(),
            options,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionSpec {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub scope: ActionScope,
    pub kind: ActionKind,
}

impl ActionSpec {
    pub fn row(id: impl Into<String>, label: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            scope: ActionScope::Row,
            kind,
        }
    }

    pub fn table(id: impl Into<String>, label: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            scope: ActionScope::Table,
            ..Self::row(id, label, kind)
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Runs the callback of an ajax or popup action; `None` for the other kinds.
    pub fn invoke(&self, ctx: &RequestContext) -> Option<ActionResponse> {
        match &self.kind {
            ActionKind::Ajax { handler, .. } | ActionKind::PopUp { handler, .. } => {
                Some(handler(ctx))
            }
            _ => None,
        }
    }
}
