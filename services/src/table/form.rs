//! Form field specifications used by the add/edit forms.

use super::column::FieldOption;
use super::value::{DataType, Row, Value};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// What the submitted field looks like when a post-submit transform sees it.
#[derive(Debug, Clone, Copy)]
pub struct PostField<'a> {
    pub field: &'a str,
    pub value: &'a Value,
    pub mode: FormMode,
}

/// Returns the value to persist. `Null` or empty text means "do not persist this field".
pub type PostTransform = Arc<dyn Fn(&PostField<'_>) -> Value + Send + Sync>;

/// Maps a field's current value to a list of options.
pub type OptionsFn = Arc<dyn Fn(&str) -> Vec<FieldOption> + Send + Sync>;

/// Runs with the persisted values after a successful submission.
pub type PostHook = Arc<dyn Fn(&Row) -> Result<(), String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    Add,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    /// Read-only display of the current value; never persisted.
    Default,
    Text,
    Textarea,
    Password,
    Email,
    Url,
    Ip,
    Color,
    Currency,
    Number,
    Slider,
    Rate,
    Date,
    Datetime,
    DatetimeRange,
    Select,
    SelectSingle,
    SelectBox,
    Radio,
    Checkbox,
    Switch,
    RichText,
    Code,
    File,
    Multifile,
}

impl Widget {
    pub fn is_read_only(self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn takes_options(self) -> bool {
        matches!(
            self,
            Self::Select
                | Self::SelectSingle
                | Self::SelectBox
                | Self::Radio
                | Self::Checkbox
                | Self::Switch
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub on_add: bool,
    pub on_edit: bool,
    pub hidden: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            on_add: true,
            on_edit: true,
            hidden: false,
        }
    }
}

impl Visibility {
    pub fn allows(self, mode: FormMode) -> bool {
        match mode {
            FormMode::Add => self.on_add,
            FormMode::Edit => self.on_edit,
        }
    }
}

/// Another field whose options are reloaded whenever this field changes.
#[derive(Clone)]
pub struct ChooseOptions {
    pub target: String,
    pub load: OptionsFn,
}

#[derive(Clone, Serialize)]
pub struct FormFieldSpec {
    pub label: String,
    pub field: String,
    pub data_type: DataType,
    pub widget: Widget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    pub visibility: Visibility,
    pub allow_upload: bool,
    #[serde(skip)]
    pub transform: Option<PostTransform>,
    #[serde(skip)]
    pub on_choose: Option<ChooseOptions>,
    #[serde(skip)]
    pub options_init: Option<OptionsFn>,
}

impl fmt::Debug for FormFieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormFieldSpec")
            .field("label", &self.label)
            .field("field", &self.field)
            .field("data_type", &self.data_type)
            .field("widget", &self.widget)
            .field("default", &self.default)
            .field("visibility", &self.visibility)
            .field("transform", &self.transform.is_some())
            .field(
                "on_choose",
                &self.on_choose.as_ref().map(|c| c.target.as_str()),
            )
            .finish_non_exhaustive()
    }
}

impl FormFieldSpec {
    pub fn new(
        label: impl Into<String>,
        field: impl Into<String>,
        data_type: DataType,
        widget: Widget,
    ) -> Self {
        Self {
            label: label.into(),
            field: field.into(),
            data_type,
            widget,
            default: None,
            help: None,
            options: Vec::new(),
            visibility: Visibility::default(),
            allow_upload: false,
            transform: None,
            on_choose: None,
            options_init: None,
        }
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    pub fn not_allow_add(mut self) -> Self {
        self.visibility.on_add = false;
        self
    }

    pub fn not_allow_edit(mut self) -> Self {
        self.visibility.on_edit = false;
        self
    }

    pub fn add_only(self) -> Self {
        self.not_allow_edit()
    }

    pub fn edit_only(self) -> Self {
        self.not_allow_add()
    }

    pub fn hide(mut self) -> Self {
        self.visibility.hidden = true;
        self
    }

    pub fn enable_upload(mut self) -> Self {
        self.allow_upload = true;
        self
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&PostField<'_>) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn on_choose<F>(mut self, target: impl Into<String>, load: F) -> Self
    where
        F: Fn(&str) -> Vec<FieldOption> + Send + Sync + 'static,
    {
        self.on_choose = Some(ChooseOptions {
            target: target.into(),
            load: Arc::new(load),
        });
        self
    }

    pub fn options_init<F>(mut self, init: F) -> Self
    where
        F: Fn(&str) -> Vec<FieldOption> + Send + Sync + 'static,
    {
        self.options_init = Some(Arc::new(init));
        self
    }

    /// Options to show for the given current value.
    pub fn options_for(&self, current: &str) -> Vec<FieldOption> {
        match &self.options_init {
            Some(init) => init(current),
            None => self
                .options
                .iter()
                .cloned()
                .map(|option| {
                    if option.value == current {
                        option.selected()
                    } else {
                        option
                    }
                })
                .collect(),
        }
    }

    /// Whether a submission in `mode` may write this field.
    pub fn accepts(&self, mode: FormMode) -> bool {
        !self.widget.is_read_only() && self.visibility.allows(mode)
    }
}

/// Tabbed layout of the form: `headers[i]` titles `groups[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormTabs {
    pub headers: Vec<String>,
    pub groups: Vec<Vec<String>>,
}

impl FormTabs {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn tab<I, S>(mut self, header: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers.push(header.into());
        self.groups.push(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().flatten().map(String::as_str)
    }
}

impl Default for FormTabs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_and_visibility_gate_submission() {
        let id = FormFieldSpec::new("Id", "id", DataType::Int, Widget::Default)
            .not_allow_add()
            .not_allow_edit();
        assert!(!id.accepts(FormMode::Add));
        assert!(!id.accepts(FormMode::Edit));

        let updated =
            FormFieldSpec::new("Updated", "updated_at", DataType::Timestamp, Widget::Datetime)
                .edit_only();
        assert!(!updated.accepts(FormMode::Add));
        assert!(updated.accepts(FormMode::Edit));
    }

    #[test]
    fn static_options_mark_current_value() {
        let gender = FormFieldSpec::new("Gender", "gender", DataType::Tinyint, Widget::Radio)
            .options(vec![FieldOption::new("0", "men"), FieldOption::new("1", "women")]);
        let options = gender.options_for("1");
        assert!(!options[0].selected);
        assert!(options[1].selected);
    }

    #[test]
    fn options_init_overrides_static_options() {
        let city = FormFieldSpec::new("City", "city", DataType::Varchar, Widget::SelectSingle)
            .options_init(|value| vec![FieldOption::new(value, value).selected()]);
        assert_eq!(
            city.options_for("london"),
            vec![FieldOption::new("london", "london").selected()]
        );
    }

    #[test]
    fn tabs_list_fields_in_order() {
        let tabs = FormTabs::new().tab("A", ["id", "name"]).tab("B", ["phone"]);
        assert_eq!(tabs.fields().collect::<Vec<_>>(), vec!["id", "name", "phone"]);
        assert_eq!(tabs.headers, vec!["A", "B"]);
    }
}
