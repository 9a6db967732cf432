//! Form submission processing and form schema view models.

use crate::error::FormError;
use crate::table::{
    DataType, FieldOption, FormFieldSpec, FormMode, FormTabs, PostField, Row, TableDescriptor,
    Value, Widget,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Prefix of framework parameters that travel with a form but are not fields.
const RESERVED_PREFIX: &str = "__";

/// Values ready to persist, plus the primary key an edit targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub values: Row,
    pub primary_key: Option<Value>,
}

/// Turns raw submitted strings into typed values for `mode`.
///
/// - fields the mode does not accept are skipped, as are read-only widgets;
/// - a missing field takes its default on add and is left untouched on edit;
/// - a post-submit transform may replace the value, and an empty result means
///   the field is not persisted.
pub fn process(
    descriptor: &TableDescriptor,
    mode: FormMode,
    input: &BTreeMap<String, String>,
) -> Result<Submission, FormError> {
    let primary_key = descriptor.primary_key();

    if let Some(unknown) = input.keys().find(|key| {
        !key.starts_with(RESERVED_PREFIX)
            && **key != primary_key.name
            && descriptor.form_field(key).is_none()
    }) {
        return Err(FormError::UnknownField(unknown.clone()));
    }

    let target = match mode {
        FormMode::Add => None,
        FormMode::Edit => {
            let raw = input
                .get(&primary_key.name)
                .filter(|raw| !raw.trim().is_empty())
                .ok_or_else(|| FormError::MissingPrimaryKey(primary_key.name.clone()))?;
            Some(coerce(&primary_key.name, primary_key.data_type, raw)?)
        }
    };

    let mut values = Row::new();
    for spec in descriptor.form_fields() {
        if spec.field == primary_key.name || !spec.accepts(mode) {
            continue;
        }

        let value = match (input.get(&spec.field), mode) {
            (Some(raw), _) => coerce(&spec.field, spec.data_type, raw)?,
            (None, FormMode::Add) => match &spec.default {
                Some(default) => coerce(&spec.field, spec.data_type, &default.to_string())?,
                None => continue,
            },
            (None, FormMode::Edit) => continue,
        };

        let value = match &spec.transform {
            Some(transform) => {
                let transformed = transform(&PostField {
                    field: &spec.field,
                    value: &value,
                    mode,
                });
                if transformed.is_empty() {
                    tracing::debug!(
                        table = descriptor.name(),
                        field = %spec.field,
                        "Transform dropped field"
                    );
                    continue;
                }
                transformed
            }
            None => value,
        };

        values.insert(spec.field.clone(), value);
    }

    Ok(Submission {
        values,
        primary_key: target,
    })
}

fn coerce(field: &str, data_type: DataType, raw: &str) -> Result<Value, FormError> {
    data_type
        .coerce(raw)
        .map_err(|reason| FormError::InvalidValue {
            field: field.to_owned(),
            reason,
        })
}

/// Options for the field that `field` drives, given `field`'s newly chosen value.
///
/// Returns the target field name with its options.
pub fn dynamic_options(
    descriptor: &TableDescriptor,
    field: &str,
    value: &str,
) -> Result<(String, Vec<FieldOption>), FormError> {
    let spec = descriptor
        .form_field(field)
        .ok_or_else(|| FormError::UnknownField(field.to_owned()))?;
    let choose = spec
        .on_choose
        .as_ref()
        .ok_or_else(|| FormError::NoDynamicOptions(field.to_owned()))?;
    Ok((choose.target.clone(), (choose.load)(value)))
}

/// One field of a rendered form.
#[derive(Debug, Clone, Serialize)]
pub struct FormFieldView {
    pub label: String,
    pub field: String,
    pub data_type: DataType,
    pub widget: Widget,
    pub value: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub hidden: bool,
    pub read_only: bool,
    pub allow_upload: bool,
    /// Field whose options reload when this one changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drives: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub table: String,
    pub title: String,
    pub description: String,
    pub mode: FormMode,
    pub primary_key: String,
    pub fields: Vec<FormFieldView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabs: Option<FormTabs>,
}

/// Builds the form for `mode`, filled from `current` when editing an existing row.
///
/// The add form leaves out fields not allowed on add; the edit form shows every
/// field and marks the ones it will not write as read-only.
pub fn schema(descriptor: &TableDescriptor, mode: FormMode, current: Option<&Row>) -> FormSchema {
    let fields = descriptor
        .form_fields()
        .iter()
        .filter(|spec| mode == FormMode::Edit || spec.visibility.on_add)
        .map(|spec| field_view(spec, mode, current))
        .collect();

    FormSchema {
        table: descriptor.name().to_owned(),
        title: descriptor.title().to_owned(),
        description: descriptor.description().to_owned(),
        mode,
        primary_key: descriptor.primary_key().name.clone(),
        fields,
        tabs: descriptor.form_tabs().cloned(),
    }
}

pub(crate) fn field_view(
    spec: &FormFieldSpec,
    mode: FormMode,
    current: Option<&Row>,
) -> FormFieldView {
    let value = current
        .and_then(|row| row.get(&spec.field))
        .cloned()
        .or_else(|| spec.default.clone())
        .unwrap_or_default();
    let options = if spec.widget.takes_options() || spec.options_init.is_some() {
        spec.options_for(&value.to_string())
    } else {
        Vec::new()
    };

    FormFieldView {
        label: spec.label.clone(),
        field: spec.field.clone(),
        data_type: spec.data_type,
        widget: spec.widget,
        value,
        options,
        help: spec.help.clone(),
        hidden: spec.visibility.hidden,
        read_only: !spec.accepts(mode),
        allow_upload: spec.allow_upload,
        drives: spec.on_choose.as_ref().map(|c| c.target.clone()),
    }
}
