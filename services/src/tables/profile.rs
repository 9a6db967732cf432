use crate::error::DescriptorError;
use crate::table::{
    ColumnSpec, DataSource, DataType, FilterOperator, FormFieldSpec, Language, RequestContext,
    TableBuilder, TableDescriptor, Value, Widget,
};
use std::path::Path;

const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

pub fn table(ctx: &RequestContext) -> Result<TableDescriptor, DescriptorError> {
    let lang = ctx.language();

    TableBuilder::new("profile")
        .title(ctx.text("Profile", "用户档案"))
        .description(ctx.text("Profile", "用户档案"))
        .primary_key("id", DataType::Int)
        .data_source(DataSource::relational("profile"))
        .column(
            ColumnSpec::new(ctx.text("ID", "编号"), "id", DataType::Int)
                .filterable(FilterOperator::Eq),
        )
        .column(ColumnSpec::new("UUID", "uuid", DataType::Varchar))
        .column(
            ColumnSpec::new(ctx.text("Pass", "通过"), "pass", DataType::Tinyint)
                .display(|value, _| Value::Bool(value.as_i64() == Some(1))),
        )
        .column(ColumnSpec::new(
            ctx.text("Photos", "照片"),
            "photos",
            DataType::Varchar,
        ))
        .column(
            ColumnSpec::new(
                ctx.text("Finish State", "完成状态"),
                "finish_state",
                DataType::Tinyint,
            )
            .display(move |value, _| finish_state(lang, value)),
        )
        .column(ColumnSpec::new(
            ctx.text("Progress", "进度"),
            "finish_progress",
            DataType::Int,
        ))
        .column(
            ColumnSpec::new(ctx.text("Resume", "简历"), "resume", DataType::Varchar)
                .display(|value, _| file_name(value)),
        )
        .column(
            ColumnSpec::new(ctx.text("FileSize", "文件大小"), "resume_size", DataType::Int)
                .display(|value, _| match value.as_i64() {
                    Some(bytes) => Value::from(file_size(bytes.max(0) as u64)),
                    None => value.clone(),
                }),
        )
        .form_field(
            FormFieldSpec::new(ctx.text("ID", "编号"), "id", DataType::Int, Widget::Default)
                .not_allow_add()
                .not_allow_edit(),
        )
        .form_field(FormFieldSpec::new("UUID", "uuid", DataType::Varchar, Widget::Text))
        .form_field(
            FormFieldSpec::new(
                ctx.text("Photos", "照片"),
                "photos",
                DataType::Varchar,
                Widget::Text,
            )
            .help(ctx.text("Comma separated image URLs", "逗号分隔的图片地址")),
        )
        .form_field(FormFieldSpec::new(
            ctx.text("Resume", "简历"),
            "resume",
            DataType::Varchar,
            Widget::Text,
        ))
        .form_field(FormFieldSpec::new(
            ctx.text("FileSize", "文件大小"),
            "resume_size",
            DataType::Int,
            Widget::Number,
        ))
        .form_field(FormFieldSpec::new(
            ctx.text("Finish State", "完成状态"),
            "finish_state",
            DataType::Tinyint,
            Widget::Number,
        ))
        .form_field(FormFieldSpec::new(
            ctx.text("Progress", "进度"),
            "finish_progress",
            DataType::Int,
            Widget::Number,
        ))
        .form_field(FormFieldSpec::new(
            ctx.text("Pass", "通过"),
            "pass",
            DataType::Tinyint,
            Widget::Number,
        ))
        .build()
}

fn finish_state(lang: Language, value: &Value) -> Value {
    let label = match value.as_i64() {
        Some(0) => lang.pick("Step 1", "步骤1"),
        Some(1) => lang.pick("Step 2", "步骤2"),
        Some(2) => lang.pick("Step 3", "步骤3"),
        _ => lang.pick("Unknown", "未知"),
    };
    Value::from(label)
}

fn file_name(value: &Value) -> Value {
    let path = value.to_string();
    match Path::new(&path).file_name() {
        Some(name) => Value::from(name.to_string_lossy().into_owned()),
        None => Value::from(path),
    }
}

/// Human readable byte count, e.g. `1.50 KB`.
fn file_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.2} {}", SIZE_UNITS[unit])
}
