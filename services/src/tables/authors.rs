use crate::error::DescriptorError;
use crate::table::{
    ActionKind, ActionSpec, ColumnSpec, DataSource, DataType, FormFieldSpec, RequestContext, Row,
    TableBuilder, TableDescriptor, Value, Widget,
};

pub fn table(ctx: &RequestContext) -> Result<TableDescriptor, DescriptorError> {
    TableBuilder::new("authors")
        .title(ctx.text("Authors", "作者"))
        .description(ctx.text("Authors", "作者"))
        .primary_key("id", DataType::Int)
        .data_source(DataSource::relational("authors"))
        .column(ColumnSpec::new(ctx.text("ID", "编号"), "id", DataType::Int).sortable())
        .column(
            ColumnSpec::new(ctx.text("First Name", "名"), "first_name", DataType::Varchar).hide(),
        )
        .column(
            ColumnSpec::new(ctx.text("Last Name", "姓"), "last_name", DataType::Varchar).hide(),
        )
        .column(ColumnSpec::computed(ctx.text("Name", "姓名"), "name", full_name))
        .column(ColumnSpec::new(ctx.text("Email", "邮箱"), "email", DataType::Varchar))
        .column(ColumnSpec::new(
            ctx.text("Birthdate", "出生日期"),
            "birthdate",
            DataType::Date,
        ))
        .column(ColumnSpec::new(
            ctx.text("Added", "添加时间"),
            "added",
            DataType::Timestamp,
        ))
        .action(
            ActionSpec::table(
                "articles",
                ctx.text("Articles", "文章"),
                ActionKind::iframe(
                    "/authors/list",
                    ctx.text("Articles", "文章"),
                    "/admin/info/posts",
                    "900px",
                    "560px",
                ),
            )
            .icon("tv"),
        )
        .form_field(
            FormFieldSpec::new(ctx.text("ID", "编号"), "id", DataType::Int, Widget::Default)
                .not_allow_add()
                .not_allow_edit(),
        )
        .form_field(FormFieldSpec::new(
            ctx.text("First Name", "名"),
            "first_name",
            DataType::Varchar,
            Widget::Text,
        ))
        .form_field(FormFieldSpec::new(
            ctx.text("Last Name", "姓"),
            "last_name",
            DataType::Varchar,
            Widget::Text,
        ))
        .form_field(FormFieldSpec::new(
            ctx.text("Email", "邮箱"),
            "email",
            DataType::Varchar,
            Widget::Text,
        ))
        .form_field(FormFieldSpec::new(
            ctx.text("Birthdate", "出生日期"),
            "birthdate",
            DataType::Date,
            Widget::Text,
        ))
        .form_field(FormFieldSpec::new(
            ctx.text("Added", "添加时间"),
            "added",
            DataType::Timestamp,
            Widget::Text,
        ))
        .build()
}

fn full_name(_: &Value, row: &Row) -> Value {
    let part = |field: &str| row.get(field).and_then(Value::as_str).unwrap_or_default();
    Value::from(format!("{} {}", part("first_name"), part("last_name")))
}
