use crate::error::DescriptorError;
use crate::table::{
    ColumnSpec, DataSource, DataType, EditType, FormFieldSpec, Join, RequestContext, Row,
    TableBuilder, TableDescriptor, Value, Widget,
};

pub fn table(ctx: &RequestContext) -> Result<TableDescriptor, DescriptorError> {
    let author = Join::new("author_id", "id", "authors");

    TableBuilder::new("posts")
        .title(ctx.text("Posts", "文章"))
        .description(ctx.text("Posts", "文章"))
        .primary_key("id", DataType::Int)
        .data_source(DataSource::relational("posts"))
        .column(ColumnSpec::new(ctx.text("ID", "编号"), "id", DataType::Int).sortable())
        .column(ColumnSpec::new(ctx.text("Title", "标题"), "title", DataType::Varchar))
        .column(ColumnSpec::new(
            ctx.text("Author ID", "作者ID"),
            "author_id",
            DataType::Int,
        ))
        .column(ColumnSpec::computed(
            ctx.text("Author Name", "作者姓名"),
            "name",
            author_name,
        ))
        .column(
            ColumnSpec::new(ctx.text("First Name", "作者名"), "first_name", DataType::Varchar)
                .join(author.clone())
                .hide(),
        )
        .column(
            ColumnSpec::new(ctx.text("Last Name", "作者姓"), "last_name", DataType::Varchar)
                .join(author)
                .hide(),
        )
        .column(ColumnSpec::new(
            ctx.text("Description", "描述"),
            "description",
            DataType::Varchar,
        ))
        .column(
            ColumnSpec::new(ctx.text("Content", "内容"), "content", DataType::Varchar)
                .editable(EditType::Textarea),
        )
        .column(ColumnSpec::new(ctx.text("Date", "日期"), "date", DataType::Varchar))
        .form_field(
            FormFieldSpec::new(ctx.text("ID", "编号"), "id", DataType::Int, Widget::Default)
                .not_allow_add()
                .not_allow_edit(),
        )
        .form_field(FormFieldSpec::new(
            ctx.text("Title", "标题"),
            "title",
            DataType::Varchar,
            Widget::Text,
        ))
        .form_field(FormFieldSpec::new(
            ctx.text("Description", "描述"),
            "description",
            DataType::Varchar,
            Widget::Text,
        ))
        .form_field(
            FormFieldSpec::new(
                ctx.text("Content", "内容"),
                "content",
                DataType::Varchar,
                Widget::RichText,
            )
            .enable_upload(),
        )
        .form_field(FormFieldSpec::new(
            ctx.text("Date", "日期"),
            "date",
            DataType::Varchar,
            Widget::Datetime,
        ))
        .build()
}

fn author_name(_: &Value, row: &Row) -> Value {
    let part = |field: &str| row.get(field).map(Value::to_string).unwrap_or_default();
    let first = part("authors_joined_first_name");
    let last = part("authors_joined_last_name");
    Value::from(format!("{first} {last}").trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::row_from;

    #[test]
    fn author_name_joins_both_parts() {
        let row = row_from([
            ("authors_joined_first_name", "Grace"),
            ("authors_joined_last_name", "Hopper"),
        ]);
        assert_eq!(author_name(&Value::Null, &row), Value::from("Grace Hopper"));
        assert_eq!(author_name(&Value::Null, &Row::new()), Value::from(""));
    }

    #[test]
    fn name_columns_are_read_only_joins() {
        let posts = table(&RequestContext::startup()).unwrap();
        let first = posts.column("first_name").unwrap();
        assert!(first.is_joined() && first.hidden && !first.is_editable());
        assert_eq!(posts.stored_fields(), vec![
            "id",
            "title",
            "author_id",
            "description",
            "content",
            "date"
        ]);
    }
}
