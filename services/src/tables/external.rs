//! A table whose rows come from outside the relational store.

use crate::error::{DataSourceError, DescriptorError};
use crate::table::{
    ColumnSpec, DataSource, DataType, FormFieldSpec, PageData, PageRequest, RequestContext,
    TableBuilder, TableDescriptor, Value, Widget, row_from,
};

/// Total reported by the remote listing; larger than the rows it hands back.
const REMOTE_TOTAL: u64 = 10;

pub fn table(ctx: &RequestContext) -> Result<TableDescriptor, DescriptorError> {
    TableBuilder::new("external")
        .title(ctx.text("External", "外部数据"))
        .description(ctx.text("External", "外部数据"))
        .primary_key("id", DataType::Int)
        .data_source(DataSource::custom(list))
        .detail_source(DataSource::custom(detail))
        .column(ColumnSpec::new(ctx.text("ID", "编号"), "id", DataType::Int).sortable())
        .column(ColumnSpec::new(ctx.text("Title", "标题"), "title", DataType::Varchar))
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
        .build()
}

fn list(request: &PageRequest) -> Result<PageData, DataSourceError> {
    tracing::debug!(page = request.page, page_size = request.page_size, "Fetching external rows");
    let titles = [
        "This is a title",
        "This is a title2",
        "This is a title3",
        "This is a title4",
    ];
    let rows = (10..)
        .zip(titles)
        .map(|(id, title)| row_from([("id", Value::Int(id)), ("title", Value::from(title))]))
        .collect();
    Ok(PageData::new(rows, REMOTE_TOTAL))
}

fn detail(_: &PageRequest) -> Result<PageData, DataSourceError> {
    Ok(PageData::new(
        vec![row_from([
            ("id", Value::Int(10)),
            ("title", Value::from("This is a title")),
        ])],
        1,
    ))
}
