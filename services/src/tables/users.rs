use crate::error::DescriptorError;
use crate::table::{
    ActionKind, ActionResponse, ActionSpec, Capabilities, ColumnSpec, DataSource, DataType,
    EditType, FieldOption, FilterOperator, FormFieldSpec, FormTabs, Language, RequestContext,
    TableBuilder, TableDescriptor, Value, Widget,
};

const AVATAR: &str = "//quick.go-admin.cn/demo/assets/dist/img/gopher_avatar.png";

pub fn table(ctx: &RequestContext) -> Result<TableDescriptor, DescriptorError> {
    let lang = ctx.language();
    let genders = vec![
        FieldOption::new("0", ctx.text("men", "男")),
        FieldOption::new("1", ctx.text("women", "女")),
    ];

    TableBuilder::new("users")
        .title(ctx.text("Users", "用户"))
        .description(ctx.text("Users", "用户"))
        .primary_key("id", DataType::Int)
        .capabilities(Capabilities {
            exportable: true,
            ..Capabilities::default()
        })
        .data_source(DataSource::relational("users"))
        .column(ColumnSpec::new(ctx.text("ID", "编号"), "id", DataType::Int).sortable())
        .column(
            ColumnSpec::new(ctx.text("Name", "姓名"), "name", DataType::Varchar)
                .editable(EditType::Text)
                .filterable(FilterOperator::Like),
        )
        .column(
            ColumnSpec::new(ctx.text("Gender", "性别"), "gender", DataType::Tinyint)
                .display(move |value, _| gender_label(lang, value))
                .editable(EditType::Switch)
                .edit_options(vec![FieldOption::new("0", "👨"), FieldOption::new("1", "👩")])
                .filter_options(genders.clone()),
        )
        .column(ColumnSpec::computed(
            ctx.text("Personality", "个性"),
            "personality",
            move |_, _| Value::from(lang.pick("handsome", "帅气")),
        ))
        .column(
            ColumnSpec::new(ctx.text("Phone", "电话"), "phone", DataType::Varchar)
                .filterable(FilterOperator::Eq),
        )
        .column(
            ColumnSpec::new(ctx.text("City", "城市"), "city", DataType::Varchar)
                .filterable(FilterOperator::Eq),
        )
        .column(
            ColumnSpec::new(ctx.text("Avatar", "头像"), "avatar", DataType::Varchar)
                .display(|_, _| Value::from(AVATAR)),
        )
        .column(
            ColumnSpec::new(ctx.text("CreatedAt", "创建时间"), "created_at", DataType::Timestamp)
                .filterable(FilterOperator::Range),
        )
        .column(
            ColumnSpec::new(ctx.text("UpdatedAt", "更新时间"), "updated_at", DataType::Timestamp)
                .editable(EditType::Datetime),
        )
        .action(
            ActionSpec::row(
                "more",
                ctx.text("see more", "查看更多"),
                ActionKind::popup("/see/more/example", ctx.text("Detail", "详情"), |ctx| {
                    ActionResponse::ok(
                        "ok",
                        ctx.text(
                            "<h1>Detail</h1><p>balabala</p>",
                            "<h1>详情</h1><p>balabala</p>",
                        ),
                    )
                }),
            )
            .icon("info"),
        )
        .action(ActionSpec::row(
            "google",
            ctx.text("Google", "谷歌"),
            ActionKind::jump("https://google.com"),
        ))
        .action(ActionSpec::row(
            "audit",
            ctx.text("Audit", "审核"),
            ActionKind::ajax("/admin/audit", audit),
        ))
        .action(ActionSpec::row(
            "preview",
            ctx.text("Preview", "预览"),
            ActionKind::popup("/admin/preview", ctx.text("Preview", "预览"), |ctx| {
                ActionResponse::ok("", ctx.text("<h2>hello world</h2>", "<h2>你好世界</h2>"))
            }),
        ))
        .action(
            ActionSpec::table(
                "google_home",
                ctx.text("Google", "谷歌"),
                ActionKind::jump("https://google.com"),
            )
            .icon("google"),
        )
        .action(
            ActionSpec::table(
                "popup",
                ctx.text("popup", "弹窗"),
                ActionKind::popup("/admin/popup", ctx.text("Popup Example", "弹窗示例"), |ctx| {
                    ActionResponse::ok("", ctx.text("<h2>hello world</h2>", "<h2>你好世界</h2>"))
                }),
            )
            .icon("terminal"),
        )
        .action(
            ActionSpec::table(
                "iframe",
                "iframe",
                ActionKind::iframe(
                    "/admin/iframe",
                    ctx.text("Iframe Example", "Iframe 示例"),
                    "/admin/info/profile/new",
                    "900px",
                    "480px",
                ),
            )
            .icon("tv"),
        )
        .action(
            ActionSpec::table("ajax", "ajax", ActionKind::ajax("/admin/ajax", audit))
                .icon("android"),
        )
        .action(ActionSpec::table(
            "gender_filter",
            ctx.text("Gender", "性别"),
            ActionKind::field_filter("gender", genders.clone()),
        ))
        .form_field(
            FormFieldSpec::new(ctx.text("ID", "编号"), "id", DataType::Int, Widget::Default)
                .not_allow_add()
                .not_allow_edit(),
        )
        .form_field(FormFieldSpec::new("IP", "ip", DataType::Varchar, Widget::Text))
        .form_field(FormFieldSpec::new(
            ctx.text("Name", "姓名"),
            "name",
            DataType::Varchar,
            Widget::Text,
        ))
        .form_field(
            FormFieldSpec::new(
                ctx.text("Gender", "性别"),
                "gender",
                DataType::Tinyint,
                Widget::Radio,
            )
            .options(genders)
            .default_value("0"),
        )
        .form_field(FormFieldSpec::new(
            ctx.text("Phone", "电话"),
            "phone",
            DataType::Varchar,
            Widget::Text,
        ))
        .form_field(
            FormFieldSpec::new(
                ctx.text("Country", "国家"),
                "country",
                DataType::Tinyint,
                Widget::SelectSingle,
            )
            .options(vec![
                FieldOption::new("0", ctx.text("China", "中国")),
                FieldOption::new("1", ctx.text("America", "美国")),
                FieldOption::new("2", ctx.text("England", "英国")),
                FieldOption::new("3", ctx.text("Canada", "加拿大")),
            ])
            .default_value("0")
            .on_choose("city", move |country| cities(lang, country)),
        )
        .form_field(
            FormFieldSpec::new(
                ctx.text("City", "城市"),
                "city",
                DataType::Varchar,
                Widget::SelectSingle,
            )
            .options_init(|current| vec![FieldOption::new(current, current).selected()]),
        )
        .form_field(
            FormFieldSpec::new(
                ctx.text("Custom Field", "自定义字段"),
                "role",
                DataType::Varchar,
                Widget::Text,
            )
            .transform(|post| {
                tracing::debug!(field = post.field, value = %post.value, "User custom field");
                Value::Null
            }),
        )
        .form_field(
            FormFieldSpec::new(
                ctx.text("UpdatedAt", "更新时间"),
                "updated_at",
                DataType::Timestamp,
                Widget::Default,
            )
            .not_allow_add(),
        )
        .form_field(
            FormFieldSpec::new(
                ctx.text("CreatedAt", "创建时间"),
                "created_at",
                DataType::Timestamp,
                Widget::Default,
            )
            .not_allow_add(),
        )
        .form_tabs(
            FormTabs::new()
                .tab(
                    ctx.text("profile1", "档案1"),
                    ["id", "ip", "name", "gender", "country", "city"],
                )
                .tab(
                    ctx.text("profile2", "档案2"),
                    ["phone", "role", "created_at", "updated_at"],
                ),
        )
        .post_hook(|values| {
            tracing::info!(fields = values.len(), "Users form post hook");
            Ok(())
        })
        .build()
}

fn audit(ctx: &RequestContext) -> ActionResponse {
    tracing::info!(id = ctx.param("id"), user = ctx.user(), "Audit requested");
    ActionResponse::ok(ctx.text("success", "成功"), "")
}

fn gender_label(lang: Language, value: &Value) -> Value {
    let label = match value.to_string().as_str() {
        "0" => lang.pick("men", "男"),
        "1" => lang.pick("women", "女"),
        _ => lang.pick("unknown", "未知"),
    };
    Value::from(label)
}

/// Cities offered for a country; unknown countries fall back to China's.
fn cities(lang: Language, country: &str) -> Vec<FieldOption> {
    let pairs: &[(&str, &str, &str)] = match country {
        "1" => &[
            ("los angeles", "Los Angeles", "洛杉矶"),
            ("washington, dc", "Washington, D.C.", "华盛顿特区"),
            ("new york", "New York", "纽约"),
            ("las vegas", "Las Vegas", "拉斯维加斯"),
        ],
        "2" => &[
            ("london", "London", "伦敦"),
            ("cambridge", "Cambridge", "剑桥"),
            ("manchester", "Manchester", "曼彻斯特"),
            ("liverpool", "Liverpool", "利物浦"),
        ],
        "3" => &[
            ("vancouver", "Vancouver", "温哥华"),
            ("toronto", "Toronto", "多伦多"),
        ],
        _ => &[
            ("beijing", "Beijing", "北京"),
            ("shangHai", "Shanghai", "上海"),
            ("guangZhou", "Guangzhou", "广州"),
            ("shenZhen", "Shenzhen", "深圳"),
        ],
    };
    pairs
        .iter()
        .map(|(id, en, cn)| FieldOption::new(*id, lang.pick(en, cn)))
        .collect()
}
