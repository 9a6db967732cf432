//! Custom admin pages: the dashboard and the static form and table demos.

use crate::database::RelationalStore;
use crate::error::{DataSourceError, DescriptorError};
use crate::forms::{FormFieldView, field_view};
use crate::table::{
    ActionKind, ActionResponse, ActionSpec, Capabilities, ColumnSpec, DataSource, DataType,
    FieldOption, FormFieldSpec, FormMode, FormTabs, PageData, PageRequest, RequestContext, Row,
    SortDirection, TableBuilder, TableDescriptor, Value, Widget, row_from,
};
use serde::Serialize;

const STATISTICS_TABLE: &str = "statistics";
const PRODUCT_IMAGE: &str = "//adminlte.io/themes/AdminLTE/dist/img/default-50x50.gif";

/// Counters shown in the dashboard info boxes. All zero when the store has none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub cpu: i64,
    pub likes: i64,
    pub sales: i64,
    pub new_members: i64,
}

impl Statistics {
    fn from_row(row: &Row) -> Self {
        let field = |name: &str| row.get(name).and_then(Value::as_i64).unwrap_or_default();
        Self {
            cpu: field("cpu"),
            likes: field("likes"),
            sales: field("sales"),
            new_members: field("new_members"),
        }
    }
}

/// First statistics row by id.
pub async fn first_statistics<S: RelationalStore>(store: &S) -> Statistics {
    let fields = ["id", "cpu", "likes", "sales", "new_members"].map(String::from);
    let request = PageRequest::single().sorted_by("id", SortDirection::Asc);
    match store.fetch_page(STATISTICS_TABLE, &fields, &request).await {
        Ok(page) => page
            .rows
            .first()
            .map(Statistics::from_row)
            .unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read dashboard statistics");
            Statistics::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoBox {
    pub label: String,
    pub value: i64,
    pub icon: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub order_id: &'static str,
    pub item: String,
    pub status: String,
    pub popularity: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub image: &'static str,
    pub title: &'static str,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// Progress towards one monthly goal.
#[derive(Debug, Clone, Serialize)]
pub struct Goal {
    pub title: String,
    pub done: u32,
    pub target: u32,
}

impl Goal {
    pub fn percent(&self) -> u32 {
        (self.done * 100).checked_div(self.target).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub statistics: Statistics,
    pub info_boxes: Vec<InfoBox>,
    pub latest_orders: Vec<Order>,
    pub products: Vec<Product>,
    pub sales: Chart,
    pub goals: Vec<Goal>,
}

pub async fn dashboard<S: RelationalStore>(store: &S, ctx: &RequestContext) -> Dashboard {
    let statistics = first_statistics(store).await;

    let info_boxes = vec![
        InfoBox {
            label: ctx.text("CPU Traffic", "CPU流量"),
            value: statistics.cpu,
            icon: "ion-ios-gear-outline",
            color: "aqua",
        },
        InfoBox {
            label: ctx.text("Likes", "点赞"),
            value: statistics.likes,
            icon: "google-plus",
            color: "red",
        },
        InfoBox {
            label: ctx.text("Sales", "销售额"),
            value: statistics.sales,
            icon: "ion-ios-cart-outline",
            color: "green",
        },
        InfoBox {
            label: ctx.text("New Members", "新会员"),
            value: statistics.new_members,
            icon: "ion-ios-people-outline",
            color: "yellow",
        },
    ];

    let order = || Order {
        order_id: "OR9842",
        item: ctx.text("Call of Duty IV", "使命召唤IV"),
        status: ctx.text("Shipped", "已发货"),
        popularity: "90%",
    };
    let product = || Product {
        image: PRODUCT_IMAGE,
        title: "Panel",
        label: ctx.text("free", "免费"),
        description: ctx.text(
            "A framework helps you build a data visualization system",
            "一个帮助您构建数据可视化系统的框架",
        ),
    };

    let months = [
        ("January", "一月"),
        ("February", "二月"),
        ("March", "三月"),
        ("April", "四月"),
        ("May", "五月"),
        ("June", "六月"),
        ("July", "七月"),
    ];
    let sales = Chart {
        title: ctx.text(
            "Sales: 1 Jan, 2019 - 30 Jul, 2019",
            "销售额: 2019年1月1日 - 2019年7月30日",
        ),
        labels: months.iter().map(|(en, cn)| ctx.text(en, cn)).collect(),
        datasets: vec![
            Dataset {
                label: ctx.text("Electronics", "电子产品"),
                data: vec![65.0, 59.0, 80.0, 81.0, 56.0, 55.0, 40.0],
            },
            Dataset {
                label: ctx.text("Digital Goods", "数字商品"),
                data: vec![28.0, 48.0, 40.0, 19.0, 86.0, 27.0, 90.0],
            },
        ],
    };

    let goal = |en: &str, cn: &str, done, target| Goal {
        title: ctx.text(en, cn),
        done,
        target,
    };
    let goals = vec![
        goal("Add Products to Cart", "添加商品到购物车", 160, 200),
        goal("Complete Purchase", "完成购买", 310, 400),
        goal("Visit Premium Page", "访问高级页面", 490, 800),
        goal("Send Inquiries", "发送咨询", 250, 500),
    ];

    Dashboard {
        title: ctx.text("Dashboard", "仪表盘"),
        statistics,
        info_boxes,
        latest_orders: (0..4).map(|_| order()).collect(),
        products: (0..4).map(|_| product()).collect(),
        sales,
        goals,
    }
}

/// The standalone form demo.
#[derive(Debug, Clone, Serialize)]
pub struct FormPage {
    pub title: String,
    pub description: String,
    pub url: String,
    pub fields: Vec<FormFieldView>,
    pub tabs: FormTabs,
}

pub fn form_page(ctx: &RequestContext, prefix: &str) -> FormPage {
    let text = |en: &str, cn: &str| ctx.text(en, cn);
    let options = |pairs: &[(&str, &str, &str)]| {
        pairs
            .iter()
            .map(|(value, en, cn)| FieldOption::new(*value, text(en, cn)))
            .collect::<Vec<_>>()
    };

    let fields = [
        FormFieldSpec::new(text("Name", "姓名"), "name", DataType::Varchar, Widget::Text),
        FormFieldSpec::new(text("Age", "年龄"), "age", DataType::Int, Widget::Number),
        FormFieldSpec::new(text("Homepage", "主页"), "homepage", DataType::Varchar, Widget::Url)
            .default_value("http://google.com"),
        FormFieldSpec::new(text("Email", "邮箱"), "email", DataType::Varchar, Widget::Email)
            .default_value("xxxx@xxx.com"),
        FormFieldSpec::new(text("Birthday", "生日"), "birthday", DataType::Varchar, Widget::Date)
            .default_value("2010-09-03"),
        FormFieldSpec::new(text("Time", "时间"), "time", DataType::Varchar, Widget::Datetime)
            .default_value("2010-09-05 18:09:05"),
        FormFieldSpec::new(
            text("Time Range", "时间范围"),
            "time_range",
            DataType::Varchar,
            Widget::DatetimeRange,
        ),
        FormFieldSpec::new(
            text("Password", "密码"),
            "password",
            DataType::Varchar,
            Widget::Password,
        ),
        FormFieldSpec::new("IP", "ip", DataType::Varchar, Widget::Ip),
        FormFieldSpec::new(
            text("Certificate", "证书"),
            "certificate",
            DataType::Varchar,
            Widget::Multifile,
        ),
        FormFieldSpec::new(text("Amount", "金额"), "currency", DataType::Int, Widget::Currency),
        FormFieldSpec::new(text("Rate", "评分"), "rate", DataType::Int, Widget::Rate),
        FormFieldSpec::new(text("Reward", "奖励"), "reward", DataType::Int, Widget::Slider),
        FormFieldSpec::new(text("Content", "内容"), "content", DataType::Text, Widget::RichText)
            .default_value("<h1>343434</h1><p>34344433434</p>")
            .enable_upload(),
        FormFieldSpec::new(text("Code", "代码"), "code", DataType::Text, Widget::Code)
            .default_value(
                "fn main() {\n    println!(\"hello panel!\");\n}\n",
            ),
        FormFieldSpec::new(text("Website", "网站"), "website", DataType::Tinyint, Widget::Switch)
            .help(text(
                "Will not be able to access when the site was off",
                "关闭后网站将无法访问，但管理系统仍可登录",
            ))
            .options(vec![FieldOption::new("0", ""), FieldOption::new("1", "")]),
        FormFieldSpec::new(text("Fruit", "水果"), "fruit", DataType::Varchar, Widget::SelectBox)
            .options(options(&[
                ("apple", "Apple", "苹果"),
                ("banana", "Banana", "香蕉"),
                ("watermelon", "Watermelon", "西瓜"),
                ("pear", "Pear", "梨"),
            ])),
        FormFieldSpec::new(text("Gender", "性别"), "gender", DataType::Tinyint, Widget::Radio)
            .options(options(&[("0", "Boy", "男"), ("1", "Girl", "女")])),
        FormFieldSpec::new(text("Drink", "饮料"), "drink", DataType::Varchar, Widget::Select)
            .options(options(&[
                ("beer", "Beer", "啤酒"),
                ("juice", "Juice", "果汁"),
                ("water", "Water", "水"),
                ("red bull", "Red Bull", "红牛"),
            ]))
            .default_value("beer"),
        FormFieldSpec::new(
            text("Work Experience", "工作经验"),
            "experience",
            DataType::Tinyint,
            Widget::SelectSingle,
        )
        .options(options(&[
            ("0", "two years", "两年"),
            ("1", "three years", "三年"),
            ("2", "four years", "四年"),
            ("3", "five years", "五年"),
        ])),
        FormFieldSpec::new(text("Snacks", "零食"), "snacks", DataType::Varchar, Widget::Checkbox)
            .options(options(&[
                ("0", "Oatmeal", "麦片"),
                ("1", "Potato chips", "薯片"),
                ("2", "Spicy strip", "辣条"),
                ("3", "Ice cream", "冰淇淋"),
            ])),
        FormFieldSpec::new(
            text("Province", "省份"),
            "province",
            DataType::Tinyint,
            Widget::SelectSingle,
        )
        .options(options(&[
            ("0", "Beijing", "北京"),
            ("1", "Shanghai", "上海"),
            ("2", "Guangdong", "广东"),
            ("3", "Chongqing", "重庆"),
        ])),
        FormFieldSpec::new(text("City", "城市"), "city", DataType::Tinyint, Widget::SelectSingle)
            .options(options(&[
                ("0", "Beijing", "北京"),
                ("1", "Shanghai", "上海"),
                ("2", "Guangzhou", "广州"),
                ("3", "Shenzhen", "深圳"),
            ])),
        FormFieldSpec::new(
            text("District", "区域"),
            "district",
            DataType::Tinyint,
            Widget::SelectSingle,
        )
        .options(options(&[
            ("0", "Chaoyang", "朝阳"),
            ("1", "Haizhu", "海珠"),
            ("2", "Pudong", "浦东"),
            ("3", "Baoan", "宝安"),
        ])),
    ];

    let tabs = FormTabs::new()
        .tab(
            text("input", "输入"),
            [
                "name",
                "age",
                "homepage",
                "email",
                "birthday",
                "time",
                "time_range",
                "password",
                "ip",
                "certificate",
                "currency",
                "rate",
                "reward",
                "content",
                "code",
            ],
        )
        .tab(
            text("select", "选择"),
            [
                "website",
                "snacks",
                "fruit",
                "gender",
                "drink",
                "province",
                "city",
                "district",
                "experience",
            ],
        );

    FormPage {
        title: text("Form", "表单"),
        description: text("form example", "表单示例"),
        url: format!("/{prefix}/form/update"),
        fields: fields
            .iter()
            .map(|spec| field_view(spec, FormMode::Add, None))
            .collect(),
        tabs,
    }
}

/// The static table demo, served through the regular list machinery.
pub fn table_page(ctx: &RequestContext) -> Result<TableDescriptor, DescriptorError> {
    TableBuilder::new("table")
        .title(ctx.text("Table", "表格"))
        .description(ctx.text("table example", "表格示例"))
        .primary_key("id", DataType::Int)
        .capabilities(Capabilities {
            can_add: false,
            editable: false,
            deletable: false,
            exportable: false,
        })
        .data_source(DataSource::custom(demo_rows))
        .column(ColumnSpec::new(ctx.text("ID", "编号"), "id", DataType::Int))
        .column(ColumnSpec::new(ctx.text("Name", "姓名"), "name", DataType::Varchar))
        .column(ColumnSpec::new(ctx.text("Gender", "性别"), "gender", DataType::Varchar))
        .column(ColumnSpec::new(ctx.text("Age", "年龄"), "age", DataType::Int))
        .action(
            ActionSpec::table(
                "ajax_id",
                ctx.text("Click me", "点击我"),
                ActionKind::ajax("/admin/table/action/ajax_id", |ctx| {
                    tracing::info!(id = ctx.param("id"), "Demo table button clicked");
                    ActionResponse::ok(ctx.text("Success", "操作成功"), Value::Null)
                }),
            )
            .icon("arrow-left"),
        )
        .build()
}

fn demo_rows(_: &PageRequest) -> Result<PageData, DataSourceError> {
    let rows = vec![
        row_from([
            ("id", Value::Int(0)),
            ("name", Value::from("Jack")),
            ("gender", Value::from("men")),
            ("age", Value::Int(20)),
        ]),
        row_from([
            ("id", Value::Int(1)),
            ("name", Value::from("Jane")),
            ("gender", Value::from("women")),
            ("age", Value::Int(23)),
        ]),
    ];
    Ok(PageData::new(rows, 50))
}
