//! HTTP handlers for the admin panel.
//!
//! Every `/info/{table}` route resolves the table through the [`Registry`]
//! with a context built from the request, so labels follow the request
//! language. Responses are JSON view models.

use crate::config::Config;
use crate::database::RelationalStore;
use crate::error::{ApiError, FormError, RegistryError};
use crate::forms::{self, FormSchema};
use crate::pages;
use crate::provider::RowProvider;
use crate::registry::Registry;
use crate::table::{
    ActionResponse, ActionSpec, Capabilities, ColumnSpec, FieldOption, FormMode, Language,
    RequestContext, Row, TableDescriptor, Value,
};
use axum::{
    Json, Router,
    extract::{Extension, FromRequestParts, OriginalUri, Path, Query, State},
    http::{StatusCode, header::ACCEPT_LANGUAGE, request::Parts},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::sync::Arc;

/// Header naming the acting admin user.
pub const USER_HEADER: &str = "x-admin-user";
/// Query parameter overriding `Accept-Language`.
pub const LANG_PARAM: &str = "lang";

#[derive(Clone)]
pub struct AppState<S> {
    pub registry: Arc<Registry>,
    pub provider: RowProvider<S>,
}

impl<S: RelationalStore> AppState<S> {
    pub fn new(registry: Registry, provider: RowProvider<S>) -> Self {
        Self {
            registry: Arc::new(registry),
            provider,
        }
    }
}

/// Request context extracted from the URI and headers.
///
/// The language comes from the `lang` query parameter, then `Accept-Language`,
/// then defaults to English.
pub struct AdminContext(pub RequestContext);

impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let params = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(params)| params)
            .unwrap_or_default();

        let language = params
            .get(LANG_PARAM)
            .and_then(|tag| Language::from_tag(tag))
            .or_else(|| {
                parts
                    .headers
                    .get(ACCEPT_LANGUAGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(Language::from_tag)
            })
            .unwrap_or_default();

        // Nested routers see the URI without the prefix
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(parts.uri.path(), |OriginalUri(uri)| uri.path());

        let mut ctx = RequestContext::new(path)
            .with_params(params)
            .with_language(language);
        if let Some(user) = parts.headers.get(USER_HEADER).and_then(|v| v.to_str().ok()) {
            ctx = ctx.with_user(user);
        }
        Ok(Self(ctx))
    }
}

pub fn routes<S: RelationalStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(dashboard::<S>))
        .route("/form", get(form_page))
        .route("/table", get(table_page::<S>))
        .route("/table/action/{id}", post(table_page_action))
        .route("/menu", get(menu::<S>))
        .route("/info/{table}", get(list::<S>))
        .route("/info/{table}/detail", get(detail::<S>))
        .route("/info/{table}/form", get(form::<S>))
        .route("/info/{table}/new", post(create::<S>))
        .route("/info/{table}/edit", post(update::<S>))
        .route("/info/{table}/delete", post(delete::<S>))
        .route("/info/{table}/options/{field}", get(options::<S>))
        .route("/info/{table}/action/{id}", post(action::<S>))
}

/// One page of a table as the list view renders it.
#[derive(Debug, Serialize)]
pub struct ListView<'a> {
    pub table: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub primary_key: &'a str,
    pub capabilities: Capabilities,
    pub columns: &'a [ColumnSpec],
    pub actions: &'a [ActionSpec],
    pub rows: Vec<Row>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub page_count: u64,
}

#[derive(Debug, Serialize)]
pub struct DetailView<'a> {
    pub table: &'a str,
    pub title: &'a str,
    pub primary_key: &'a str,
    pub columns: &'a [ColumnSpec],
    pub row: Row,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WriteResponse {
    pub table: String,
    pub id: Value,
    pub affected: u64,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub field: String,
    pub options: Vec<FieldOption>,
}

#[derive(Debug, Serialize)]
pub struct MenuItem {
    pub name: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PkQuery {
    pub pk: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OptionsQuery {
    #[serde(default)]
    pub value: String,
}

async fn dashboard<S: RelationalStore>(
    State(state): State<AppState<S>>,
    AdminContext(ctx): AdminContext,
) -> impl IntoResponse {
    Json(pages::dashboard(state.provider.store(), &ctx).await)
}

async fn form_page(
    Extension(config): Extension<Config>,
    AdminContext(ctx): AdminContext,
) -> impl IntoResponse {
    Json(pages::form_page(&ctx, config.url_prefix()))
}

async fn table_page<S: RelationalStore>(
    State(state): State<AppState<S>>,
    AdminContext(ctx): AdminContext,
) -> Result<impl IntoResponse, ApiError> {
    let descriptor = demo_table(&ctx)?;
    Ok(Json(list_view(&state.provider, &descriptor, &ctx).await).into_response())
}

async fn table_page_action(
    AdminContext(ctx): AdminContext,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    let descriptor = demo_table(&ctx)?;
    invoke(&descriptor, &id, &ctx).map(Json)
}

fn demo_table(ctx: &RequestContext) -> Result<TableDescriptor, ApiError> {
    pages::table_page(ctx).map_err(|source| {
        ApiError::Registry(RegistryError::MalformedDescriptor {
            table: "table".to_owned(),
            source,
        })
    })
}

async fn menu<S: RelationalStore>(
    State(state): State<AppState<S>>,
    Extension(config): Extension<Config>,
    AdminContext(ctx): AdminContext,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
    let mut items = Vec::with_capacity(state.registry.len());
    for name in state.registry.names() {
        let descriptor = state.registry.resolve(name, &ctx)?;
        items.push(MenuItem {
            name: name.to_owned(),
            title: descriptor.title().to_owned(),
            url: format!("/{}/info/{name}", config.url_prefix()),
        });
    }
    Ok(Json(items))
}

#[tracing::instrument(skip_all, fields(table = %table))]
async fn list<S: RelationalStore>(
    State(state): State<AppState<S>>,
    AdminContext(ctx): AdminContext,
    Path(table): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let descriptor = state.registry.resolve(&table, &ctx)?;
    Ok(Json(list_view(&state.provider, &descriptor, &ctx).await).into_response())
}

async fn list_view<'a, S: RelationalStore>(
    provider: &RowProvider<S>,
    descriptor: &'a TableDescriptor,
    ctx: &RequestContext,
) -> ListView<'a> {
    let request = descriptor.page_request(ctx.params());
    let page = provider.list(descriptor, &request).await;
    tracing::debug!(
        table = descriptor.name(),
        rows = page.rows.len(),
        total = page.total,
        "Served list page"
    );

    ListView {
        table: descriptor.name(),
        title: descriptor.title(),
        description: descriptor.description(),
        primary_key: &descriptor.primary_key().name,
        capabilities: descriptor.capabilities(),
        columns: descriptor.columns(),
        actions: descriptor.actions(),
        page_count: page.page_count(request.page_size),
        total: page.total,
        rows: page.rows,
        page: request.page,
        page_size: request.page_size,
    }
}

async fn detail<S: RelationalStore>(
    State(state): State<AppState<S>>,
    AdminContext(ctx): AdminContext,
    Path(table): Path<String>,
    Query(query): Query<PkQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let descriptor = state.registry.resolve(&table, &ctx)?;
    let pk = query
        .pk
        .filter(|pk| !pk.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing `pk` parameter".to_owned()))?;
    let row = state
        .provider
        .detail(&descriptor, &pk)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no row `{pk}` in `{table}`")))?;

    Ok(Json(DetailView {
        table: descriptor.name(),
        title: descriptor.title(),
        primary_key: &descriptor.primary_key().name,
        columns: descriptor.columns(),
        row,
    })
    .into_response())
}

async fn form<S: RelationalStore>(
    State(state): State<AppState<S>>,
    AdminContext(ctx): AdminContext,
    Path(table): Path<String>,
    Query(query): Query<PkQuery>,
) -> Result<Json<FormSchema>, ApiError> {
    let descriptor = state.registry.resolve(&table, &ctx)?;
    let schema = match query.pk.filter(|pk| !pk.is_empty()) {
        Some(pk) => {
            let current = state
                .provider
                .raw_detail(&descriptor, &pk)
                .await
                .ok_or_else(|| ApiError::NotFound(format!("no row `{pk}` in `{table}`")))?;
            forms::schema(&descriptor, FormMode::Edit, Some(&current))
        }
        None => forms::schema(&descriptor, FormMode::Add, None),
    };
    Ok(Json(schema))
}

/// Table the write endpoints target; tables served from custom sources are read-only.
fn writable_table(descriptor: &TableDescriptor) -> Result<&str, ApiError> {
    descriptor.data_source().table().ok_or_else(|| {
        ApiError::BadRequest(format!(
            "`{}` is not backed by a relational table",
            descriptor.name()
        ))
    })
}

fn require(allowed: bool, descriptor: &TableDescriptor, operation: &str) -> Result<(), ApiError> {
    if allowed {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "`{}` does not allow {operation}",
            descriptor.name()
        )))
    }
}

#[tracing::instrument(skip_all, fields(table = %table, user = ctx.user()))]
async fn create<S: RelationalStore>(
    State(state): State<AppState<S>>,
    AdminContext(ctx): AdminContext,
    Path(table): Path<String>,
    Json(input): Json<BTreeMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let descriptor = state.registry.resolve(&table, &ctx)?;
    require(descriptor.capabilities().can_add, &descriptor, "adding rows")?;
    let target = writable_table(&descriptor)?;

    let submission = forms::process(&descriptor, FormMode::Add, &input)?;
    let id = state
        .provider
        .store()
        .insert(target, &descriptor.primary_key().name, &submission.values)
        .await?;
    descriptor.run_post_hook(&submission.values);
    tracing::info!(id = %id, "Row created");

    Ok((
        StatusCode::CREATED,
        Json(WriteResponse {
            table,
            id,
            affected: 1,
        }),
    ))
}

#[tracing::instrument(skip_all, fields(table = %table, user = ctx.user()))]
async fn update<S: RelationalStore>(
    State(state): State<AppState<S>>,
    AdminContext(ctx): AdminContext,
    Path(table): Path<String>,
    Json(input): Json<BTreeMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let descriptor = state.registry.resolve(&table, &ctx)?;
    require(descriptor.capabilities().editable, &descriptor, "editing rows")?;
    let target = writable_table(&descriptor)?;

    let submission = forms::process(&descriptor, FormMode::Edit, &input)?;
    let id = submission
        .primary_key
        .ok_or_else(|| FormError::MissingPrimaryKey(descriptor.primary_key().name.clone()))?;

    let affected = if submission.values.is_empty() {
        0
    } else {
        state
            .provider
            .store()
            .update(target, &descriptor.primary_key().name, &id, &submission.values)
            .await?
    };
    if affected == 0 && !submission.values.is_empty() {
        return Err(ApiError::NotFound(format!("no row `{id}` in `{table}`")));
    }
    descriptor.run_post_hook(&submission.values);
    tracing::info!(id = %id, affected, "Row updated");

    Ok(Json(WriteResponse {
        table,
        id,
        affected,
    }))
}

#[tracing::instrument(skip_all, fields(table = %table, user = ctx.user()))]
async fn delete<S: RelationalStore>(
    State(state): State<AppState<S>>,
    AdminContext(ctx): AdminContext,
    Path(table): Path<String>,
    Json(request): Json<DeleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let descriptor = state.registry.resolve(&table, &ctx)?;
    require(descriptor.capabilities().deletable, &descriptor, "deleting rows")?;
    let target = writable_table(&descriptor)?;

    let primary_key = descriptor.primary_key();
    let ids = request
        .ids
        .iter()
        .map(|raw| {
            primary_key
                .data_type
                .coerce(raw)
                .map_err(|reason| FormError::InvalidValue {
                    field: primary_key.name.clone(),
                    reason,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err(ApiError::BadRequest("no ids to delete".to_owned()));
    }

    let affected = state
        .provider
        .store()
        .delete(target, &primary_key.name, &ids)
        .await?;
    tracing::info!(requested = ids.len(), affected, "Rows deleted");

    Ok(Json(WriteResponse {
        table,
        id: Value::from(request.ids.join(",")),
        affected,
    }))
}

async fn options<S: RelationalStore>(
    State(state): State<AppState<S>>,
    AdminContext(ctx): AdminContext,
    Path((table, field)): Path<(String, String)>,
    Query(query): Query<OptionsQuery>,
) -> Result<Json<OptionsResponse>, ApiError> {
    let descriptor = state.registry.resolve(&table, &ctx)?;
    let (field, options) = forms::dynamic_options(&descriptor, &field, &query.value)?;
    Ok(Json(OptionsResponse { field, options }))
}

#[tracing::instrument(skip_all, fields(table = %table, action = %id, user = ctx.user()))]
async fn action<S: RelationalStore>(
    State(state): State<AppState<S>>,
    AdminContext(ctx): AdminContext,
    Path((table, id)): Path<(String, String)>,
) -> Result<Json<ActionResponse>, ApiError> {
    let descriptor = state.registry.resolve(&table, &ctx)?;
    invoke(&descriptor, &id, &ctx).map(Json)
}

fn invoke(
    descriptor: &TableDescriptor,
    id: &str,
    ctx: &RequestContext,
) -> Result<ActionResponse, ApiError> {
    let action = descriptor
        .action(id)
        .ok_or_else(|| ApiError::NotFound(format!("no action `{id}` on `{}`", descriptor.name())))?;
    action.invoke(ctx).ok_or_else(|| {
        ApiError::BadRequest(format!("action `{id}` has no server-side handler"))
    })
}
