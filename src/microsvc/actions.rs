//! Action handlers: one per CRUD operation.
//!
//! Input fields: `entity`, `entities`, `id`, `ids`, `query`, `options`.
//! Results are the adapter's return values serialized to JSON.

use serde::Serialize;
use serde_json::Value;

use super::context::Context;
use super::error::HandlerError;
use crate::adapter::Operation;
use crate::driver::DocumentClient;
use crate::options::{
    BulkRemoveOptions, FindOptions, InsertOptions, ReadOptions, RemoveOptions, UpdateOptions,
};

/// Run the handler for the context's operation.
pub(crate) async fn run<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    match ctx.operation() {
        Operation::Insert => insert(ctx).await,
        Operation::InsertMany => insert_many(ctx).await,
        Operation::FindById => find_by_id(ctx).await,
        Operation::FindByIds => find_by_ids(ctx).await,
        Operation::Find => find(ctx).await,
        Operation::FindOne => find_one(ctx).await,
        Operation::Count => count(ctx).await,
        Operation::UpdateById => update_by_id(ctx).await,
        Operation::UpdateMany => update_many(ctx).await,
        Operation::RemoveById => remove_by_id(ctx).await,
        Operation::RemoveMany => remove_many(ctx).await,
        Operation::Clear => clear(ctx).await,
        Operation::Connect | Operation::Disconnect => {
            Err(HandlerError::UnknownCommand(ctx.command_name().to_string()))
        }
    }
}

fn reply<T: Serialize>(value: T) -> Result<Value, HandlerError> {
    Ok(serde_json::to_value(value)?)
}

async fn insert<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    let entity: Value = ctx.field("entity")?;
    let options = ctx.options::<InsertOptions>()?;
    reply(ctx.adapter().insert(&entity, &options).await?)
}

async fn insert_many<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    let entities: Vec<Value> = ctx.field("entities")?;
    let options = ctx.options::<InsertOptions>()?;
    reply(ctx.adapter().insert_many(&entities, &options).await?)
}

async fn find_by_id<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    let id: String = ctx.field("id")?;
    let options = ctx.options::<ReadOptions>()?;
    reply(ctx.adapter().find_by_id(&id, &options).await?)
}

async fn find_by_ids<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    let ids: Vec<String> = ctx.field("ids")?;
    let options = ctx.options::<ReadOptions>()?;
    reply(ctx.adapter().find_by_ids(&ids, &options).await?)
}

async fn find<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    let predicate = ctx.predicate()?;
    let options = ctx.options::<FindOptions>()?;
    reply(ctx.adapter().find(&predicate, &options).await?)
}

async fn find_one<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    let predicate = ctx.predicate()?;
    let options = ctx.options::<ReadOptions>()?;
    reply(ctx.adapter().find_one(&predicate, &options).await?)
}

async fn count<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    let predicate = ctx.predicate()?;
    let options = ctx.options::<ReadOptions>()?;
    reply(ctx.adapter().count(&predicate, &options).await?)
}

async fn update_by_id<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    let id: String = ctx.field("id")?;
    let entity: Value = ctx.field("entity")?;
    let options = ctx.options::<UpdateOptions>()?;
    reply(ctx.adapter().update_by_id(&id, &entity, &options).await?)
}

async fn update_many<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    let entities = match ctx.field::<Value>("entities")? {
        Value::Array(items) => items,
        single @ Value::Object(_) => vec![single],
        other => {
            return Err(HandlerError::DecodeFailed(format!(
                "entities: expected an object or an array, got {}",
                other
            )))
        }
    };
    let options = ctx.options::<UpdateOptions>()?;
    reply(ctx.adapter().update_many(&entities, &options).await?)
}

async fn remove_by_id<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    let id: String = ctx.field("id")?;
    let options = ctx.options::<RemoveOptions>()?;
    reply(ctx.adapter().remove_by_id(&id, &options).await?)
}

// An absent query here would empty the collection; `clear` is the explicit way.
async fn remove_many<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    if !ctx.has_field("query") {
        return Err(HandlerError::MissingInput("query".into()));
    }
    let predicate = ctx.predicate()?;
    let options = ctx.options::<BulkRemoveOptions>()?;
    reply(ctx.adapter().remove_many(&predicate, &options).await?)
}

async fn clear<C: DocumentClient>(ctx: &Context<'_, C>) -> Result<Value, HandlerError> {
    let options = ctx.options::<BulkRemoveOptions>()?;
    reply(ctx.adapter().clear(&options).await?)
}
