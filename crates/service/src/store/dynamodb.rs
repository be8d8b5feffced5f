use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::{error::DisplayErrorContext, types::AttributeValue, Client};
use configs::StoreConfig;
use models::{item::ID_FIELD, Item};
use tracing::debug;

use super::attribute::{item_from_attributes, item_to_attributes, to_attribute};
use super::{ItemBackend, UpdateExpression};
use crate::errors::ServiceError;

/// Name placeholder for the key attribute in condition expressions.
const KEY_PLACEHOLDER: &str = "#pk";

/// DynamoDB table with a single string partition key `id`.
///
/// The SDK client is created once and shared by every request.
#[derive(Clone)]
pub struct DynamoBackend {
    client: Client,
    table_name: String,
}

impl DynamoBackend {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self { client, table_name: table_name.into() }
    }

    /// Resolve credentials through the default provider chain and point the
    /// client at `cfg.region` (or `cfg.endpoint_url` when set).
    pub async fn from_config(cfg: &StoreConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(url) = &cfg.endpoint_url {
            builder = builder.endpoint_url(url);
        }
        Self::new(Client::from_conf(builder.build()), cfg.table_name.clone())
    }

    fn key(id: &str) -> AttributeValue {
        AttributeValue::S(id.to_string())
    }
}

fn sdk_error<E: std::error::Error>(err: E) -> ServiceError {
    ServiceError::Backend(DisplayErrorContext(&err).to_string())
}

#[async_trait]
impl ItemBackend for DynamoBackend {
    async fn get_item(&self, id: &str) -> Result<Option<Item>, ServiceError> {
        let out = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(ID_FIELD, Self::key(id))
            .send()
            .await
            .map_err(sdk_error)?;
        out.item().map(item_from_attributes).transpose()
    }

    async fn scan(&self) -> Result<Vec<Item>, ServiceError> {
        let mut items = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        let mut pages = 0usize;
        loop {
            let out = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(sdk_error)?;
            pages += 1;
            for attrs in out.items() {
                items.push(item_from_attributes(attrs)?);
            }
            match out.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }
        debug!(table = %self.table_name, pages, count = items.len(), "scan complete");
        Ok(items)
    }

    async fn put_item(&self, item: Item) -> Result<(), ServiceError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_to_attributes(item)))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn update_item(&self, id: &str, expr: &UpdateExpression) -> Result<bool, ServiceError> {
        let mut names = expr.names();
        names.insert(KEY_PLACEHOLDER.to_string(), ID_FIELD.to_string());
        let values: HashMap<String, AttributeValue> =
            expr.values().map(|(k, v)| (k.to_string(), to_attribute(v))).collect();

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(ID_FIELD, Self::key(id))
            .update_expression(expr.expression())
            .condition_expression(format!("attribute_exists({KEY_PLACEHOLDER})"))
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                debug!(%id, "conditional update rejected: no such id");
                Ok(false)
            }
            Err(err) => Err(sdk_error(err)),
        }
    }

    async fn delete_item(&self, id: &str) -> Result<(), ServiceError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(ID_FIELD, Self::key(id))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}
