//! DynamoScanStore - RecordStore over the DynamoDB Scan API
//!
//! Requests go through `aws-sdk-dynamodb`, so they are signed with the
//! credentials of the shared AWS configuration.

use std::collections::HashMap;

use aws_config::SdkConfig;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use contracts::{
    ContinuationToken, ContractError, DirectoryConfig, Record, RecordStore, ScanPage, ScanQuery,
};
use serde_json::{Map, Number, Value};
use tracing::{debug, instrument};

/// Expression parts of one scan request
#[derive(Debug, Default, PartialEq)]
struct ScanExpressions {
    filter: Option<String>,
    projection: Option<String>,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

/// Record store backed by DynamoDB
#[derive(Debug, Clone)]
pub struct DynamoScanStore {
    client: Client,
}

impl DynamoScanStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client for `config.region`, sent to `config.endpoint` when set
    pub fn from_sdk_config(sdk: &SdkConfig, config: &DirectoryConfig) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk)
            .region(Region::new(config.region.clone()));
        builder.set_endpoint_url(config.endpoint.clone());
        let dynamo = builder.build();
        Self::new(Client::from_conf(dynamo))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl RecordStore for DynamoScanStore {
    #[instrument(
        name = "dynamo_scan_page",
        skip(self, query, start),
        fields(table = %query.table, resumed = start.is_some())
    )]
    async fn scan_page(
        &self,
        query: &ScanQuery,
        start: Option<&ContinuationToken>,
    ) -> Result<ScanPage, ContractError> {
        let expressions = build_expressions(query);
        let start_key = start
            .map(|token| token_to_key(&query.table, token))
            .transpose()?;
        let limit = query
            .limit
            .map(|limit| i32::try_from(limit).unwrap_or(i32::MAX));

        let output = self
            .client
            .scan()
            .table_name(&query.table)
            .set_filter_expression(expressions.filter)
            .set_projection_expression(expressions.projection)
            .set_expression_attribute_names(non_empty(expressions.names))
            .set_expression_attribute_values(non_empty(expressions.values))
            .set_exclusive_start_key(start_key)
            .set_limit(limit)
            .send()
            .await
            .map_err(|e| {
                ContractError::directory_page(&query.table, DisplayErrorContext(&e).to_string())
            })?;

        let records = output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(item_to_record)
            .collect::<Vec<Record>>();

        // An empty key is treated the same as no key
        let continuation = output
            .last_evaluated_key
            .filter(|key| !key.is_empty())
            .map(key_to_token);

        debug!(
            records = records.len(),
            more = continuation.is_some(),
            "Scan page decoded"
        );

        Ok(ScanPage {
            records,
            continuation,
        })
    }
}

fn non_empty<K, V>(map: HashMap<K, V>) -> Option<HashMap<K, V>> {
    (!map.is_empty()).then_some(map)
}

/// Placeholder-based filter and projection expressions for `query`
fn build_expressions(query: &ScanQuery) -> ScanExpressions {
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    let filter: Vec<String> = query
        .filter
        .iter()
        .enumerate()
        .map(|(i, condition)| {
            names.insert(format!("#f{i}"), condition.attribute.clone());
            values.insert(format!(":f{i}"), to_attribute(&condition.value));
            format!("#f{i} = :f{i}")
        })
        .collect();

    let projection: Vec<String> = query
        .projection
        .iter()
        .enumerate()
        .map(|(i, attribute)| {
            names.insert(format!("#p{i}"), attribute.clone());
            format!("#p{i}")
        })
        .collect();

    ScanExpressions {
        filter: (!filter.is_empty()).then(|| filter.join(" AND ")),
        projection: (!projection.is_empty()).then(|| projection.join(", ")),
        names,
        values,
    }
}

/// Key attributes are strings or numbers, so the plain form converts back losslessly
fn key_to_token(key: HashMap<String, AttributeValue>) -> ContinuationToken {
    ContinuationToken(Value::Object(item_to_record(key)))
}

fn token_to_key(
    table: &str,
    token: &ContinuationToken,
) -> Result<HashMap<String, AttributeValue>, ContractError> {
    let Value::Object(fields) = &token.0 else {
        return Err(ContractError::expression(
            table,
            format!("continuation token is not a key object: {}", token.0),
        ));
    };
    Ok(fields
        .iter()
        .map(|(k, v)| (k.clone(), to_attribute(v)))
        .collect())
}

/// Plain JSON value -> attribute value
fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attribute(v)))
                .collect(),
        ),
    }
}

/// Attribute value -> plain JSON value
///
/// Binary attributes do not occur in the directory tables and map to null.
fn from_attribute(value: AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::N(n) => number(n),
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::Array(items.into_iter().map(from_attribute).collect()),
        AttributeValue::M(fields) => Value::Object(item_to_record(fields)),
        AttributeValue::Ss(items) => Value::Array(items.into_iter().map(Value::String).collect()),
        AttributeValue::Ns(items) => Value::Array(items.into_iter().map(number).collect()),
        _ => Value::Null,
    }
}

fn number(n: String) -> Value {
    parse_number(&n).map_or(Value::String(n), Value::Number)
}

fn parse_number(n: &str) -> Option<Number> {
    if let Ok(i) = n.parse::<i64>() {
        return Some(Number::from(i));
    }
    n.parse::<f64>().ok().and_then(Number::from_f64)
}

fn item_to_record(item: HashMap<String, AttributeValue>) -> Record {
    item.into_iter()
        .map(|(k, v)| (k, from_attribute(v)))
        .collect::<Map<String, Value>>()
}
