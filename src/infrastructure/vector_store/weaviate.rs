use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::domain::{
    ports::{FieldSelection, SimilarityRequest, VectorStoreClient},
    CollectionDescriptor, DomainError, RawHit, StoreSchema,
};
use crate::infrastructure::config::WeaviateConfig;

/// Client for a store that exposes its schema over REST and answers
/// `nearText` concept queries over GraphQL.
pub struct WeaviateStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    closed: AtomicBool,
}

impl WeaviateStore {
    pub fn new(config: &WeaviateConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| DomainError::config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DomainError::unavailable("store client is closed"));
        }
        Ok(())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn fetch_json(&self, request: reqwest::RequestBuilder) -> Result<Value, DomainError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| DomainError::unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DomainError::internal_store(format!("response is not JSON: {e}")))
    }
}

#[async_trait]
impl VectorStoreClient for WeaviateStore {
    async fn get_schema(&self) -> Result<StoreSchema, DomainError> {
        self.ensure_open()?;
        let url = format!("{}/v1/schema", self.base_url);
        let body = self.fetch_json(self.client.get(url)).await?;
        parse_schema(&body)
    }

    async fn query_similar(
        &self,
        request: SimilarityRequest<'_>,
    ) -> Result<Vec<RawHit>, DomainError> {
        self.ensure_open()?;
        let query = build_near_text_query(&request)?;
        let url = format!("{}/v1/graphql", self.base_url);
        let body = self
            .fetch_json(self.client.post(url).json(&json!({ "query": query })))
            .await?;
        parse_hits(&body, request.collection, request.fields)
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!(url = %self.base_url, "vector store client closed");
        }
    }
}

fn classify_status(status: StatusCode) -> DomainError {
    if status.is_server_error()
        || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        DomainError::unavailable(format!("store responded with {status}"))
    } else {
        DomainError::internal_store(format!("store rejected request with {status}"))
    }
}

fn is_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn build_near_text_query(request: &SimilarityRequest<'_>) -> Result<String, DomainError> {
    for name in std::iter::once(request.collection).chain(request.fields.properties()) {
        if !is_graphql_name(name) {
            return Err(DomainError::internal_store(format!(
                "`{name}` is not a valid GraphQL name"
            )));
        }
    }

    let concept = serde_json::to_string(request.concept)
        .map_err(|e| DomainError::internal_store(e.to_string()))?;

    let mut additional = Vec::new();
    if request.fields.with_id {
        additional.push("id");
    }
    if request.fields.with_distance {
        additional.push("distance");
    }
    let additional = if additional.is_empty() {
        String::new()
    } else {
        format!(" _additional {{ {} }}", additional.join(" "))
    };

    Ok(format!(
        "{{ Get {{ {collection}(nearText: {{ concepts: [{concept}] }}, limit: {limit}) {{ {title} {body}{additional} }} }} }}",
        collection = request.collection,
        limit = request.limit,
        title = request.fields.title,
        body = request.fields.body,
    ))
}

/// Parses `{"classes": [{"class": "Name", ...}, ...]}`. A `null` class list
/// is an empty schema; anything else that is not an array of named classes
/// is rejected.
fn parse_schema(body: &Value) -> Result<StoreSchema, DomainError> {
    let classes = match body.get("classes") {
        Some(Value::Array(classes)) => classes,
        Some(Value::Null) => return Ok(StoreSchema::default()),
        Some(_) => return Err(DomainError::internal_store("schema `classes` is not an array")),
        None => return Err(DomainError::internal_store("schema is missing `classes`")),
    };

    let collections = classes
        .iter()
        .map(|class| match class.get("class") {
            Some(Value::String(name)) => Ok(CollectionDescriptor { name: name.clone() }),
            _ => Err(DomainError::internal_store("schema class is missing a `class` name")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StoreSchema { collections })
}

fn parse_hits(
    body: &Value,
    collection: &str,
    fields: &FieldSelection,
) -> Result<Vec<RawHit>, DomainError> {
    let objects = body
        .get("data")
        .and_then(|data| data.get("Get"))
        .and_then(|get| get.get(collection));

    let objects = match objects {
        Some(Value::Array(objects)) => objects,
        Some(Value::Null) | None => {
            let detail = body
                .get("errors")
                .and_then(|errors| errors.as_array())
                .and_then(|errors| errors.first())
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("response has no result list");
            return Err(DomainError::internal_store(format!("{collection}: {detail}")));
        }
        Some(_) => {
            return Err(DomainError::internal_store(format!(
                "{collection}: result list is not an array"
            )))
        }
    };

    objects.iter().map(|object| parse_hit(object, fields)).collect()
}

fn parse_hit(object: &Value, fields: &FieldSelection) -> Result<RawHit, DomainError> {
    if !object.is_object() {
        return Err(DomainError::internal_store("result entry is not an object"));
    }
    let additional = object.get("_additional");

    Ok(RawHit {
        id: optional_str(additional.and_then(|a| a.get("id")), "id")?,
        title: optional_str(object.get(&fields.title), &fields.title)?,
        body: optional_str(object.get(&fields.body), &fields.body)?,
        distance: optional_f64(additional.and_then(|a| a.get("distance")))?,
    })
}

fn optional_str(value: Option<&Value>, field: &str) -> Result<Option<String>, DomainError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DomainError::internal_store(format!(
            "field `{field}` is not a string"
        ))),
    }
}

fn optional_f64(value: Option<&Value>) -> Result<Option<f64>, DomainError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(_) => Err(DomainError::internal_store("`distance` is not a number")),
    }
}
