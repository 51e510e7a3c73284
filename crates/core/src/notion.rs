//! Notion API client and the JSON shapes it expects.
//!
//! Only the pieces needed to file a video summary are covered: creating a page
//! in a database, appending children past the per-request limit, and two
//! read-only calls used to discover a database and its schema.

use chrono::{DateTime, Local};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::{
    blocks::{Block, BlockKind},
    config::Config,
    error::Result,
};

pub const NOTION_VERSION: &str = "2022-06-28";
/// Longest `text.content` Notion accepts in a single rich-text object,
/// counted in UTF-16 code units.
pub const MAX_TEXT_LEN: usize = 2000;
/// Most children Notion accepts in one create or append call.
pub const MAX_CHILDREN_PER_REQUEST: usize = 100;

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("Notion API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Notion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected Notion response: {0}")]
    InvalidResponse(String),

    /// The page exists but some of its children could not be appended.
    #[error("Notion page {} was created but is incomplete: {source}", .page.id)]
    Incomplete {
        page: NotionPage,
        source: Box<NotionError>,
    },
}

pub type NotionResult<T> = std::result::Result<T, NotionError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotionPage {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSummary {
    pub id: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseProperty {
    pub name: String,
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSchema {
    pub title: String,
    pub properties: Vec<DatabaseProperty>,
}

/// A page to create in a database: the four properties the summary database
/// carries, plus its content.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub title: String,
    pub category: String,
    pub author: String,
    pub created_at: DateTime<Local>,
    pub children: Vec<Block>,
}

/// Anything that can file a page. `NotionClient` in production.
pub trait PageStore {
    async fn create_page(
        &self,
        database_id: &str,
        page: &PageRequest,
    ) -> NotionResult<NotionPage>;
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

fn block_type(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Heading => "heading_2",
        BlockKind::Paragraph => "paragraph",
        BlockKind::NumberedItem => "numbered_list_item",
        BlockKind::BulletedItem => "bulleted_list_item",
    }
}

/// Split `text` into pieces of at most `max` UTF-16 code units, the unit
/// Notion measures text length in. Pieces always end on a char boundary.
pub fn split_text(text: &str, max: usize) -> Vec<&str> {
    if text.is_empty() || max == 0 {
        return vec![text];
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    let mut units = 0;
    for (i, c) in text.char_indices() {
        let width = c.len_utf16();
        if units + width > max && i > start {
            pieces.push(&text[start..i]);
            start = i;
            units = 0;
        }
        units += width;
    }
    pieces.push(&text[start..]);
    pieces
}

/// Render blocks as Notion block objects. Text longer than
/// [`MAX_TEXT_LEN`] continues in consecutive blocks of the same type.
pub fn render_blocks(blocks: &[Block]) -> Vec<Value> {
    blocks
        .iter()
        .flat_map(|block| {
            let ty = block_type(block.kind);
            split_text(&block.text, MAX_TEXT_LEN)
                .into_iter()
                .map(move |piece| {
                    let mut obj = Map::new();
                    obj.insert("object".into(), json!("block"));
                    obj.insert("type".into(), json!(ty));
                    obj.insert(ty.into(), json!({ "rich_text": rich_text(piece) }));
                    Value::Object(obj)
                })
        })
        .collect()
}

/// Database properties for a summary page.
pub fn page_properties(
    title: &str,
    category: &str,
    author: &str,
    created_at: &DateTime<Local>,
) -> Value {
    json!({
        "Name": { "title": rich_text(title) },
        "Date": { "date": { "start": created_at.to_rfc3339() } },
        "Category": { "select": { "name": category } },
        "Author": { "rich_text": rich_text(author) },
    })
}

/// Body of `POST /pages`, plus the rendered children that did not fit in it.
pub fn create_page_body(database_id: &str, page: &PageRequest) -> (Value, Vec<Value>) {
    let mut children = render_blocks(&page.children);
    let overflow = children.split_off(children.len().min(MAX_CHILDREN_PER_REQUEST));

    let body = json!({
        "parent": { "database_id": database_id },
        "properties": page_properties(&page.title, &page.category, &page.author, &page.created_at),
        "children": children,
    });
    (body, overflow)
}

fn plain_title(value: &Value) -> String {
    value["title"][0]["plain_text"]
        .as_str()
        .unwrap_or("Untitled")
        .to_string()
}

fn string_field(value: &Value, field: &str) -> NotionResult<String> {
    value[field]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| NotionError::InvalidResponse(format!("missing `{field}`")))
}

pub fn parse_page(value: &Value) -> NotionResult<NotionPage> {
    Ok(NotionPage {
        id: string_field(value, "id")?,
        url: string_field(value, "url")?,
    })
}

/// Outcome of filing a page whose children overflowed into append calls.
/// A failed append still leaves a page behind, so it is reported with it.
pub fn finish_page(created: NotionPage, appended: NotionResult<()>) -> NotionResult<NotionPage> {
    match appended {
        Ok(()) => Ok(created),
        Err(e) => Err(NotionError::Incomplete {
            page: created,
            source: Box::new(e),
        }),
    }
}

/// Databases from a `POST /search` response.
pub fn parse_database_list(value: &Value) -> NotionResult<Vec<DatabaseSummary>> {
    let results = value["results"]
        .as_array()
        .ok_or_else(|| NotionError::InvalidResponse("missing `results`".into()))?;

    results
        .iter()
        .map(|db| {
            Ok(DatabaseSummary {
                id: string_field(db, "id")?,
                title: plain_title(db),
                url: string_field(db, "url")?,
            })
        })
        .collect()
}

/// Title and property schema from a `GET /databases/{id}` response, sorted
/// by property name.
pub fn parse_database_schema(value: &Value) -> NotionResult<DatabaseSchema> {
    let props = value["properties"]
        .as_object()
        .ok_or_else(|| NotionError::InvalidResponse("missing `properties`".into()))?;

    let mut properties = props
        .iter()
        .map(|(name, prop)| {
            Ok(DatabaseProperty {
                name: name.clone(),
                kind: string_field(prop, "type")?,
                id: string_field(prop, "id")?,
            })
        })
        .collect::<NotionResult<Vec<_>>>()?;
    properties.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(DatabaseSchema {
        title: plain_title(value),
        properties,
    })
}

#[derive(Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NotionClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &Config) -> Result<Self> {
        let api_key = config.notion_key()?;
        Ok(Self::new(http, config.notion_base_url.clone(), api_key))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send(&self, request: RequestBuilder) -> NotionResult<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            return Err(NotionError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }

    pub async fn append_children(
        &self,
        block_id: &str,
        children: &[Value],
    ) -> NotionResult<()> {
        for batch in children.chunks(MAX_CHILDREN_PER_REQUEST) {
            tracing::debug!(block_id, count = batch.len(), "appending Notion children");
            self.send(
                self.request(Method::PATCH, &format!("blocks/{block_id}/children"))
                    .json(&json!({ "children": batch })),
            )
            .await?;
        }
        Ok(())
    }

    pub async fn list_databases(&self) -> NotionResult<Vec<DatabaseSummary>> {
        let body = self
            .send(self.request(Method::POST, "search").json(&json!({
                "filter": { "property": "object", "value": "database" }
            })))
            .await?;
        parse_database_list(&body)
    }

    pub async fn database_properties(
        &self,
        database_id: &str,
    ) -> NotionResult<DatabaseSchema> {
        let body = self
            .send(self.request(Method::GET, &format!("databases/{database_id}")))
            .await?;
        parse_database_schema(&body)
    }
}

impl PageStore for NotionClient {
    async fn create_page(
        &self,
        database_id: &str,
        page: &PageRequest,
    ) -> NotionResult<NotionPage> {
        let (body, overflow) = create_page_body(database_id, page);
        tracing::debug!(database_id, title = %page.title, "creating Notion page");

        let created = parse_page(&self.send(self.request(Method::POST, "pages").json(&body)).await?)?;
        if overflow.is_empty() {
            return Ok(created);
        }
        let appended = self.append_children(&created.id, &overflow).await;
        finish_page(created, appended)
    }
}
