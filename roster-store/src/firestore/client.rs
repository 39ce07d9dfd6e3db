use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::auth::TokenSource;
use super::value::{decode_fields, encode_fields};
use crate::error::{Result, StoreError};
use crate::record::{Fields, Record};
use crate::settings::{Endpoint, FirestoreSettings};
use crate::store::DocumentStore;

const GOOGLE_HOST: &str = "https://firestore.googleapis.com";

/// Documents requested per list page
const LIST_PAGE_SIZE: usize = 300;

/// Field names that can appear unquoted in an update mask
static SIMPLE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z_0-9]*$").expect("valid field regex"));

/// Document resource as returned by the REST API
#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

struct ClientInner {
    http: Client,
    tokens: TokenSource,
    /// `projects/{project}/databases/(default)`, the prefix of every document name
    database: String,
    documents_url: String,
}

/// Connection to one Firestore database
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<ClientInner>,
}

impl FirestoreClient {
    /// Build a client from settings. Fails early on an unparseable key.
    pub fn new(settings: FirestoreSettings) -> Result<Self> {
        let (host, tokens, http) = match settings.endpoint {
            Endpoint::Google(account) => (
                GOOGLE_HOST.to_string(),
                TokenSource::service_account(account)?,
                Client::builder(),
            ),
            // The emulator is local; never route it through HTTP(S)_PROXY
            Endpoint::Emulator { host } => (
                format!("http://{host}"),
                TokenSource::emulator(),
                Client::builder().no_proxy(),
            ),
        };

        Ok(Self {
            inner: Arc::new(ClientInner {
                http: http.build()?,
                tokens,
                database: database_name(&settings.project_id),
                documents_url: documents_url(&host, &settings.project_id),
            }),
        })
    }

    /// Handle scoped to a named collection
    pub fn collection(&self, name: impl Into<String>) -> FirestoreCollection {
        FirestoreCollection {
            client: self.clone(),
            name: name.into(),
        }
    }

    async fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.inner.tokens.token(&self.inner.http).await?;
        Ok(self.inner.http.request(method, url).bearer_auth(token))
    }
}

/// Firestore-backed [`DocumentStore`] for one collection
#[derive(Clone)]
pub struct FirestoreCollection {
    client: FirestoreClient,
    name: String,
}

impl FirestoreCollection {
    fn collection_url(&self) -> String {
        format!(
            "{}/{}",
            self.client.inner.documents_url,
            urlencoding::encode(&self.name)
        )
    }

    /// URL of one document, or `None` when `id` cannot name a document of
    /// this collection. The id always travels as a single path segment.
    fn document_url(&self, id: &str) -> Option<String> {
        is_document_id(id)
            .then(|| format!("{}/{}", self.collection_url(), urlencoding::encode(id)))
    }

    /// Full resource name, as Firestore spells it in error messages
    fn document_name(&self, id: &str) -> String {
        format!("{}/documents/{}/{}", self.client.inner.database, self.name, id)
    }

    /// A 404 about this very document means it is missing; any other 404
    /// (unknown project or database) stays a remote failure.
    async fn check_document(&self, response: Response, id: &str) -> Result<Response> {
        match check_status(response).await {
            Err(StoreError::Remote { status: 404, message })
                if message.contains(&self.document_name(id)) =>
            {
                Err(StoreError::not_found(id))
            }
            other => other,
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreCollection {
    fn collection(&self) -> &str {
        &self.name
    }

    async fn add(&self, fields: Fields) -> Result<String> {
        debug!(collection = %self.name, "firestore add");
        let response = self
            .client
            .request(Method::POST, &self.collection_url())
            .await?
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;

        let document: Document = read_json(response).await?;
        document_id(&document.name)
            .map(str::to_string)
            .ok_or_else(|| StoreError::invalid_response(format!("bad document name '{}'", document.name)))
    }

    async fn list(&self) -> Result<Vec<Record>> {
        debug!(collection = %self.name, "firestore list");
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", LIST_PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let response = self
                .client
                .request(Method::GET, &self.collection_url())
                .await?
                .query(&query)
                .send()
                .await?;
            let page: ListResponse = read_json(response).await?;

            for document in page.documents {
                records.push(into_record(document)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Record> {
        debug!(collection = %self.name, %id, "firestore get");
        let Some(url) = self.document_url(id) else {
            return Err(StoreError::not_found(id));
        };

        let response = self
            .client
            .request(Method::GET, &url)
            .await?
            .send()
            .await?;

        let response = self.check_document(response, id).await?;
        into_record(parse_json(response).await?)
    }

    async fn update(&self, id: &str, fields: Fields) -> Result<()> {
        // An empty mask would replace the whole document, so only check existence
        if fields.is_empty() {
            return self.get(id).await.map(|_| ());
        }

        debug!(collection = %self.name, %id, fields = fields.len(), "firestore update");
        let Some(url) = self.document_url(id) else {
            return Err(StoreError::not_found(id));
        };

        let response = self
            .client
            .request(Method::PATCH, &url)
            .await?
            .query(&update_query(&fields))
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;

        self.check_document(response, id).await.map(|_| ())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        debug!(collection = %self.name, %id, "firestore delete");
        // Nothing outside the collection can be deleted, so there is nothing to do
        let Some(url) = self.document_url(id) else {
            return Ok(());
        };

        let response = self
            .client
            .request(Method::DELETE, &url)
            .await?
            .send()
            .await?;

        check_status(response).await.map(|_| ())
    }
}

fn database_name(project_id: &str) -> String {
    format!("projects/{project_id}/databases/(default)")
}

fn documents_url(host: &str, project_id: &str) -> String {
    format!("{host}/v1/{}/documents", database_name(project_id))
}

/// Ids naming a path (`a/b`) or a relative segment (`.`, `..`) would
/// address documents outside the collection
fn is_document_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains('/')
}

/// Last path segment of `projects/../documents/{collection}/{id}`
fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

fn into_record(document: Document) -> Result<Record> {
    let id = document_id(&document.name)
        .ok_or_else(|| StoreError::invalid_response(format!("bad document name '{}'", document.name)))?
        .to_string();
    Ok(Record::new(id, decode_fields(&document.fields)?))
}

/// Quote a top-level field name for use in `updateMask.fieldPaths`
fn field_path(name: &str) -> String {
    if SIMPLE_FIELD.is_match(name) {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

/// Query string for a merge update that must not create the document
fn update_query(fields: &Fields) -> Vec<(&'static str, String)> {
    let mut query = vec![("currentDocument.exists", "true".to_string())];
    query.extend(fields.keys().map(|key| ("updateMask.fieldPaths", field_path(key))));
    query
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    Err(StoreError::remote(status.as_u16(), message))
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| StoreError::invalid_response(e.to_string()))
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    parse_json(check_status(response).await?).await
}
