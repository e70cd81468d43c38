use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{Book, BookDraft, BookId};

use super::ApiError;

/// Collection endpoint used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/books";

/// Thin client for the four collection operations. Each call is a single
/// request: no retries, no backoff, no timeout beyond reqwest's defaults.
#[derive(Debug, Clone)]
pub struct BooksApi {
    client: Client,
    base_url: Url,
}

impl BooksApi {
    /// Build a client rooted at `base_url`, which must point at the collection
    /// itself (for example `http://localhost:3001/books`).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let invalid = |reason: String| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };

        let parsed = Url::parse(base_url).map_err(|err| invalid(err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme `{}`", parsed.scheme())));
        }
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a record path".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET {base}`: the whole collection.
    pub async fn list(&self) -> Result<Vec<Book>, ApiError> {
        let url = self.base_url.clone();
        let response = self.send(Method::GET, url.clone(), None::<&()>).await?;
        decode("GET", &url, response).await
    }

    /// `POST {base}`: create a record; the server picks the id.
    pub async fn create(&self, draft: &BookDraft) -> Result<Book, ApiError> {
        let url = self.base_url.clone();
        let response = self.send(Method::POST, url.clone(), Some(draft)).await?;
        decode("POST", &url, response).await
    }

    /// `PUT {base}/{id}`: replace every field of an existing record.
    pub async fn update(&self, id: &BookId, draft: &BookDraft) -> Result<Book, ApiError> {
        let url = self.item_url(id);
        let body = Book::from_draft(id.clone(), draft.clone());
        let response = self.send(Method::PUT, url.clone(), Some(&body)).await?;
        decode("PUT", &url, response).await
    }

    /// `DELETE {base}/{id}`. Whatever body comes back is ignored.
    pub async fn delete(&self, id: &BookId) -> Result<(), ApiError> {
        let url = self.item_url(id);
        self.send(Method::DELETE, url, None::<&()>).await?;
        Ok(())
    }

    fn item_url(&self, id: &BookId) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so segments are always available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&id.to_string());
        }
        url
    }

    async fn send<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let method_name = method_name(&method);
        debug!(method = method_name, %url, "sending request");

        let mut request = self.client.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| {
            warn!(method = method_name, %url, error = %source, "request failed");
            ApiError::Transport {
                method: method_name,
                url: url.to_string(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(method = method_name, %url, status = status.as_u16(), "request rejected");
            return Err(ApiError::Status {
                method: method_name,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        debug!(method = method_name, %url, status = status.as_u16(), "request succeeded");
        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(
    method: &'static str,
    url: &Url,
    response: Response,
) -> Result<T, ApiError> {
    response.json::<T>().await.map_err(|source| {
        warn!(method, %url, error = %source, "could not decode response");
        ApiError::Decode {
            method,
            url: url.to_string(),
            source,
        }
    })
}

fn method_name(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        _ => "HTTP",
    }
}
