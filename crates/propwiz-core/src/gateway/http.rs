//! REST gateway over the property aggregate API.

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use log::debug;
use reqwest::{
    multipart::{Form, Part},
    Client, Method, StatusCode, Url,
};
use serde_json::{Map, Value};

use super::{decode_error_body, PersistenceGateway, SaveOutcome};
use crate::{
    error::{Result, ResultExt, WizardError},
    models::{DraftId, PropertyDraft, SectionKind, SubResourceId},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Get,
    Post,
    Put,
    Patch,
}

impl Verb {
    fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathTemplate {
    /// `/properties`
    Collection,
    /// `/properties/{draft}/<suffix>`
    UnderDraft(&'static str),
    /// `/<prefix>/{sub_id}`
    UnderSubResource(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyShape {
    /// `{ key: payload }`
    Wrapped(&'static str),
    /// The payload itself
    Plain,
    /// The payload plus `_id` and `property_id`
    WithIdentity,
    /// One file part per list entry plus an index-aligned JSON text part
    Multipart {
        files: &'static str,
        meta: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Route {
    verb: Verb,
    path: PathTemplate,
    body: BodyShape,
}

const fn route(verb: Verb, path: PathTemplate, body: BodyShape) -> Route {
    Route { verb, path, body }
}

const DOCUMENTS: BodyShape = BodyShape::Multipart {
    files: "documents",
    meta: "document_types",
};

const IMAGES: BodyShape = BodyShape::Multipart {
    files: "images",
    meta: "image_meta",
};

/// `(create, update)` route per section.
fn routes(kind: SectionKind) -> (Route, Route) {
    use BodyShape::*;
    use PathTemplate::*;
    use Verb::*;

    match kind {
        SectionKind::GeneralDetails => (
            route(Post, Collection, Wrapped("general_details")),
            route(Patch, UnderDraft("general-details"), Wrapped("general_details")),
        ),
        SectionKind::BusinessDetails => {
            let single = route(Put, UnderDraft("business-details"), Plain);
            (single, single)
        }
        SectionKind::PropertyDetails => {
            let single = route(Put, UnderDraft("property-details"), Plain);
            (single, single)
        }
        SectionKind::Location => (
            route(Put, UnderDraft("location"), Plain),
            route(Patch, UnderSubResource("property-location"), Plain),
        ),
        SectionKind::VirtualTours => (
            route(Put, UnderDraft("virtual-tours"), Plain),
            route(Patch, UnderSubResource("property-virtual-tours"), WithIdentity),
        ),
        SectionKind::Features => (
            route(Put, UnderDraft("features"), Plain),
            route(Patch, UnderSubResource("property-features"), Plain),
        ),
        SectionKind::Images => {
            let single = route(Put, UnderDraft("images"), IMAGES);
            (single, single)
        }
        SectionKind::Documents => {
            let single = route(Put, UnderDraft("documents"), DOCUMENTS);
            (single, single)
        }
    }
}

impl Route {
    fn render_path(
        &self,
        kind: SectionKind,
        draft: Option<&DraftId>,
        sub_id: Option<&SubResourceId>,
    ) -> Result<String> {
        match self.path {
            PathTemplate::Collection => Ok("/properties".to_string()),
            PathTemplate::UnderDraft(suffix) => {
                let draft = draft.ok_or_else(|| {
                    WizardError::precondition(kind, "the property draft has not been created yet")
                })?;
                Ok(format!("/properties/{draft}/{suffix}"))
            }
            PathTemplate::UnderSubResource(prefix) => {
                let sub_id = sub_id.ok_or_else(|| {
                    WizardError::precondition(kind, "the section has not been saved yet")
                })?;
                Ok(format!("/{prefix}/{sub_id}"))
            }
        }
    }
}

/// Request body before any file is read.
#[derive(Debug, PartialEq)]
enum PlannedBody {
    Json(Value),
    Multipart {
        files_field: &'static str,
        files: Vec<(PathBuf, String)>,
        meta_field: &'static str,
        meta: Value,
    },
}

fn plan_body(
    shape: BodyShape,
    payload: &Value,
    draft: Option<&DraftId>,
    sub_id: Option<&SubResourceId>,
) -> Result<PlannedBody> {
    match shape {
        BodyShape::Wrapped(key) => {
            let mut wrapped = Map::new();
            wrapped.insert(key.to_string(), payload.clone());
            Ok(PlannedBody::Json(Value::Object(wrapped)))
        }
        BodyShape::Plain => Ok(PlannedBody::Json(payload.clone())),
        BodyShape::WithIdentity => {
            let mut body = payload.as_object().cloned().unwrap_or_default();
            if let Some(sub_id) = sub_id {
                body.insert("_id".to_string(), Value::String(sub_id.to_string()));
            }
            if let Some(draft) = draft {
                body.insert("property_id".to_string(), Value::String(draft.to_string()));
            }
            Ok(PlannedBody::Json(Value::Object(body)))
        }
        BodyShape::Multipart { files, meta } => plan_multipart(files, meta, payload),
    }
}

/// Entries with a local `file_path` become file parts; entries without one
/// are already stored remotely and are not re-sent.
fn plan_multipart(
    files_field: &'static str,
    meta_field: &'static str,
    payload: &Value,
) -> Result<PlannedBody> {
    let entries = payload
        .get(files_field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut files = Vec::new();
    let mut meta = Vec::new();
    for (position, entry) in entries.iter().enumerate() {
        let Some(path) = entry.get("file_path").and_then(Value::as_str) else {
            continue;
        };
        let path = PathBuf::from(path);
        let file_name = entry
            .get("file_name")
            .and_then(Value::as_str)
            .map(String::from)
            .or_else(|| path.file_name().map(|name| name.to_string_lossy().into_owned()))
            .ok_or_else(|| {
                WizardError::invalid_input(format!("{files_field}.{position}.file_path"))
                    .with_reason("path has no file name")
            })?;

        let entry_meta = if meta_field == "document_types" {
            entry.get("document_type").cloned().unwrap_or(Value::Null)
        } else {
            let mut described = entry.as_object().cloned().unwrap_or_default();
            described.remove("file_path");
            Value::Object(described)
        };

        files.push((path, file_name));
        meta.push(entry_meta);
    }

    Ok(PlannedBody::Multipart {
        files_field,
        files,
        meta_field,
        meta: Value::Array(meta),
    })
}

/// Gateway speaking to the property REST API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpGateway {
    /// Creates a gateway for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Configuration` if the URL does not parse, and
    /// `WizardError::Transport` if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(&format!("{trimmed}/")).map_err(|e| WizardError::Configuration {
            message: format!("Invalid API base URL '{base_url}': {e}"),
        })?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WizardError::Transport {
                message: "Failed to create HTTP client".to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url,
            token: token.filter(|token| !token.trim().is_empty()),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(format!("Invalid request path '{path}'"))
    }

    async fn send(
        &self,
        verb: Verb,
        path: &str,
        body: Option<PlannedBody>,
    ) -> Result<(StatusCode, Value)> {
        let url = self.url(path)?;
        debug!("{:?} {}", verb, url);

        let mut request = self.client.request(verb.method(), url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request = match body {
            None => request,
            Some(PlannedBody::Json(json)) => request.json(&json),
            Some(PlannedBody::Multipart {
                files_field,
                files,
                meta_field,
                meta,
            }) => request.multipart(build_form(files_field, files, meta_field, &meta).await?),
        };

        let response = request.send().await.map_err(|e| WizardError::Transport {
            message: format!("Request to {path} failed"),
            source: e,
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| WizardError::Transport {
            message: format!("Reading the response from {path} failed"),
            source: e,
        })?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok((status, body))
    }

    async fn save(
        &self,
        kind: SectionKind,
        route: Route,
        draft: Option<&DraftId>,
        sub_id: Option<&SubResourceId>,
        payload: &Value,
    ) -> Result<SaveOutcome> {
        let path = route.render_path(kind, draft, sub_id)?;
        let body = plan_body(route.body, payload, draft, sub_id)?;
        let (status, response) = self.send(route.verb, &path, Some(body)).await?;

        if status.is_success() {
            SaveOutcome::from_response(kind, draft, &response)
        } else {
            Err(decode_error_body(Some(status.as_u16()), &response, &status_line(status)))
        }
    }
}

async fn build_form(
    files_field: &'static str,
    files: Vec<(PathBuf, String)>,
    meta_field: &'static str,
    meta: &Value,
) -> Result<Form> {
    let mut form = Form::new();
    for (path, file_name) in files {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| WizardError::FileSystem { path, source: e })?;
        form = form.part(files_field, Part::bytes(bytes).file_name(file_name));
    }
    Ok(form.text(meta_field, serde_json::to_string(meta)?))
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => format!("Request failed with status {}", status.as_u16()),
    }
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn create_section(
        &self,
        kind: SectionKind,
        draft: Option<&DraftId>,
        payload: &Value,
    ) -> Result<SaveOutcome> {
        let (create, _) = routes(kind);
        self.save(kind, create, draft, None, payload).await
    }

    async fn update_section(
        &self,
        kind: SectionKind,
        draft: &DraftId,
        sub_id: &SubResourceId,
        payload: &Value,
    ) -> Result<SaveOutcome> {
        let (_, update) = routes(kind);
        self.save(kind, update, Some(draft), Some(sub_id), payload).await
    }

    async fn fetch_draft(&self, id: &DraftId) -> Result<PropertyDraft> {
        let path = format!("/properties/{id}");
        let (status, body) = self.send(Verb::Get, &path, None).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WizardError::DraftNotFound { id: id.to_string() });
        }
        if !status.is_success() {
            return Err(decode_error_body(Some(status.as_u16()), &body, &status_line(status)));
        }

        let data = body.get("data").ok_or_else(|| {
            WizardError::invalid_input("data").with_reason("fetch response carries no data")
        })?;
        PropertyDraft::from_api(data)
    }
}
