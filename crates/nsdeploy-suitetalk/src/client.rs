//! File Cabinet operations over SuiteTalk

use crate::error::{Result, SuiteTalkError};
use crate::soap::{self, XmlElement};
use async_trait::async_trait;
use nsdeploy_core::{Credentials, FileId, FolderId};

/// Media type sent for every uploaded file
pub const JAVASCRIPT_FILE_TYPE: &str = "_JAVASCRIPT";

/// Search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// Folders named exactly `name` directly below `parent` (`None` for top level)
    Folder {
        name: String,
        parent: Option<FolderId>,
    },
}

/// Record to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Folder {
        name: String,
        parent: Option<FolderId>,
    },
    File {
        name: String,
        folder: FolderId,
        /// Base64 encoded content
        content: String,
        file_type: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDetail {
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub is_success: bool,
    pub details: Vec<StatusDetail>,
}

impl Status {
    /// First detail's code and message, used when reporting a failure
    fn first_detail(&self) -> (String, Option<String>) {
        match self.details.first() {
            Some(detail) => (detail.message.clone(), detail.code.clone()),
            None => ("Unknown error".to_string(), None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundRecord {
    pub internal_id: u64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub status: Status,
    pub total_records: u64,
    pub records: Vec<FoundRecord>,
}

impl SearchResult {
    /// Fail unless NetSuite reported success
    pub fn into_success(self) -> Result<Self> {
        if self.status.is_success {
            return Ok(self);
        }
        let (message, code) = self.status.first_detail();
        Err(SuiteTalkError::SearchFailed { message, code })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResponse {
    pub status: Status,
    /// `internalId` of the written record
    pub base_ref: Option<u64>,
}

impl WriteResponse {
    /// Internal id of the created record, or the reported failure
    pub fn created_id(&self) -> Result<u64> {
        if !self.status.is_success {
            let (message, code) = self.status.first_detail();
            return Err(SuiteTalkError::RecordWrite { message, code });
        }
        self.base_ref
            .ok_or_else(|| SuiteTalkError::UnexpectedResponse("write without baseRef".to_string()))
    }

    pub fn folder_id(&self) -> Result<FolderId> {
        let id = self.created_id()?;
        FolderId::new(id).ok_or_else(|| invalid_id(id))
    }

    pub fn file_id(&self) -> Result<FileId> {
        let id = self.created_id()?;
        FileId::new(id).ok_or_else(|| invalid_id(id))
    }
}

fn invalid_id(id: u64) -> SuiteTalkError {
    SuiteTalkError::UnexpectedResponse(format!("invalid internalId {}", id))
}

/// The two SuiteTalk calls nsdeploy needs
#[async_trait]
pub trait FileCabinet: Send + Sync {
    async fn search(&self, criteria: &SearchCriteria) -> Result<SearchResult>;

    async fn add(&self, record: &Record) -> Result<WriteResponse>;
}

/// SOAP client bound to one account's web services domain
pub struct SuiteTalkClient {
    client: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
    application_id: String,
}

impl SuiteTalkClient {
    pub fn new(
        webservices_domain: &str,
        credentials: Credentials,
        application_id: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!(
                "{}{}",
                webservices_domain.trim_end_matches('/'),
                soap::endpoint_path()
            ),
            credentials,
            application_id: application_id.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, action: &str, body: String) -> Result<XmlElement> {
        let envelope = soap::envelope(&self.credentials, &self.application_id, &body);
        tracing::debug!("SOAP {} -> {}", action, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", action)
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!("SOAP {} <- HTTP {}", action, status);

        // Faults arrive with HTTP 500, so look at the body before the status
        let root = XmlElement::parse(&text).map_err(|err| {
            if status.is_success() {
                err
            } else {
                SuiteTalkError::UnexpectedResponse(format!("HTTP {}: {}", status, err))
            }
        })?;
        check_fault(&root)?;

        if !status.is_success() {
            return Err(SuiteTalkError::UnexpectedResponse(format!(
                "HTTP {}",
                status
            )));
        }
        Ok(root)
    }
}

#[async_trait]
impl FileCabinet for SuiteTalkClient {
    async fn search(&self, criteria: &SearchCriteria) -> Result<SearchResult> {
        let body = match criteria {
            SearchCriteria::Folder { name, parent } => soap::folder_search_body(name, *parent),
        };
        let root = self.call("search", body).await?;
        parse_search_response(&root)
    }

    async fn add(&self, record: &Record) -> Result<WriteResponse> {
        let body = match record {
            Record::Folder { name, parent } => soap::add_folder_body(name, *parent),
            Record::File {
                name,
                folder,
                content,
                file_type,
            } => soap::add_file_body(name, *folder, content, file_type),
        };
        let root = self.call("add", body).await?;
        parse_write_response(&root)
    }
}

fn check_fault(root: &XmlElement) -> Result<()> {
    match root.find("Fault") {
        Some(fault) => Err(SuiteTalkError::SoapFault {
            code: fault.child_text("faultcode").unwrap_or_default().to_string(),
            message: fault.child_text("faultstring").unwrap_or_default().to_string(),
        }),
        None => Ok(()),
    }
}

/// Only an explicit `isSuccess="true"` counts as success
fn parse_status(element: Option<&XmlElement>) -> Result<Status> {
    let element =
        element.ok_or_else(|| SuiteTalkError::UnexpectedResponse("missing status".to_string()))?;

    Ok(Status {
        is_success: element.attr("isSuccess") == Some("true"),
        details: element
            .children_named("statusDetail")
            .map(|detail| StatusDetail {
                code: detail.child_text("code").map(str::to_string),
                message: detail.child_text("message").unwrap_or_default().to_string(),
            })
            .collect(),
    })
}

/// Read a `searchResponse` envelope
pub fn parse_search_response(root: &XmlElement) -> Result<SearchResult> {
    check_fault(root)?;
    let result = root
        .find("searchResult")
        .ok_or_else(|| SuiteTalkError::UnexpectedResponse("missing searchResult".to_string()))?;

    let records = result
        .child("recordList")
        .map(|list| {
            list.children_named("record")
                .filter_map(|record| {
                    let internal_id = record.attr("internalId")?.trim().parse().ok()?;
                    Some(FoundRecord {
                        internal_id,
                        name: record.child_text("name").map(str::to_string),
                    })
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let total_records = result
        .child_text("totalRecords")
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(records.len() as u64);

    Ok(SearchResult {
        status: parse_status(result.child("status"))?,
        total_records,
        records,
    })
}

/// Read an `addResponse` envelope
pub fn parse_write_response(root: &XmlElement) -> Result<WriteResponse> {
    check_fault(root)?;
    let write = root
        .find("writeResponse")
        .ok_or_else(|| SuiteTalkError::UnexpectedResponse("missing writeResponse".to_string()))?;

    Ok(WriteResponse {
        status: parse_status(write.child("status"))?,
        base_ref: write
            .child("baseRef")
            .and_then(|base_ref| base_ref.attr("internalId"))
            .and_then(|raw| raw.trim().parse().ok()),
    })
}
