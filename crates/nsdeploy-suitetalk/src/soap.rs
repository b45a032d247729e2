//! SuiteTalk 2016.2 SOAP envelopes
//!
//! Requests are rendered as text; responses are read into a small element
//! tree keyed by local names, so namespace prefixes chosen by the server
//! don't matter.

use crate::error::{Result, SuiteTalkError};
use nsdeploy_core::{Credentials, FolderId};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

pub const API_VERSION: &str = "2016_2";

/// Value used for "no parent" in folder searches
const NO_PARENT: &str = "@NONE@";

/// Service path below the web services domain
pub fn endpoint_path() -> String {
    format!("/services/NetSuitePort_{}", API_VERSION)
}

/// Wrap `body` in a SOAP envelope carrying the passport header
pub fn envelope(credentials: &Credentials, application_id: &str, body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/""#,
            r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#,
            r#" xmlns:xsd="http://www.w3.org/2001/XMLSchema""#,
            r#" xmlns:platformMsgs="urn:messages_{v}.platform.webservices.netsuite.com""#,
            r#" xmlns:platformCore="urn:core_{v}.platform.webservices.netsuite.com""#,
            r#" xmlns:platformCommon="urn:common_{v}.platform.webservices.netsuite.com""#,
            r#" xmlns:fileCabinet="urn:filecabinet_{v}.documents.webservices.netsuite.com""#,
            r#" xmlns:fileCabinetTypes="urn:types.filecabinet_{v}.documents.webservices.netsuite.com">"#,
            "<soap:Header>",
            "<platformMsgs:passport>",
            "<platformCore:email>{email}</platformCore:email>",
            "<platformCore:password>{password}</platformCore:password>",
            "<platformCore:account>{account}</platformCore:account>",
            r#"<platformCore:role internalId="{role}"/>"#,
            "</platformMsgs:passport>",
            "<platformMsgs:applicationInfo>",
            "<platformMsgs:applicationId>{application_id}</platformMsgs:applicationId>",
            "</platformMsgs:applicationInfo>",
            "</soap:Header>",
            "<soap:Body>{body}</soap:Body>",
            "</soap:Envelope>"
        ),
        v = API_VERSION,
        email = escape(credentials.email.as_str()),
        password = escape(credentials.password.as_str()),
        account = escape(credentials.account.as_str()),
        role = escape(credentials.role.as_str()),
        application_id = escape(application_id),
        body = body,
    )
}

fn parent_ref(parent: Option<FolderId>) -> String {
    parent
        .map(|id| id.to_string())
        .unwrap_or_else(|| NO_PARENT.to_string())
}

/// `search` body: folder named exactly `name` directly below `parent`
pub fn folder_search_body(name: &str, parent: Option<FolderId>) -> String {
    format!(
        concat!(
            "<platformMsgs:search>",
            r#"<platformMsgs:searchRecord xsi:type="platformCommon:FolderSearchBasic">"#,
            r#"<platformCommon:name operator="is" xsi:type="platformCore:SearchStringField">"#,
            r#"<platformCore:searchValue xsi:type="xsd:string">{name}</platformCore:searchValue>"#,
            "</platformCommon:name>",
            r#"<platformCommon:parent operator="anyOf" xsi:type="platformCore:SearchMultiSelectField">"#,
            r#"<platformCore:searchValue xsi:type="platformCore:RecordRef" internalId="{parent}"/>"#,
            "</platformCommon:parent>",
            "</platformMsgs:searchRecord>",
            "</platformMsgs:search>"
        ),
        name = escape(name),
        parent = parent_ref(parent),
    )
}

/// `add` body for a folder; top-level folders carry no parent element
pub fn add_folder_body(name: &str, parent: Option<FolderId>) -> String {
    let parent = parent
        .map(|id| {
            format!(
                r#"<fileCabinet:parent xsi:type="platformCore:RecordRef" internalId="{}"/>"#,
                id
            )
        })
        .unwrap_or_default();

    format!(
        concat!(
            "<platformMsgs:add>",
            r#"<platformMsgs:record xsi:type="fileCabinet:Folder">"#,
            r#"<fileCabinet:name xsi:type="xsd:string">{name}</fileCabinet:name>"#,
            "{parent}",
            "</platformMsgs:record>",
            "</platformMsgs:add>"
        ),
        name = escape(name),
        parent = parent,
    )
}

/// `add` body for a file whose content is already base64 encoded
pub fn add_file_body(name: &str, folder: FolderId, content: &str, file_type: &str) -> String {
    format!(
        concat!(
            "<platformMsgs:add>",
            r#"<platformMsgs:record xsi:type="fileCabinet:File">"#,
            r#"<fileCabinet:name xsi:type="xsd:string">{name}</fileCabinet:name>"#,
            r#"<fileCabinet:attachFrom xsi:type="fileCabinetTypes:FileAttachFrom">_computer</fileCabinet:attachFrom>"#,
            r#"<fileCabinet:fileType xsi:type="fileCabinetTypes:MediaType">{file_type}</fileCabinet:fileType>"#,
            "<fileCabinet:content>{content}</fileCabinet:content>",
            r#"<fileCabinet:folder xsi:type="platformCore:RecordRef" internalId="{folder}"/>"#,
            "</platformMsgs:record>",
            "</platformMsgs:add>"
        ),
        name = escape(name),
        file_type = escape(file_type),
        content = content,
        folder = folder,
    )
}

/// Element of a parsed response, named by its local name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> Result<XmlElement> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(start) => stack.push(element_from(&start)?),
                Event::Empty(start) => {
                    let element = element_from(&start)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| SuiteTalkError::Xml("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape().map_err(xml_error)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(SuiteTalkError::Xml("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| SuiteTalkError::Xml("empty document".to_string()))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child called `name`
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|child| child.text.as_str())
    }

    /// Depth-first search for the first element called `name`, self included
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement> {
    let mut element = XmlElement {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(xml_error)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn xml_error(err: impl std::fmt::Display) -> SuiteTalkError {
    SuiteTalkError::Xml(err.to_string())
}
