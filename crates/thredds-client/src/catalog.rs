//! THREDDS `catalog.xml` parsing.
//!
//! Only the parts needed to reach data are kept: services (with compound
//! services flattened on lookup), datasets that carry a `urlPath`, and
//! `catalogRef` links. Container datasets contribute their inherited
//! `serviceName` to the datasets nested inside them.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Url;
use tracing::debug;

use crate::error::{ThreddsError, ThreddsResult};

/// THREDDS service types this client knows how to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceType {
    Compound,
    OpenDap,
    NetcdfSubset,
    HttpServer,
    Other(String),
}

impl ServiceType {
    fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "compound" => ServiceType::Compound,
            "opendap" => ServiceType::OpenDap,
            "netcdfsubset" => ServiceType::NetcdfSubset,
            "httpserver" => ServiceType::HttpServer,
            _ => ServiceType::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ServiceType::Compound => "Compound",
            ServiceType::OpenDap => "OPENDAP",
            ServiceType::NetcdfSubset => "NetcdfSubset",
            ServiceType::HttpServer => "HTTPServer",
            ServiceType::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub service_type: ServiceType,
    pub base: String,
    pub children: Vec<Service>,
}

impl Service {
    /// This service or one of its compound children with the given type.
    fn find_type(&self, wanted: &ServiceType) -> Option<&Service> {
        if &self.service_type == wanted {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_type(wanted))
    }

    fn find_name(&self, name: &str) -> Option<&Service> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_name(name))
    }
}

/// A dataset that can be accessed (has a `urlPath`).
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub id: Option<String>,
    pub url_path: String,
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRef {
    pub name: String,
    pub href: String,
}

/// A parsed catalog document and the URL it was read from.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub url: Url,
    pub services: Vec<Service>,
    pub datasets: Vec<Dataset>,
    pub catalog_refs: Vec<CatalogRef>,
}

/// Per-`<dataset>` parse frame; tracks the inherited service name.
struct Frame {
    service_name: Option<String>,
}

impl Catalog {
    /// Parse a catalog document fetched from `url`.
    pub fn parse(url: &str, xml: &str) -> ThreddsResult<Self> {
        let url = Url::parse(url).map_err(|e| ThreddsError::InvalidUrl(format!("{url}: {e}")))?;

        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut services = Vec::new();
        let mut service_stack: Vec<Service> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut datasets = Vec::new();
        let mut catalog_refs = Vec::new();
        let mut in_service_name = false;
        let mut saw_catalog = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"catalog" => saw_catalog = true,
                    b"service" => service_stack.push(parse_service(&e)?),
                    b"dataset" => {
                        let inherited = frames.last().and_then(|f| f.service_name.clone());
                        let own = attr(&e, b"serviceName")?;
                        let service_name = own.or(inherited);
                        if let Some(ds) = parse_dataset(&e, service_name.clone())? {
                            datasets.push(ds);
                        }
                        frames.push(Frame { service_name });
                    }
                    b"serviceName" => in_service_name = true,
                    b"catalogRef" => catalog_refs.extend(parse_catalog_ref(&e)?),
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"service" => {
                        let service = parse_service(&e)?;
                        attach_service(&mut service_stack, &mut services, service);
                    }
                    b"dataset" => {
                        let inherited = frames.last().and_then(|f| f.service_name.clone());
                        let service_name = attr(&e, b"serviceName")?.or(inherited);
                        if let Some(ds) = parse_dataset(&e, service_name)? {
                            datasets.push(ds);
                        }
                    }
                    b"catalogRef" => catalog_refs.extend(parse_catalog_ref(&e)?),
                    _ => {}
                },
                Ok(Event::Text(t)) if in_service_name => {
                    let name = t
                        .unescape()
                        .map_err(|e| ThreddsError::CatalogParse(e.to_string()))?
                        .trim()
                        .to_string();
                    // Metadata belongs to the enclosing container dataset.
                    if let Some(frame) = frames.last_mut() {
                        frame.service_name = Some(name);
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"service" => {
                        if let Some(service) = service_stack.pop() {
                            attach_service(&mut service_stack, &mut services, service);
                        }
                    }
                    b"dataset" => {
                        frames.pop();
                    }
                    b"serviceName" => in_service_name = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ThreddsError::CatalogParse(format!(
                        "XML error at position {}: {e}",
                        reader.buffer_position()
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        if !saw_catalog {
            return Err(ThreddsError::CatalogParse(
                "document has no <catalog> element".to_string(),
            ));
        }

        debug!(
            url = %url,
            services = services.len(),
            datasets = datasets.len(),
            "Parsed catalog"
        );

        Ok(Self {
            url,
            services,
            datasets,
            catalog_refs,
        })
    }

    /// Find a service of the given type, preferring the dataset's own service.
    pub fn service_for(&self, dataset: &Dataset, wanted: &ServiceType) -> Option<&Service> {
        let own = dataset.service_name.as_deref().and_then(|name| {
            self.services
                .iter()
                .find_map(|s| s.find_name(name))
                .and_then(|s| s.find_type(wanted))
        });
        own.or_else(|| self.services.iter().find_map(|s| s.find_type(wanted)))
    }

    /// Build the access URL of `dataset` through a service of type `wanted`.
    pub fn access_url(&self, dataset: &Dataset, wanted: &ServiceType) -> ThreddsResult<Url> {
        let service = self
            .service_for(dataset, wanted)
            .ok_or_else(|| ThreddsError::MissingService(wanted.as_str().to_string()))?;
        let path = format!("{}{}", service.base, dataset.url_path);
        self.url
            .join(&path)
            .map_err(|e| ThreddsError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Resolve a `catalogRef` href against this catalog.
    pub fn resolve_ref(&self, catalog_ref: &CatalogRef) -> ThreddsResult<Url> {
        self.url
            .join(&catalog_ref.href)
            .map_err(|e| ThreddsError::InvalidUrl(format!("{}: {e}", catalog_ref.href)))
    }
}

fn attach_service(stack: &mut [Service], top_level: &mut Vec<Service>, service: Service) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(service),
        None => top_level.push(service),
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> ThreddsResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ThreddsError::CatalogParse(err.to_string()))?;
        if attr.key.local_name().as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|err| ThreddsError::CatalogParse(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_service(e: &BytesStart<'_>) -> ThreddsResult<Service> {
    let name = attr(e, b"name")?
        .ok_or_else(|| ThreddsError::CatalogParse("<service> without name".to_string()))?;
    let service_type = attr(e, b"serviceType")?
        .map(|t| ServiceType::parse(&t))
        .unwrap_or(ServiceType::Other(String::new()));
    Ok(Service {
        name,
        service_type,
        base: attr(e, b"base")?.unwrap_or_default(),
        children: Vec::new(),
    })
}

fn parse_dataset(e: &BytesStart<'_>, service_name: Option<String>) -> ThreddsResult<Option<Dataset>> {
    let Some(url_path) = attr(e, b"urlPath")? else {
        return Ok(None);
    };
    let name = attr(e, b"name")?.unwrap_or_else(|| url_path.clone());
    Ok(Some(Dataset {
        name,
        id: attr(e, b"ID")?,
        url_path,
        service_name,
    }))
}

fn parse_catalog_ref(e: &BytesStart<'_>) -> ThreddsResult<Option<CatalogRef>> {
    let Some(href) = attr(e, b"href")? else {
        return Ok(None);
    };
    let name = attr(e, b"name")?
        .or(attr(e, b"title")?)
        .unwrap_or_else(|| href.clone());
    Ok(Some(CatalogRef { name, href }))
}
