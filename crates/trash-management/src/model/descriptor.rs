use std::fmt;
use topic_bus::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// Query parameters in insertion order, one value per name.
///
/// Setting a name twice keeps its original position and the latest value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters(Vec<(String, String)>);

impl QueryParameters {
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }
}

/// A fully resolved backend call. Built once per request and never changed.
#[derive(Debug, Clone, PartialEq)]
pub struct CallDescriptor {
    /// Relative to the configured proxy URI.
    pub endpoint: String,
    pub method: HttpMethod,
    pub query_parameters: QueryParameters,
    pub body: Option<Payload>,
    /// Ask intermediaries not to serve a cached listing.
    pub prevent_cache: bool,
}

impl CallDescriptor {
    pub fn get(endpoint: impl Into<String>, query_parameters: QueryParameters) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: HttpMethod::Get,
            query_parameters,
            body: None,
            prevent_cache: true,
        }
    }

    pub fn post(endpoint: impl Into<String>, body: Payload) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: HttpMethod::Post,
            query_parameters: QueryParameters::default(),
            body: Some(body),
            prevent_cache: true,
        }
    }

    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query_parameters.get(name)
    }
}
