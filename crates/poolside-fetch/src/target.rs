// File: poolside-fetch/src/target.rs
// Purpose: Request targets, override merging and transport descriptors

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// HTTP method of a request target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bearer token passed explicitly with a target
///
/// The token never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// What a controller is bound to: URL, method, headers, query and body
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestTarget {
    pub url: String,
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub auth: Option<AuthToken>,
}

impl RequestTarget {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            ..Default::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, url).with_body(body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_auth(mut self, token: AuthToken) -> Self {
        self.auth = Some(token);
        self
    }

    /// Apply an override on top of this target
    ///
    /// Scalar fields are replaced when the override sets them; headers and
    /// query parameters are merged key by key with the override winning.
    pub fn merged(&self, overrides: Option<TargetOverride>) -> RequestTarget {
        let mut target = self.clone();
        let Some(overrides) = overrides else {
            return target;
        };

        if let Some(url) = overrides.url {
            target.url = url;
        }
        if let Some(method) = overrides.method {
            target.method = method;
        }
        if let Some(body) = overrides.body {
            target.body = Some(body);
        }
        if let Some(auth) = overrides.auth {
            target.auth = Some(auth);
        }
        target.headers.extend(overrides.headers);
        target.query.extend(overrides.query);
        target
    }

    /// Build the transport-ready descriptor
    pub fn descriptor(&self) -> RequestDescriptor {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            let query = self
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }

        let mut headers = self.headers.clone();
        if let Some(auth) = &self.auth {
            let has_explicit = headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("authorization"));
            if !has_explicit {
                headers.insert("Authorization".to_string(), auth.header_value());
            }
        }
        if self.body.is_some() {
            let has_content_type = headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("content-type"));
            if !has_content_type {
                headers.insert("Content-Type".to_string(), "application/json".to_string());
            }
        }

        RequestDescriptor {
            method: self.method,
            url,
            headers,
            body: self.body.clone(),
        }
    }
}

/// Per-call changes to a bound target
#[derive(Debug, Clone, Default)]
pub struct TargetOverride {
    pub url: Option<String>,
    pub method: Option<Method>,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub auth: Option<AuthToken>,
}

impl TargetOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn auth(mut self, token: AuthToken) -> Self {
        self.auth = Some(token);
        self
    }
}

/// Fully resolved request handed to a [`Transport`](crate::Transport)
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    /// URL with the query string already appended
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}
