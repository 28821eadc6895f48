use std::collections::HashSet;

/// Static allow-list of exact origin strings.
///
/// An absent `Origin` header is treated as a same-origin or server-to-server
/// caller: allowed, with no CORS headers emitted. Only a present header that
/// fails to match an entry is rejected.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginDecision {
    pub allow: bool,
    /// The matched origin to echo back in `Access-Control-Allow-Origin`.
    /// `None` means no CORS headers are emitted on the response.
    pub allowed_origin: Option<String>,
}

impl OriginPolicy {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: origins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn evaluate(&self, origin: Option<&str>) -> OriginDecision {
        match origin {
            None => OriginDecision {
                allow: true,
                allowed_origin: None,
            },
            Some(o) if self.allowed.contains(o) => OriginDecision {
                allow: true,
                allowed_origin: Some(o.to_string()),
            },
            Some(_) => OriginDecision {
                allow: false,
                allowed_origin: None,
            },
        }
    }
}
