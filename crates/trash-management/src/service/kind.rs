/// The four request topics the service answers, resolved once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Query,
    Browse,
    Delete,
    PublishChain,
}

impl RequestKind {
    pub const ALL: [Self; 4] = [Self::Query, Self::Browse, Self::Delete, Self::PublishChain];

    pub fn base_topic(self) -> &'static str {
        match self {
            Self::Query => "QUERY_ARCHIVED_ITEMS",
            Self::Browse => "BROWSE_ARCHIVED_ITEMS",
            Self::Delete => "DELETE_ARCHIVED_ITEMS",
            Self::PublishChain => "PUBLISH_CHAIN",
        }
    }

    /// The request topic with the configured prefix in front.
    pub fn topic(self, prefix: &str) -> String {
        format!("{prefix}{}", self.base_topic())
    }
}
