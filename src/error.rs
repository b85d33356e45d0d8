use std::fmt;

/// Remote platform operations the router performs on behalf of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformOp {
    SetWebhook,
    WebhookStatus,
    DeleteWebhook,
    ResolveIdentity,
    AdminNotice,
    SendMessage,
    AnswerCallback,
}

impl fmt::Display for PlatformOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformOp::SetWebhook => write!(f, "set webhook"),
            PlatformOp::WebhookStatus => write!(f, "get webhook status"),
            PlatformOp::DeleteWebhook => write!(f, "delete webhook"),
            PlatformOp::ResolveIdentity => write!(f, "resolve bot identity"),
            PlatformOp::AdminNotice => write!(f, "send admin notice"),
            PlatformOp::SendMessage => write!(f, "send message"),
            PlatformOp::AnswerCallback => write!(f, "answer callback query"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("{0}")]
    Config(String),

    #[error("endpoint {endpoint}: cannot get bot id from bot token")]
    MalformedCredential { endpoint: String },

    #[error("unknown endpoint {0}")]
    UnknownEndpoint(String),

    #[error("endpoint {endpoint}: {op} failed: {source:#}")]
    Platform {
        endpoint: String,
        op: PlatformOp,
        #[source]
        source: anyhow::Error,
    },

    #[error("webhook listener failed: {0:#}")]
    Listener(anyhow::Error),
}

impl RouterError {
    pub fn platform(endpoint: &str, op: PlatformOp, source: anyhow::Error) -> Self {
        RouterError::Platform {
            endpoint: endpoint.to_string(),
            op,
            source,
        }
    }

    /// Fatal errors abort the process; the rest are logged and the
    /// dispatch loop keeps going.
    pub fn is_fatal(&self) -> bool {
        match self {
            RouterError::Platform { op, .. } => {
                !matches!(op, PlatformOp::SendMessage | PlatformOp::AnswerCallback)
            }
            _ => true,
        }
    }
}
