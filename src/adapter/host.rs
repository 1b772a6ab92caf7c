/// The service an adapter is bound to by `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    pub service: String,
    pub node_id: String,
}

impl HostContext {
    pub fn new(service: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            node_id: node_id.into(),
        }
    }
}
