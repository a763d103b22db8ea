use crate::model::ElementName;

/// Errors raised by the configuration model.
///
/// These indicate misuse of the model (querying elements that were never registered, illegal
/// state transitions); they are programming errors surfaced immediately, in contrast to the
/// recoverable infeasibility signals of the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("element '{0}' is not registered in the configuration")]
    UnknownElement(ElementName),

    #[error("no '{resource}' value is defined for element '{element}'")]
    UndefinedResourceValue {
        resource: String,
        element: ElementName,
    },

    #[error("node '{0}' still hosts virtual machines")]
    NodeNotEmpty(ElementName),

    #[error("'{0}' cannot host virtual machines while offline")]
    HosterOffline(ElementName),

    #[error("virtual machine '{vm}' cannot {transition} in its current state")]
    InvalidTransition {
        vm: ElementName,
        transition: &'static str,
    },
}
