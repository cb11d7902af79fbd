//! Error taxonomy for the pipeline shell (spec.md §4.8, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("port kind mismatch connecting {from_component}.{from_port} ({from_kind:?}) to {to_component}.{to_port} ({to_kind:?})")]
    PortKindMismatch {
        from_component: String,
        from_port: String,
        from_kind: crate::component::MediaKind,
        to_component: String,
        to_port: String,
        to_kind: crate::component::MediaKind,
    },

    #[error("unknown component '{0}'")]
    UnknownComponent(String),

    #[error("unknown port '{component}.{port}'")]
    UnknownPort { component: String, port: String },

    #[error("unknown parameter path '{0}'")]
    UnknownParam(String),

    #[error("invalid parameter path '{0}', expected 'componentId.parameterKey'")]
    InvalidParamPath(String),

    #[error("parameter '{path}' type mismatch: expected {expected}, got {got}")]
    ParamTypeMismatch {
        path: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("parameter '{path}' value out of range or not a valid option")]
    ParamOutOfRange { path: String },

    #[error("parameter '{0}' is read-only")]
    ParamReadOnly(String),

    #[error("connection graph has a cycle")]
    Cycle,

    #[error("component '{component}' failed during {phase}: {message}")]
    ComponentFailed {
        component: String,
        phase: &'static str,
        message: String,
    },
}
