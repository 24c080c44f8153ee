pub mod action;
pub mod element;
pub mod engine;
pub mod error;
pub mod event;
pub mod selector;
pub mod step;

pub use action::{Action, ActionKind};
pub use element::{ElementSnapshot, PathSegment};
pub use engine::BrowserEngine;
pub use error::backend_error::BackendError;
pub use event::PageEvent;
pub use selector::{AncestryXPath, DomEvaluator, SelectorResolver};
pub use step::TestStep;
