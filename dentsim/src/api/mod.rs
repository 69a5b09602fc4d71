//! Backend access for the UI thread.
//!
//! The UI never awaits the network. It sends an [`types::ApiRequest`] to the
//! worker, which performs the call on its own task and posts the outcome back
//! on the event bus as `AppEvent::ApiResult`.
pub mod types;
pub mod worker;
