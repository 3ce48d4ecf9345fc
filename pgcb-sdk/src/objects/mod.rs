pub mod callback;
pub mod event;
pub mod notification;

pub use callback::{CallbackResult, CallbackResultEntry, ErrorBody};
pub use event::{CallbackEventName, CallbackEventPayload, ForwardedEvent};
pub use notification::{
    CallbackRequest, Notification, SUPPORTED_CURRENCIES, TransactionResult, TransactionType,
};
