/// JSON request and response messages
pub mod protocol;
/// Worker threads and the pool dispatching to them
pub mod worker;
