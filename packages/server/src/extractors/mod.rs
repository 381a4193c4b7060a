pub mod json;
pub mod request_id;
