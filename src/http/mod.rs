pub mod parser;
pub mod types;

pub use parser::parse_request;
pub use types::{reason_phrase, HttpHeaders, HttpMethod, HttpRequest, HttpResponse};
