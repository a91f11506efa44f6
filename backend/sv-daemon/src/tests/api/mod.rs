mod error;
mod server_request;
