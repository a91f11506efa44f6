pub mod server_dto;
pub mod server_list_response;
pub mod server_request;
pub mod server_response;
#[allow(clippy::module_inception)]
pub mod servers;
