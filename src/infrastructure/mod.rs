pub mod backend;
pub mod model;
pub mod rpc;
