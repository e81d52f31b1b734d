pub mod health;
pub mod rpc;

pub use health::health_check;
pub use rpc::handle_rpc;
