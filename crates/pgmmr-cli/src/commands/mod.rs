pub mod config_ops;
pub mod decode_ops;
pub mod gate_ops;
