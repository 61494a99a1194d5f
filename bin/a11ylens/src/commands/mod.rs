pub mod analyze;
pub mod config_cmd;
pub mod history;
pub mod mobile;
pub mod scan;
pub mod status;
