pub mod reco;

pub use reco::{parse_config, read_config_file, Config};
