use gneiss_map::MapConfig;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Config {
    pub map: MapConfig,
}

impl Config {
    pub fn read_file(path: &str) -> Result<Self, ron::Error> {
        let reader = std::fs::File::open(path)?;

        ron::de::from_reader(reader)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;
    use gneiss_map::{ProjectiveLayerType, WeldMethod};

    #[test]
    fn ron_round_trip() {
        let mut config = Config::default();
        config.map.welder.method = WeldMethod::Quantized;
        config.map.tracker.projective_layer_type = ProjectiveLayerType::TsdfWithFreespace;
        config.map.tracker.max_pending_blocks = 17;

        let text = ron::to_string(&config).unwrap();
        let parsed: Config = ron::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn read_file() {
        let path = std::env::temp_dir().join(format!("gneiss-config-{}.ron", std::process::id()));
        std::fs::write(&path, ron::to_string(&Config::default()).unwrap()).unwrap();

        let config = Config::read_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.map.welder.method, WeldMethod::Exact);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::read_file("/nonexistent/gneiss.ron").is_err());
    }
}
