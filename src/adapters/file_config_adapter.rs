//! INI file configuration adapter.

use crate::domain::error::DashboardError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DashboardError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| DashboardError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
trades_csv = data/historical_data.csv
sentiment_csv = data/fear_greed_index.csv

[web]
listen = 0.0.0.0:8501
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "trades_csv"),
            Some("data/historical_data.csv".to_string())
        );
        assert_eq!(
            adapter.get_string("web", "listen"),
            Some("0.0.0.0:8501".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[data]\ntrades_csv = t.csv\n").unwrap();
        assert_eq!(adapter.get_string("data", "sentiment_csv"), None);
        assert_eq!(adapter.get_string("cache", "ttl_secs"), None);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Analysis]\nRolling_Window = 14\n").unwrap();
        assert_eq!(
            adapter.get_string("analysis", "rolling_window"),
            Some("14".to_string())
        );
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[logging]\nfilter = sentidash=debug\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("logging", "filter"),
            Some("sentidash=debug".to_string())
        );
    }

    #[test]
    fn from_file_returns_config_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        match result {
            Err(DashboardError::ConfigParse { file, .. }) => {
                assert!(file.contains("config.ini"));
            }
            _ => panic!("expected ConfigParse"),
        }
    }
}
