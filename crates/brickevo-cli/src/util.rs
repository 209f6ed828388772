use std::{
    fs::{self, File},
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use brickevo_engine::GameConfig;
use brickevo_training::params::GaParams;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    /// Creates `path`, and its parent directories if needed.
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.finish()
    }

    /// Writes one compact JSON document per line.
    pub fn write_json_lines<'a, T, I>(&mut self, values: I) -> anyhow::Result<()>
    where
        T: serde::Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        for value in values {
            serde_json::to_writer(&mut *self, value)
                .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
            writeln!(&mut *self)
                .with_context(|| format!("Failed to write to {}", self.display_path()))?;
        }
        self.finish()
    }

    pub fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.write_all(text.as_bytes())
            .with_context(|| format!("Failed to write to {}", self.display_path()))?;
        self.finish()
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Reads a game config file, or returns the default config when `path` is `None`.
pub fn load_game_config(path: Option<&Path>) -> anyhow::Result<GameConfig> {
    path.map_or_else(|| Ok(GameConfig::default()), |p| read_json_file("game config", p))
}

/// Reads a GA parameter file, or returns the default parameters when `path` is `None`.
pub fn load_ga_params(path: Option<&Path>) -> anyhow::Result<GaParams> {
    path.map_or_else(|| Ok(GaParams::default()), |p| read_json_file("GA params", p))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_output_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/value.json");
        Output::save_json(&serde_json::json!({ "a": 1 }), Some(path.clone())).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        let value: serde_json::Value = read_json_file("test", &path).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        fs::write(&path, r#"{ "lives": 5, "power_ups": { "max_drops": 2 } }"#).unwrap();
        let config = load_game_config(Some(&path)).unwrap();
        assert_eq!(config.lives, 5);
        assert_eq!(config.power_ups.max_drops, 2);
        assert_eq!(config.width, 480.0);
        assert_eq!(load_game_config(None).unwrap(), GameConfig::default());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_ga_params(Some(Path::new("/nonexistent/params.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/params.json"));
    }
}
