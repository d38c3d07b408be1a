/**
 * The settings module contains the codec configuration structs and the code to process the
 * fj4tide.yml file format used by the demo server
 */
use crate::json::{DecodeSettings, EncodeSettings};
use log::*;
use std::path::Path;
use std::sync::Arc;

/**
 * Options understood by the serde_json codec when encoding
 *
 * They should be snake-cased in the yaml configuration
 */
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EncodeOption {
    SortMapKeys,
    EscapeHtml,
    TrailingNewline,
}

/**
 * Options understood by the serde_json codec when decoding
 */
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DecodeOption {
    /// Reject a body with anything but whitespace after its first value
    DisallowTrailingData,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SerdeJsonConfig {
    pub encode_options: Vec<EncodeOption>,
    pub decode_options: Vec<DecodeOption>,
}

#[cfg(any(test, not(simd_codec)))]
impl SerdeJsonConfig {
    pub(crate) fn encode_settings(&self) -> EncodeSettings {
        let mut settings = EncodeSettings::default();
        for option in self.encode_options.iter() {
            match option {
                EncodeOption::SortMapKeys => settings.sort_map_keys = true,
                EncodeOption::EscapeHtml => settings.escape_html = true,
                EncodeOption::TrailingNewline => settings.trailing_newline = true,
            }
        }
        settings
    }

    pub(crate) fn decode_settings(&self) -> DecodeSettings {
        DecodeSettings {
            disallow_trailing_data: self
                .decode_options
                .contains(&DecodeOption::DisallowTrailingData),
        }
    }
}

/**
 * Builder for the simd-json codec's profile. It only takes effect once frozen, after which the
 * profile never changes.
 */
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimdJsonConfig {
    pub sort_map_keys: bool,
    pub escape_html: bool,
    pub trailing_newline: bool,
    pub disallow_trailing_data: bool,
}

impl SimdJsonConfig {
    pub fn sort_map_keys(mut self, enabled: bool) -> Self {
        self.sort_map_keys = enabled;
        self
    }

    pub fn escape_html(mut self, enabled: bool) -> Self {
        self.escape_html = enabled;
        self
    }

    pub fn trailing_newline(mut self, enabled: bool) -> Self {
        self.trailing_newline = enabled;
        self
    }

    pub fn disallow_trailing_data(mut self, enabled: bool) -> Self {
        self.disallow_trailing_data = enabled;
        self
    }

    /**
     * Build the immutable profile a codec holds on to
     */
    pub fn freeze(&self) -> Profile {
        Profile {
            settings: Arc::new(Frozen {
                encode: EncodeSettings {
                    sort_map_keys: self.sort_map_keys,
                    escape_html: self.escape_html,
                    trailing_newline: self.trailing_newline,
                },
                decode: DecodeSettings {
                    disallow_trailing_data: self.disallow_trailing_data,
                },
            }),
        }
    }
}

/**
 * A frozen SimdJsonConfig, cheap to clone and share between request handlers
 */
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    settings: Arc<Frozen>,
}

#[derive(Debug, PartialEq)]
#[cfg_attr(not(any(test, simd_codec)), allow(dead_code))]
struct Frozen {
    encode: EncodeSettings,
    decode: DecodeSettings,
}

#[cfg(any(test, simd_codec))]
impl Profile {
    pub(crate) fn encode_settings(&self) -> &EncodeSettings {
        &self.settings.encode
    }

    pub(crate) fn decode_settings(&self) -> &DecodeSettings {
        &self.settings.decode
    }
}

impl Default for Profile {
    fn default() -> Profile {
        SimdJsonConfig::default().freeze()
    }
}

/**
 * Config carries the settings for both JSON libraries; only the one compiled in is consulted
 */
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub serde_json: SerdeJsonConfig,
    pub simd_json: SimdJsonConfig,
}

#[derive(Debug, Deserialize)]
pub struct Listen {
    pub address: String,
    pub port: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub listen: Listen,
    /**
     * The indent used when a client asks for pretty printed output
     */
    #[serde(default = "indent_default")]
    pub indent: String,
    #[serde(default)]
    pub codec: Config,
}

impl Settings {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.listen.address, self.listen.port)
    }
}

pub fn load(file: &str) -> Result<Settings, config::ConfigError> {
    let conf = load_configuration(file)?;
    conf.try_into()
}

fn load_configuration(file: &str) -> Result<config::Config, config::ConfigError> {
    let file_path = Path::new(file);

    if file_path.extension().and_then(|ext| ext.to_str()) != Some("yml") {
        return Err(config::ConfigError::Message(format!(
            "The configuration file must end with .yml: {}",
            file
        )));
    }

    debug!("Loading configuration from {}", file);

    /*
     * Load our settings in the priority order of:
     *
     *   - yaml file
     *   - environment variables
     *
     * Each layer overriding properties from the last
     */
    let mut conf = config::Config::default();
    conf.merge(config::File::with_name(file))?
        .merge(config::Environment::with_prefix("FJ4TIDE"))?;

    Ok(conf)
}

/*
 * Default functions
 */

/**
 * Return the indent used for pretty printing when none is configured
 */
fn indent_default() -> String {
    "  ".to_string()
}
