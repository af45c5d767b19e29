//! `DvnConf`: the dataverse configuration store and its JSON read/write.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use url::Url;

use crate::confirm::Confirm;
use crate::entry::{ALIAS_KEY, ConfigFile, DEMO_ALIAS, DEMO_DVN, Entry, Registry, TOKEN_KEY};
use crate::error::ConfigError;

/// Indentation used when writing `dvn.json`.
const INDENT: &[u8] = b"    ";

/// Known dataverse servers and the currently selected one.
///
/// Constructed once per command with [`DvnConf::load`]. Mutations stay in
/// memory until [`DvnConf::save`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DvnConf {
    path: PathBuf,
    file: ConfigFile,
}

impl DvnConf {
    /// Loads the configuration file at `path`.
    ///
    /// - A missing file is replaced by the defaults without asking.
    /// - An unreadable, unparsable or empty file is reported with a warning and
    ///   replaced by the defaults only if `confirm` answers affirmatively.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ResetDeclined`] if the operator refuses the reset,
    /// [`ConfigError::Prompt`] if the answer cannot be read, or
    /// [`ConfigError::Io`] if the reset file cannot be written.
    pub fn load(path: impl Into<PathBuf>, confirm: &mut dyn Confirm) -> Result<Self, ConfigError> {
        let mut conf = Self {
            path: path.into(),
            file: default_file(),
        };

        match read_config_file(&conf.path) {
            Ok(Some(file)) => {
                conf.file = file;
                if let Err(err) = conf.validate() {
                    conf.recover(&err, confirm)?;
                }
            }
            Ok(None) => {
                tracing::info!(
                    "No dataverse configuration at {}, writing defaults",
                    conf.path.display()
                );
                conf.reset(None)?;
            }
            Err(err) => conf.recover(&err, confirm)?,
        }

        conf.validate()?;
        tracing::debug!(
            "Loaded {} dataverse(s) from {}",
            conf.file.dvns.len(),
            conf.path.display()
        );
        Ok(conf)
    }

    /// Checks that the registry is usable.
    ///
    /// A current endpoint missing from the registry is only reported; lookups
    /// of the current endpoint fail until it is fixed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyRegistry`] if no entries are configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.file.dvns.is_empty() {
            return Err(ConfigError::EmptyRegistry {
                path: self.path.clone(),
            });
        }
        if !self.file.dvns.contains_key(&self.file.cur_dvn) {
            tracing::warn!(
                "Current dataverse {} is not configured in {}",
                self.file.cur_dvn,
                self.path.display()
            );
        }
        Ok(())
    }

    /// Replaces the configuration by the demo server only, then saves it.
    ///
    /// With `Some(confirm)` the operator must answer `Y` first; the state is
    /// left untouched otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ResetDeclined`] if the reset is refused,
    /// [`ConfigError::Prompt`] if the answer cannot be read, or any error of
    /// [`DvnConf::save`].
    pub fn reset(&mut self, confirm: Option<&mut dyn Confirm>) -> Result<(), ConfigError> {
        if let Some(confirm) = confirm {
            let prompt = format!(
                "The dataverse configuration file {} cannot be read, delete? (Y/N)",
                self.path.display()
            );
            self.ask_reset(&prompt, confirm)?;
        }

        self.file = default_file();
        tracing::info!("Reset dataverse configuration {}", self.path.display());
        self.save()
    }

    /// Writes the configuration to disk, creating parent directories if needed.
    ///
    /// The document is written to a sibling temporary file and renamed into
    /// place.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation, serialization or the file write fails.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut content = Vec::new();
        let mut ser = Serializer::with_formatter(&mut content, PrettyFormatter::with_indent(INDENT));
        self.file.serialize(&mut ser)?;
        content.push(b'\n');

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &content).map_err(|source| ConfigError::Io {
            path: tmp.clone(),
            source,
        })?;
        if let Err(source) = fs::rename(&tmp, &self.path) {
            fs::remove_file(&tmp).ok();
            return Err(ConfigError::Io {
                path: self.path.clone(),
                source,
            });
        }

        tracing::debug!("Saved dataverse configuration {}", self.path.display());
        Ok(())
    }

    /// Writes the default configuration to `path` without reading the old file.
    ///
    /// # Errors
    ///
    /// Returns any error of [`DvnConf::save`].
    pub fn reset_at(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut conf = Self {
            path: path.into(),
            file: default_file(),
        };
        conf.reset(None)?;
        Ok(conf)
    }

    /// Finds an entry by URL or alias, or the current entry for `None`.
    ///
    /// An exact URL match wins over an alias match, even when the alias
    /// belongs to an entry earlier in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EntryNotFound`] if neither a URL nor an alias matches.
    pub fn get_entry(&self, url_or_alias: Option<&str>) -> Result<(&str, &Entry), ConfigError> {
        let wanted = url_or_alias.unwrap_or(self.file.cur_dvn.as_str());
        self.file
            .dvns
            .get_key_value(wanted)
            .or_else(|| {
                self.file
                    .dvns
                    .iter()
                    .find(|(_, entry)| entry.alias.as_deref() == Some(wanted))
            })
            .map(|(url, entry)| (url.as_str(), entry))
            .ok_or_else(|| ConfigError::EntryNotFound(String::from(wanted)))
    }

    /// Selects the entry matching `url_or_alias` as the current one.
    ///
    /// Returns the URL of the selected entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EntryNotFound`] if nothing matches.
    pub fn set_current(&mut self, url_or_alias: &str) -> Result<&str, ConfigError> {
        let url = String::from(self.get_entry(Some(url_or_alias))?.0);
        self.file.cur_dvn = url;
        Ok(self.file.cur_dvn.as_str())
    }

    /// Adds a server or updates its alias and token.
    ///
    /// `None` keeps the previous value. Other fields of an existing entry are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if `url` is not an absolute URL.
    pub fn set_entry(
        &mut self,
        url: &str,
        alias: Option<&str>,
        token: Option<&str>,
    ) -> Result<&Entry, ConfigError> {
        Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
            url: String::from(url),
            source,
        })?;

        if let Some(alias) = alias
            && let Some((other, _)) = self
                .file
                .dvns
                .iter()
                .find(|(other, e)| other.as_str() != url && e.alias.as_deref() == Some(alias))
        {
            tracing::warn!("Alias '{}' is already used by {}", alias, other);
        }

        let entry = self.file.dvns.entry(String::from(url)).or_default();
        if let Some(alias) = alias {
            entry.extra.remove(ALIAS_KEY);
            entry.alias = Some(String::from(alias));
        }
        if let Some(token) = token {
            entry.extra.remove(TOKEN_KEY);
            entry.token = Some(String::from(token));
        }
        Ok(&*entry)
    }

    /// Removes the entry matching `url_or_alias` and returns it.
    ///
    /// If it was the current entry, the first remaining entry becomes current.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EntryNotFound`] if nothing matches, or
    /// [`ConfigError::LastEntry`] if it is the only entry.
    pub fn remove_entry(&mut self, url_or_alias: &str) -> Result<(String, Entry), ConfigError> {
        let url = String::from(self.get_entry(Some(url_or_alias))?.0);
        if self.file.dvns.len() <= 1 {
            return Err(ConfigError::LastEntry(url));
        }

        let removed = self
            .file
            .dvns
            .remove_entry(&url)
            .ok_or_else(|| ConfigError::EntryNotFound(url.clone()))?;

        if self.file.cur_dvn == url
            && let Some(first) = self.file.dvns.keys().next()
        {
            tracing::info!("Current dataverse {} removed, switching to {}", url, first);
            self.file.cur_dvn = first.clone();
        }
        Ok(removed)
    }

    /// Iterates over `(url, entry)` pairs in registry order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.file.dvns.iter().map(|(url, entry)| (url.as_str(), entry))
    }

    /// URL of the current entry.
    #[must_use]
    pub fn current(&self) -> &str {
        &self.file.cur_dvn
    }

    /// Location of the configuration file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reports why the file is unusable and asks to reset it.
    fn recover(
        &mut self,
        cause: &ConfigError,
        confirm: &mut dyn Confirm,
    ) -> Result<(), ConfigError> {
        tracing::warn!("{cause}");
        let prompt = format!(
            "{cause}\nThe dataverse configuration file {} cannot be read, delete? (Y/N)",
            self.path.display()
        );
        self.ask_reset(&prompt, confirm)?;
        self.reset(None)
    }

    /// Fails with [`ConfigError::ResetDeclined`] unless `confirm` accepts `prompt`.
    fn ask_reset(&self, prompt: &str, confirm: &mut dyn Confirm) -> Result<(), ConfigError> {
        if confirm.confirm(prompt).map_err(ConfigError::Prompt)? {
            Ok(())
        } else {
            Err(ConfigError::ResetDeclined {
                path: self.path.clone(),
            })
        }
    }
}

/// Registry holding only the demo server, selected as current.
fn default_file() -> ConfigFile {
    ConfigFile {
        dvns: Registry::from([(String::from(DEMO_DVN), Entry::with_alias(DEMO_ALIAS))]),
        cur_dvn: String::from(DEMO_DVN),
        extra: serde_json::Map::new(),
    }
}

/// Reads and parses `path`. Returns `Ok(None)` if the file does not exist.
fn read_config_file(path: &Path) -> Result<Option<ConfigFile>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
