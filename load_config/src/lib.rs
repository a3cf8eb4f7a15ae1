// SPDX-FileCopyrightText: © 2024 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! Layered TOML configuration shared by the command line tools.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use tracing::debug;

/// Builds the configuration for the tool called `name`.
///
/// Sources, lowest priority first:
/// 1. the embedded `default` document
/// 2. `/etc/<name>/<name>.toml`
/// 3. `config_file`, or `<name>.toml` in the working directory
/// 4. environment variables prefixed with `<NAME>_`
///
/// Missing files are skipped.
pub fn load_config(name: &str, default: &str, config_file: Option<&str>) -> Figment {
    let system_config = format!("/etc/{name}/{name}.toml");
    let leaf_config = match config_file {
        Some(path) => path.to_string(),
        None => format!("{name}.toml"),
    };
    debug!("loading {name} config from {system_config} and {leaf_config}");
    Figment::new()
        .merge(Toml::string(default))
        .merge(Toml::file(system_config))
        .merge(Toml::file(leaf_config))
        .merge(Env::prefixed(&format!("{}_", name.to_uppercase())))
}
