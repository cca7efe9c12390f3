//! `pantry config` - inspect settings

use anyhow::Result;
use declarative::EXIT_OK;

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::Settings;

pub fn run(ctx: &Context, cmd: &ConfigCommand) -> Result<i32> {
    match cmd {
        ConfigCommand::Show => {
            let settings = Settings::load(ctx.config.as_deref())?;
            print!("{}", settings.to_toml()?);
        }
        ConfigCommand::Path => {
            println!("{}", Settings::path(ctx.config.as_deref())?.display());
        }
    }
    Ok(EXIT_OK)
}
