mod app;
mod cli;
mod host;
mod logging;
mod renderer;

use backdrop_config::{ConfigResolver, OptionsPatch};
use backdrop_engine::Registry;
use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::info;

use crate::app::{App, terminal_pixels};
use crate::cli::Cli;
use crate::host::TerminalHost;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    if let Some(path) = cli.log_file.clone().or_else(logging::default_log_path) {
        logging::init(&path, cli.log_level)?;
    }

    let mut registry = Registry::new();
    backdrop_effects::register_builtin(&mut registry);

    let file = backdrop_config::load_or_default(cli.config.as_deref())?;
    let patch = OptionsPatch::bound_to("body").overlay(file).overlay(cli.patch()?);

    if cli.print_config {
        let defaults = registry.effect(&cli.effect)?.default_options();
        let options = ConfigResolver::resolve(&defaults, &patch);
        print!("{}", toml::to_string_pretty(&options)?);
        return Ok(());
    }

    let terminal = ratatui::init();
    let result = run(terminal, &cli, &registry, &patch);
    ratatui::restore();
    result
}

fn run(
    terminal: DefaultTerminal,
    cli: &Cli,
    registry: &Registry,
    patch: &OptionsPatch,
) -> color_eyre::Result<()> {
    let size = terminal.size()?;
    let host = TerminalHost::new(size.width, size.height, terminal_pixels());
    if let Some(title) = &cli.title {
        host.add_text(title.clone());
    }
    info!(effect = %cli.effect, columns = size.width, rows = size.height, "starting");
    App::new(registry, &cli.effect, patch, host)?.run(terminal)
}
