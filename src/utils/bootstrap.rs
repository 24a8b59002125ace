use crate::config::Config;

pub fn show_start_message(config: &Config)
{
        if !config.show_start_message
        {
                return;
        }

        let banner = r#"

      ░██████  ░██████████ ░█████████  ░██████░███████   ░██████████
     ░██   ░██     ░██     ░██     ░██   ░██  ░██   ░██  ░██
    ░██            ░██     ░██     ░██   ░██  ░██    ░██ ░██
     ░████████     ░██     ░█████████    ░██  ░██    ░██ ░█████████
            ░██    ░██     ░██   ░██     ░██  ░██    ░██ ░██
     ░██   ░██     ░██     ░██    ░██    ░██  ░██   ░██  ░██
      ░██████      ░██     ░██     ░██ ░██████░███████   ░██████████

 Vertex layouts and attribute bindings on top of wgpu.

            "#;

        log::info!("{banner}")
}

pub fn config_logging()
{
        env_logger::init();

        log::info!("Running on native.");
}

pub fn create_config() -> Config
{
        Config::from_file().unwrap_or_else(|err| {
                log::warn!("Failed to load config: {err:#}, falling back to default");
                Config::default()
        })
}
