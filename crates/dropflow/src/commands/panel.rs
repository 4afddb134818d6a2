use dropflow_config::Config;
use dropflow_panel::{Controller, CyclingIndicator, InputPin, OutputPin, PanelOptions};
use tokio_util::sync::CancellationToken;

pub async fn handle(
    config: Config,
    button_pin: u8,
    light_pin: u8,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let (button, light) = open_pins(button_pin, light_pin)?;
    tracing::info!("Front panel on button pin {} and light pin {}", button_pin, light_pin);

    let probe = super::cloud_client(&config)?;
    let options = PanelOptions {
        connectivity_retry: config.timing.connectivity_retry_delay,
        operation_timeout: config.timing.operation_timeout,
        ..PanelOptions::default()
    };
    let controller = Controller::new(super::orchestrator(config)?, CyclingIndicator::new(light));

    dropflow_panel::run(controller, &probe, button, options, cancel).await;
    Ok(())
}

#[cfg(feature = "rpi")]
fn open_pins(button_pin: u8, light_pin: u8) -> anyhow::Result<(impl InputPin + 'static, impl OutputPin)> {
    Ok(dropflow_panel::hardware::rpi::open(button_pin, light_pin)?)
}

#[cfg(not(feature = "rpi"))]
fn open_pins(_button_pin: u8, light_pin: u8) -> anyhow::Result<(impl InputPin + 'static, impl OutputPin)> {
    use colored::Colorize;

    println!("{}", "No GPIO support in this build; press Enter to toggle the server.".yellow());
    Ok((
        dropflow_panel::ConsoleButton::spawn(),
        dropflow_panel::ConsoleOutputPin::new(format!("light:{}", light_pin)),
    ))
}
