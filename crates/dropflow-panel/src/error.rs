use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error(
        "GPIO unavailable: {0}\n\nHint:\n  • Run on a Raspberry Pi with access to /dev/gpiomem\n  • Build without the `rpi` feature to use the console panel"
    )]
    Gpio(String),
}

pub type Result<T> = std::result::Result<T, PanelError>;
