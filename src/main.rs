use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;

use ambulance_gate::cli::{Cli, Command, ListenCommand, PortArgs};
use ambulance_gate::logging::init_logging;
use ambulance_gate::{
    bridge, Config, Controller, PwmServo, RecordingServo, ServoDriver, Transport, Trigger,
};

async fn shutdown_signal() {
    // If the handler can't be installed, run until the line closes instead.
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn port<'a>(args: &'a PortArgs, config: &'a Config) -> &'a str {
    args.port.as_deref().unwrap_or(&config.serial.port)
}

async fn listen<D: ServoDriver>(servo: D, port: &str, config: &Config) -> Result<()> {
    let servo_config = &config.servo;
    let mut controller = Controller::with_poses(
        servo,
        servo_config.rest()?,
        servo_config.raised()?,
        servo_config.hold(),
    )?;
    let transport = Transport::open(port, config.serial.baud_rate)?;
    let stats = controller.run(transport, shutdown_signal()).await?;
    info!(sweeps = stats.sweeps, "done");
    Ok(())
}

async fn handle_listen(cmd: &ListenCommand, config: &Config) -> Result<()> {
    let port = port(&cmd.port, config);
    if cmd.dry_run {
        listen(RecordingServo::new(), port, config).await
    } else {
        let servo = PwmServo::open(
            &config.servo.pwm_chip,
            config.servo.pwm_channel,
            config.servo.pulse_range(),
        )
        .context("servo setup failed")?;
        listen(servo, port, config).await
    }
}

async fn connect_trigger(args: &PortArgs, config: &Config) -> Result<Trigger> {
    let port = port(args, config);
    let trigger = Trigger::connect(port, config.serial.baud_rate, config.trigger.settle())
        .await
        .with_context(|| format!("could not connect to {port}"))?;
    Ok(trigger.with_retries(config.trigger.retries, config.trigger.retry_delay()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match &cli.command {
        Command::Listen(cmd) => handle_listen(cmd, &config).await?,
        Command::Trigger(args) => {
            let mut trigger = connect_trigger(args, &config).await?;
            trigger.signal().await?;
        }
        Command::Bridge(args) => {
            let mut trigger = connect_trigger(args, &config).await?;
            let stdin = BufReader::new(tokio::io::stdin());
            bridge(
                stdin,
                &config.trigger.filter(),
                &mut trigger,
                shutdown_signal(),
            )
            .await?;
        }
        Command::Config => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}
