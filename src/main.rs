use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::thread;
use std::time::Duration;
use vision_link::{load_config, ClientConfig, VisionClient};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Sensor WebSocket endpoint, e.g. ws://10.42.0.118:50000 (defaults to VISION_SENSOR_URL)
    #[arg(long)]
    endpoint: Option<String>,

    /// Reply timeout in milliseconds (defaults to VISION_SENSOR_TIMEOUT_MS or 5000)
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print the camera configuration
    Info,
    /// Print the apriltags currently in view
    Tags,
    /// Send a raw command and print the reply text
    Send {
        /// Command line, e.g. "info" or "sc -new_color=1"
        command: String,
    },
    /// Select the active color profile
    SwitchColor { index: usize },
    /// Poll apriltags until interrupted
    Watch {
        #[arg(long, default_value_t = 250)]
        interval_ms: u64,
    },
}

fn build_config(args: &Args) -> Result<ClientConfig> {
    let config = match &args.endpoint {
        Some(endpoint) => ClientConfig::new(endpoint).context("Invalid sensor endpoint")?,
        None => load_config().context("Failed to load sensor configuration")?,
    };

    match args.timeout_ms {
        Some(timeout_ms) => config
            .with_timeout_ms(timeout_ms)
            .context("Invalid timeout"),
        None => Ok(config),
    }
}

fn print_tags(client: &VisionClient) {
    let tags = client.get_apriltags();
    if tags.is_empty() {
        println!("no tags");
    }
    for tag in tags {
        println!(
            "tag {:>3}  distance {:.3}  h {:+.3}  v {:+.3}  pos [{:.3}, {:.3}, {:.3}]",
            tag.tag_id,
            tag.distance,
            tag.horizontal_angle,
            tag.vertical_angle,
            tag.position[0],
            tag.position[1],
            tag.position[2]
        );
    }
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args = Args::parse();
    log::info!("🚀 Starting vision-link with args: {:?}", args);

    let config = build_config(&args)?;
    let client = VisionClient::new(config);

    if !client.connect() {
        log::warn!("⚠️ Initial connect failed; the first request will retry");
    }

    match args.command {
        Action::Info => {
            let info = client.get_camera_info();
            if info.is_empty() {
                anyhow::bail!("No camera info received from sensor");
            }
            println!("{:#?}", info);
            if let Some(sample) = info.active_sample() {
                println!("active color: {:?}", sample);
            }
        }
        Action::Tags => print_tags(&client),
        Action::Send { command } => {
            let reply = client.request(&command);
            if reply.is_empty() {
                anyhow::bail!("No reply to '{}'", command);
            }
            println!("{}", reply);
        }
        Action::SwitchColor { index } => {
            if !client.switch_color(index) {
                anyhow::bail!("Failed to send color switch");
            }
            println!("switched to color {}", index);
        }
        Action::Watch { interval_ms } => loop {
            print_tags(&client);
            thread::sleep(Duration::from_millis(interval_ms));
        },
    }

    client.close();
    Ok(())
}
