//! voice-bridge - Twilio Media Streams to OpenAI Realtime bridge
//!
//! Runs as a single long-lived console process that serves HTTP and
//! WebSocket traffic on one port. The hosting platform routes inbound
//! traffic to that port and owns the restart policy.
//!
//! Usage:
//! - Normal mode: `voice-bridge`
//! - With custom port: `voice-bridge --port 9090`

use voice_bridge::RuntimeConfig;

/// Parse command line arguments
fn parse_args() -> RuntimeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port_override = args[i + 1].parse().ok();
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    config
}

fn print_help() {
    println!("voice-bridge - Twilio Media Streams to OpenAI Realtime bridge");
    println!();
    println!("USAGE:");
    println!("    voice-bridge [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>    Override the listening port (default: PORT env or 8080)");
    println!("    -h, --help       Print help information");
    println!();
    println!("EXAMPLES:");
    println!("    voice-bridge                # Listen on $PORT (default 8080)");
    println!("    voice-bridge --port 9090    # Custom port");
}

fn main() {
    let config = parse_args();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let result = rt.block_on(voice_bridge::init_and_run_bridge_with_config(config));

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
