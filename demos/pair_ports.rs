//! Lists serial ports and shows which TTL port a Maestro command port pairs with.
//!
//! Also prints the channel capabilities of the common Maestro models.
//!
//! Run with: cargo run --example pair_ports -- /dev/ttyACM0

use maestro_ioboard::{
    resolve_ttl_port, BoardConfig, DeviceVariant, PinMode, PortEnumerator, PortPair, SystemPorts,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Maestro Port Pairing Example");
    println!("============================\n");

    let config = BoardConfig::default();
    let ports = SystemPorts.list_ports()?;

    println!("1. Serial Ports:");
    println!("----------------");
    if ports.is_empty() {
        println!("  No serial ports found.");
    }
    for port in &ports {
        println!("  [{}] {}", port.order, port.name);
    }
    println!();

    println!("2. Pairing:");
    println!("-----------");
    let command = match std::env::args().nth(1) {
        Some(name) => name,
        None => match ports.first() {
            Some(first) => first.name.clone(),
            None => {
                println!("  Nothing to pair.");
                return Ok(());
            }
        },
    };
    let ttl = resolve_ttl_port(&command, &ports, &config.null_device);
    let pair = PortPair::new(command, ttl, config.null_device.as_str());
    println!("  Command port: {}", pair.command);
    println!("  TTL port:     {}", pair.ttl);
    if !pair.is_paired() {
        println!("  (no companion port found, is the Maestro in USB Dual Port mode?)");
    }
    println!();

    println!("3. Channel Capabilities:");
    println!("------------------------");
    for (name, variant) in [
        ("Micro Maestro 6", DeviceVariant::MICRO_6),
        ("Mini Maestro 12", DeviceVariant::MINI_12),
        ("Mini Maestro 18", DeviceVariant::MINI_18),
        ("Mini Maestro 24", DeviceVariant::MINI_24),
    ] {
        let pwm = variant
            .pwm_channel()
            .map_or_else(|| "none".to_string(), |c| c.to_string());
        let inputs = (0..variant.channels())
            .filter(|&c| variant.supported_modes(c).contains(PinMode::Input))
            .count();
        println!(
            "  {:<16} {:>2} channels, PWM channel: {}, digital-only inputs: {}",
            name,
            variant.channels(),
            pwm,
            inputs
        );
    }

    Ok(())
}
