use ql_raster::{lookup_model, Printer, Setting, UsbTransport};
//
// QL_MODEL=QL-800 QL_SERIAL=000G2G844181 cargo run --features usb --example read_status
//

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let model = lookup_model(&std::env::var("QL_MODEL").unwrap_or_else(|_| "QL-800".into()))?;
    let serial = std::env::var("QL_SERIAL")?;

    let transport = UsbTransport::open(model, &serial)?;
    let mut printer = Printer::new(transport, model);

    let status = printer.status()?;
    println!("{:#?}", status);
    match status.label() {
        Some(label) => println!("Installed media: {}", label.id),
        None => println!("Installed media is not in the label table"),
    }

    println!("Auto power off: {}", printer.read_setting(Setting::AutoPowerOff)?);
    println!("Auto power on: {}", printer.read_setting(Setting::AutoPowerOn)?);
    Ok(())
}
