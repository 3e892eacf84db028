use image::{GenericImage, Rgba};
use qrcode::QrCode;
use ql_raster::{
    build, lookup_label, lookup_model, Bitmap, LabelImage, PrintOptions, Printer, UsbTransport,
};
//
// QL_MODEL=QL-820NWB QL_LABEL=62 QL_SERIAL=000L4G359687 cargo run --features usb --example print_qr -- 3
//

// threshold = 80 works fine for monochrome sources
const THRESHOLD: u8 = 80;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let model_id = std::env::var("QL_MODEL").unwrap_or_else(|_| "QL-820NWB".into());
    let label_id = std::env::var("QL_LABEL").unwrap_or_else(|_| "62".into());
    let serial = std::env::var("QL_SERIAL")?;
    let copies: u32 = std::env::args()
        .nth(1)
        .map(|s| s.parse::<u32>())
        .transpose()?
        .unwrap_or(1);

    let model = lookup_model(&model_id)?;
    let label = lookup_label(&label_id)?;

    let length = if label.is_precut() { label.length() } else { 220 };
    let qrcode = QrCode::new(format!("12345-{}", copies))?;
    let qrcode = qrcode
        .render::<Rgba<u8>>()
        .quiet_zone(false)
        .min_dimensions(100, 200)
        .build();

    let mut buffer = image::DynamicImage::new_luma8(label.width(), length);
    buffer.invert();
    buffer.copy_from(&qrcode, 0, 0)?;
    let luma = buffer.to_luma8();

    let pixels: Vec<bool> = luma.pixels().map(|p| p.0[0] <= THRESHOLD).collect();
    let image = LabelImage::mono(Bitmap::from_pixels(label.width(), &pixels));

    let options = PrintOptions::new(label.id, model.id)
        .cut_at_end(model.cutting && model.expanded_mode)
        .compress(model.compression)
        .copies(copies);
    let job = build(&image, &options, model, label)?;

    let transport = UsbTransport::open(model, &serial)?;
    let mut printer = Printer::new(transport, model);
    printer.check_media(label)?;
    let status = printer.print(&job)?;
    println!("{:?}", status.phase);
    Ok(())
}
