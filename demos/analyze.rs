use ql_raster::{read_instructions, read_pages, Instruction};
//
// cargo run --example analyze label.bin
//

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        println!("usage: analyze <captured-job-file>");
        return;
    }

    let data = match std::fs::read(&args[1]) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("Failed to read {}: {}", args[1], err);
            std::process::exit(1);
        }
    };

    let instructions = match read_instructions(&data) {
        Ok(instructions) => instructions,
        Err(err) => {
            eprintln!("Error {}", err);
            std::process::exit(1);
        }
    };
    for instruction in &instructions {
        match instruction {
            Instruction::Raster(data) | Instruction::PTouchRaster(data) => {
                println!("raster ({} bytes)", data.len())
            }
            Instruction::TwoColorRaster { plane, data } => {
                println!("raster {:?} ({} bytes)", plane, data.len())
            }
            Instruction::Invalidate(n) => println!("invalidate ({} bytes)", n),
            other => println!("{:?}", other),
        }
    }

    match read_pages(&data) {
        Ok(pages) => {
            for (n, page) in pages.iter().enumerate() {
                println!(
                    "page {}: {} lines, two-color {}, compressed {}, {:?}",
                    n + 1,
                    page.black.len(),
                    !page.red.is_empty(),
                    page.compressed,
                    page.print
                );
            }
        }
        Err(err) => eprintln!("Error {}", err),
    }
}
