use ipscan::{PrivateScan, PublicScan, ScanArgs, Scanner, ScannerId};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let mode = args
        .next()
        .ok_or("First argument must be `private`, `public` or an IP mask like 192.168.X.X")?;

    let print = |_: ScannerId, args: &ScanArgs| println!("{}", args);

    match mode.as_str() {
        "private" => PrivateScan::new(print).scan()?,
        "public" => PublicScan::new(print).scan()?,
        _ => {
            let mut scanner = Scanner::new();
            scanner.on_address_generated(print);
            let masks: Vec<String> = std::iter::once(mode.clone()).chain(args).collect();
            scanner.scan_all(masks)?;
        }
    }

    Ok(())
}
