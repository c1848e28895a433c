use release_images::cli::{Args, Runner};
use std::process;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    let runner = match Runner::new(args) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            Args::print_examples();
            process::exit(2);
        }
    };

    if let Err(e) = runner.run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
